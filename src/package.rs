// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Package descriptor and runner: the outer loop that loads a package,
//! enumerates its pairings, dispatches a worker pool, and rewrites the
//! descriptor with each pairing's result.

use crate::btree::TreeHandle;
use crate::distance::DistanceFunction;
use crate::error::{EngineError, EngineResult, Side};
use crate::metrics::RunMetrics;
use crate::pairing::PairingWorker;
use crate::partition::{CsvPartition, Partition, PartitionPairing};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// One named, on-disk partition referenced by a pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub id: u32,
    pub path: PathBuf,
}

/// One pairing as persisted in the descriptor: which two partitions, the
/// sizing hint for its tree, and (once processed) its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingEntry {
    pub left_partition_id: u32,
    pub right_partition_id: u32,
    pub self_pairing: bool,
    pub estimated_unique_ids: u64,
    pub result: Option<TreeHandle>,
}

/// On-disk record listing all pairings in a package, persisted as JSON at
/// the path given on the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub partitions: Vec<PartitionEntry>,
    pub pairings: Vec<PairingEntry>,
}

impl PackageDescriptor {
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| EngineError::IoFailure {
            operation: format!("read package descriptor {}", path.display()),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::CorruptPackage {
            reason: format!("{}: {e}", path.display()),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| EngineError::CorruptPackage {
            reason: format!("failed to serialize package descriptor: {e}"),
        })?;
        std::fs::write(path, bytes).map_err(|e| EngineError::IoFailure {
            operation: format!("write package descriptor {}", path.display()),
            reason: e.to_string(),
        })
    }

    /// Check every pairing references a partition that is actually listed
    /// and whose file exists.
    pub fn verify(&self) -> EngineResult<()> {
        for pairing in &self.pairings {
            self.partition_path(pairing.left_partition_id)?;
            self.partition_path(pairing.right_partition_id)?;
        }
        Ok(())
    }

    fn partition_path(&self, id: u32) -> EngineResult<&Path> {
        self.partitions
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.path.as_path())
            .ok_or_else(|| EngineError::CorruptPackage {
                reason: format!("pairing references unknown partition id {id}"),
            })
    }

    /// Indices of pairings that still need a result.
    pub fn pending_pairing_indices(&self) -> Vec<usize> {
        self.pairings
            .iter()
            .enumerate()
            .filter(|(_, p)| p.result.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Load the left/right partitions for pairing `index` and build the
    /// in-memory `PartitionPairing` the worker scans.
    pub fn build_pairing(&self, index: usize) -> EngineResult<PartitionPairing> {
        let entry = self.pairings.get(index).ok_or_else(|| EngineError::CorruptPackage {
            reason: format!("pairing index {index} out of range"),
        })?;
        let left_path = self.partition_path(entry.left_partition_id)?.to_path_buf();
        let right_path = self.partition_path(entry.right_partition_id)?.to_path_buf();
        let left = CsvPartition::load(entry.left_partition_id, &left_path)?;
        let right = CsvPartition::load(entry.right_partition_id, &right_path)?;
        Ok(PartitionPairing::new(
            Box::new(left),
            Box::new(right),
            entry.self_pairing,
            entry.estimated_unique_ids,
        ))
    }

    /// Pin a completed tree into pairing `index`.
    pub fn set_result_for(&mut self, index: usize, handle: TreeHandle) -> EngineResult<()> {
        let entry = self
            .pairings
            .get_mut(index)
            .ok_or_else(|| EngineError::CorruptPackage {
                reason: format!("pairing index {index} out of range"),
            })?;
        entry.result = Some(handle);
        Ok(())
    }
}

/// Loads a package, dispatches its unprocessed pairings across a fixed
/// worker pool, and rewrites the descriptor as results come in.
pub struct PackageRunner;

impl PackageRunner {
    /// ## Input
    /// - `descriptor_path`: where the package descriptor lives; also where
    ///   the updated descriptor is written back on success
    /// - `k`: neighbor-list capacity shared by every pairing in the package
    /// - `distance_fn`: the distance function every pairing scores with
    /// - `multithreading`: pool size `available_parallelism()` if true, `1`
    ///   otherwise
    ///
    /// ## Output
    /// `Ok(RunMetrics)` with counts for the completed run.
    ///
    /// ## Error Conditions
    /// `EmptyPartition` if any pending pairing has an empty side (checked
    /// before any work starts). If one or more dispatched pairings fail,
    /// the descriptor is still saved with every successful pairing's
    /// result before the first failure is returned.
    pub fn run(
        descriptor_path: &Path,
        k: usize,
        distance_fn: &dyn DistanceFunction,
        multithreading: bool,
    ) -> EngineResult<RunMetrics> {
        let mut descriptor = PackageDescriptor::load(descriptor_path)?;
        descriptor.verify()?;

        let pending = descriptor.pending_pairing_indices();
        info!(
            "package has {} pairings, {} pending",
            descriptor.pairings.len(),
            pending.len()
        );

        for &index in &pending {
            let pairing = descriptor.build_pairing(index)?;
            if pairing.left.size() == 0 {
                return Err(EngineError::EmptyPartition {
                    pairing_index: index,
                    side: Side::Left,
                });
            }
            if pairing.right.size() == 0 {
                return Err(EngineError::EmptyPartition {
                    pairing_index: index,
                    side: Side::Right,
                });
            }
        }

        let pool_size = if multithreading {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            1
        };

        let metrics = RunMetrics::new();
        let finished = Arc::new(AtomicBool::new(false));
        Self::arm_watchdog(Arc::clone(&finished));

        let next = Mutex::new(0usize);
        let outcomes: Mutex<Vec<(usize, EngineResult<TreeHandle>)>> = Mutex::new(Vec::new());

        thread::scope(|scope| {
            for _ in 0..pool_size {
                scope.spawn(|| {
                    loop {
                        let index = {
                            let mut next = next.lock().unwrap();
                            if *next >= pending.len() {
                                break;
                            }
                            let index = pending[*next];
                            *next += 1;
                            index
                        };

                        let outcome = Self::run_one(&descriptor, index, k, distance_fn, &metrics);
                        outcomes.lock().unwrap().push((index, outcome));
                    }
                });
            }
        });
        finished.store(true, Ordering::SeqCst);

        let mut outcomes = outcomes.into_inner().unwrap();
        outcomes.sort_by_key(|(index, _)| *index);

        // Apply every successful result before surfacing a failure: a
        // pairing whose worker succeeded keeps its persisted tree
        // reference even if a sibling pairing in the same run failed.
        let mut first_failure = None;
        for (index, outcome) in outcomes {
            match outcome {
                Ok(handle) => descriptor.set_result_for(index, handle)?,
                Err(err) => {
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }

        descriptor.save(descriptor_path)?;
        if let Some(err) = first_failure {
            return Err(err);
        }
        Ok(metrics)
    }

    fn run_one(
        descriptor: &PackageDescriptor,
        index: usize,
        k: usize,
        distance_fn: &dyn DistanceFunction,
        metrics: &RunMetrics,
    ) -> EngineResult<TreeHandle> {
        let pairing = descriptor.build_pairing(index)?;

        let descriptor_dir = descriptor
            .partitions
            .first()
            .and_then(|p| p.path.parent())
            .unwrap_or_else(|| Path::new("."));
        let directory_path = descriptor_dir.join(format!("pairing{index}.dir"));
        let data_path = descriptor_dir.join(format!("pairing{index}.dat"));

        let handle =
            PairingWorker::run(index, &pairing, k, distance_fn, &directory_path, &data_path)?;
        metrics.add_items(pairing.estimated_unique_ids);
        metrics.mark_pairing_completed();
        Ok(handle)
    }

    fn arm_watchdog(finished: Arc<AtomicBool>) {
        thread::spawn(move || {
            thread::sleep(WATCHDOG_TIMEOUT);
            if !finished.load(Ordering::SeqCst) {
                warn!("watchdog: forcing exit after stalled shutdown");
                std::process::exit(0);
            }
        });
    }
}
