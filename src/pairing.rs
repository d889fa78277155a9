// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Per-pairing compute loop: nested scan over two partitions, bounded
//! top-k accumulation, persisted into a fresh `DynamicBPlusTree`.

use crate::btree::{DynamicBPlusTree, TreeHandle};
use crate::distance::DistanceFunction;
use crate::distlist::DistanceList;
use crate::error::EngineResult;
use crate::partition::{Partition, PartitionPairing};
use log::info;
use std::collections::HashSet;
use std::path::Path;

/// Emit a progress line every `PROGRESS_INTERVAL` left-side ids scanned.
const PROGRESS_INTERVAL: usize = 50;

/// Runs the nested scan for one `PartitionPairing` and returns the closed
/// tree's handle.
///
/// ## Input
/// - `pairing`: the two partitions to score, whether it is a self-pairing,
///   and an upper bound on distinct left-side ids (used to size the tree)
/// - `k`: neighbor-list capacity per point
/// - `distance_fn`: the function scoring a `(p, q)` vector pair
/// - `directory_path`/`data_path`: the pairing's two private backing files
///
/// ## Output
/// A `TreeHandle` pinning the closed, persisted tree.
///
/// ## Error Conditions
/// Any I/O failure against the pairing's backing files propagates; a
/// missing key on `tree.get` during `persist_distance` indicates an
/// internal invariant violation (`KeyMissing`), not caller error.
pub struct PairingWorker;

impl PairingWorker {
    pub fn run(
        pairing_index: usize,
        pairing: &PartitionPairing,
        k: usize,
        distance_fn: &dyn DistanceFunction,
        directory_path: &Path,
        data_path: &Path,
    ) -> EngineResult<TreeHandle> {
        let mut tree = DynamicBPlusTree::create(
            directory_path,
            data_path,
            pairing.estimated_unique_ids,
            k,
        )?;
        let mut seen: HashSet<u32> = HashSet::new();

        if pairing.self_pairing {
            Self::scan_pass(
                pairing_index,
                &mut tree,
                &mut seen,
                pairing.left.as_ref(),
                pairing.left.as_ref(),
                k,
                distance_fn,
            )?;
        } else {
            Self::scan_pass(
                pairing_index,
                &mut tree,
                &mut seen,
                pairing.left.as_ref(),
                pairing.right.as_ref(),
                k,
                distance_fn,
            )?;
            // Non-self pairings need both directions: asymmetric top-k
            // means points on the right side also need neighbors drawn
            // from the left.
            seen.clear();
            Self::scan_pass(
                pairing_index,
                &mut tree,
                &mut seen,
                pairing.right.as_ref(),
                pairing.left.as_ref(),
                k,
                distance_fn,
            )?;
        }

        tree.close()
    }

    fn scan_pass(
        pairing_index: usize,
        tree: &mut DynamicBPlusTree,
        seen: &mut HashSet<u32>,
        left: &dyn Partition,
        right: &dyn Partition,
        k: usize,
        distance_fn: &dyn DistanceFunction,
    ) -> EngineResult<()> {
        let left_count = left.size();
        for (left_index, p) in left.iter().enumerate() {
            if left_index > 0 && left_index % PROGRESS_INTERVAL == 0 {
                info!("pairing {pairing_index}: {left_index}/{left_count} left-side ids scanned");
            }
            for q in right.iter() {
                let d = distance_fn.distance(&p.vector, &q.vector);
                Self::persist_distance(tree, seen, p.id, q.id, d, k)?;
            }
        }
        Ok(())
    }

    /// Load-or-create the owner's `DistanceList`, insert the candidate,
    /// write it straight back. The workload writes back after every
    /// single insertion rather than buffering per-id; this is kept
    /// intentionally (see the tie-breaking notes on `DistanceList`) so
    /// observable tree state matches what a resumed run would see.
    fn persist_distance(
        tree: &mut DynamicBPlusTree,
        seen: &mut HashSet<u32>,
        owner_id: u32,
        neighbor_id: u32,
        distance: f64,
        k: usize,
    ) -> EngineResult<()> {
        let mut dl = if seen.contains(&owner_id) {
            tree.get(owner_id)?
        } else {
            seen.insert(owner_id);
            DistanceList::new(owner_id, k)
        };
        dl.add_distance(neighbor_id, distance);
        tree.put(owner_id, &dl)
    }
}
