// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Points and partitions: the sets of vectors a pairing scores against
//! each other.
//!
//! The specification leaves the concrete partition source unstated beyond
//! "iterable set of Points with known size and stable iteration order".
//! `VecPartition` covers the in-memory case (tests, small packages);
//! `CsvPartition` reads `id,comp0,comp1,...` rows from a file, the natural
//! on-disk form for this kind of dataset.

use crate::error::{EngineError, EngineResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A point id: a 32-bit non-negative integer, globally unique within a
/// dataset.
pub type PointId = u32;

/// A point: an id plus its fixed-dimensionality vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: PointId,
    pub vector: Vec<f64>,
}

impl Point {
    pub fn new(id: PointId, vector: Vec<f64>) -> Self {
        Point { id, vector }
    }
}

/// An iterable, sized, id-addressed set of points.
pub trait Partition {
    fn id(&self) -> u32;
    fn size(&self) -> usize;
    fn iter(&self) -> Box<dyn Iterator<Item = &Point> + '_>;
}

/// An in-memory partition, backed by a `Vec<Point>`.
#[derive(Debug, Clone)]
pub struct VecPartition {
    id: u32,
    points: Vec<Point>,
}

impl VecPartition {
    pub fn new(id: u32, points: Vec<Point>) -> Self {
        VecPartition { id, points }
    }
}

impl Partition for VecPartition {
    fn id(&self) -> u32 {
        self.id
    }

    fn size(&self) -> usize {
        self.points.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Point> + '_> {
        Box::new(self.points.iter())
    }
}

/// A partition read from a CSV file: one `id,comp0,comp1,...` row per
/// point. Loaded eagerly into memory on construction — partitions are
/// expected to be pairing-sized, not dataset-sized.
#[derive(Debug, Clone)]
pub struct CsvPartition {
    id: u32,
    points: Vec<Point>,
}

impl CsvPartition {
    pub fn load<P: AsRef<Path>>(id: u32, path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EngineError::IoFailure {
            operation: format!("open partition {}", path.display()),
            reason: e.to_string(),
        })?;
        let reader = BufReader::new(file);
        let mut points = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| EngineError::IoFailure {
                operation: format!("read partition {}", path.display()),
                reason: e.to_string(),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            let id_field = fields.next().ok_or_else(|| EngineError::CorruptPackage {
                reason: format!("{}:{}: empty row", path.display(), line_no + 1),
            })?;
            let point_id: PointId = id_field.trim().parse().map_err(|_| EngineError::CorruptPackage {
                reason: format!(
                    "{}:{}: invalid point id {id_field:?}",
                    path.display(),
                    line_no + 1
                ),
            })?;
            let vector = fields
                .map(|f| {
                    f.trim().parse::<f64>().map_err(|_| EngineError::CorruptPackage {
                        reason: format!(
                            "{}:{}: invalid vector component {f:?}",
                            path.display(),
                            line_no + 1
                        ),
                    })
                })
                .collect::<EngineResult<Vec<f64>>>()?;
            points.push(Point::new(point_id, vector));
        }

        Ok(CsvPartition { id, points })
    }
}

impl Partition for CsvPartition {
    fn id(&self) -> u32 {
        self.id
    }

    fn size(&self) -> usize {
        self.points.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Point> + '_> {
        Box::new(self.points.iter())
    }
}

/// A pairing of two partitions whose cross product of points is scored.
pub struct PartitionPairing {
    pub left: Box<dyn Partition + Send>,
    pub right: Box<dyn Partition + Send>,
    pub self_pairing: bool,
    pub estimated_unique_ids: u64,
}

impl PartitionPairing {
    pub fn new(
        left: Box<dyn Partition + Send>,
        right: Box<dyn Partition + Send>,
        self_pairing: bool,
        estimated_unique_ids: u64,
    ) -> Self {
        PartitionPairing {
            left,
            right,
            self_pairing,
            estimated_unique_ids,
        }
    }
}

