// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! reachpack - per-package k-nearest-neighbor distance list engine.
//!
//! Computes bounded top-k neighbor lists for points drawn from paired
//! partitions and persists them into a disk-backed dynamic B+ tree index,
//! one tree per pairing, grouped into a package with a JSON descriptor that
//! makes a run resumable.
//!
//! ## Architecture
//!
//! - **distlist**: the bounded top-k accumulator (`DistanceList`)
//! - **codec**: fixed/variable-size wire encodings for keys and payloads
//! - **storage**: `PagedStorage`, the byte-addressable file abstraction
//! - **btree**: `DynamicBPlusTree`, the two-file disk index
//! - **partition**: point sources paired up for a pairing's computation
//! - **distance**: pluggable distance functions
//! - **pairing**: the per-pairing worker (`persistDistance`)
//! - **package**: package descriptor, idempotent resumption, worker pool
//! - **error**: the crate's error type

pub mod btree;
pub mod codec;
pub mod distance;
pub mod distlist;
pub mod error;
pub mod metrics;
pub mod package;
pub mod pairing;
pub mod partition;
pub mod storage;

#[cfg(test)]
mod distance_test;
#[cfg(test)]
mod distlist_test;
#[cfg(test)]
mod package_test;

pub use btree::{DynamicBPlusTree, TreeHandle};
pub use codec::{DistanceListCodec, IntCodec, VARIABLE_SIZE};
pub use distance::{by_name, Cosine, DistanceFunction, Euclidean, Manhattan};
pub use distlist::{DistanceList, Neighbor};
pub use error::{EngineError, EngineResult, Side};
pub use metrics::RunMetrics;
pub use package::{PackageDescriptor, PackageRunner, PairingEntry, PartitionEntry};
pub use pairing::PairingWorker;
pub use partition::{CsvPartition, Partition, PartitionPairing, Point, PointId, VecPartition};
pub use storage::{PagedStorage, DEFAULT_CACHE_BOUND};
