// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Disk-backed dynamic B+ tree: a `PointKey -> DistanceList` map split
//! across a directory file (interior/leaf nodes) and a data file
//! (append-only payloads), scoped to the lifetime of one pairing.

pub mod node;
pub mod tree;
pub mod types;

#[cfg(test)]
mod tree_test;

pub use tree::DynamicBPlusTree;
pub use types::{max_keys_per_bucket, PointKey, TreeHandle};
