// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Core types for the dynamic B+ tree index backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Magic bytes for the directory file header, used to catch a data/directory
/// file mismatch or truncated header on open.
pub const BTREE_MAGIC: u32 = 0xB7EE_7EE1;

/// Descriptor record pinning a closed tree into a package: the two backing
/// file paths, the directory file's root offset, and how many distinct keys
/// it holds. Persisted verbatim inside `PackageDescriptor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeHandle {
    pub directory_path: PathBuf,
    pub data_path: PathBuf,
    pub root_offset: u64,
    pub entry_count: u64,
}

/// Byte length of the directory file's fixed header.
pub const HEADER_SIZE: u64 = 28;

/// Point identifier used as the tree's key type throughout the engine.
pub type PointKey = u32;

/// Choose `maxKeysPerBucket` from an estimate of how many distinct keys a
/// tree instance will hold: `max(5, floor(n^(1/20)))`.
///
/// This keeps small trees (a handful of points) from splitting on every
/// insert, while letting large trees grow bucket size slowly as `n` grows,
/// rather than tuning the bucket size by hand per package.
pub fn max_keys_per_bucket(estimated_unique_ids: u64) -> usize {
    if estimated_unique_ids <= 1 {
        return 5;
    }
    let root = (estimated_unique_ids as f64).powf(1.0 / 20.0).floor() as u64;
    root.max(5) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_estimates_floor_at_five() {
        assert_eq!(max_keys_per_bucket(0), 5);
        assert_eq!(max_keys_per_bucket(1), 5);
        assert_eq!(max_keys_per_bucket(100), 5);
    }

    #[test]
    fn large_estimates_grow_slowly() {
        // 20th root of a googol-scale count still only reaches double digits.
        assert!(max_keys_per_bucket(10u64.pow(18)) >= 5);
    }
}
