// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Directory-file node representations.
//!
//! Every node is serialized independently via `bincode` and appended to the
//! directory file as `[len:4B][crc32:4B][bytes]`; nothing is ever
//! overwritten in place. A leaf entry's value is a `(data_offset,
//! data_len)` pointer into the sibling data file, not the payload itself.

use crate::btree::types::PointKey;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// A pointer to a variable-length payload in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePtr {
    pub offset: u64,
    pub len: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalNode {
    /// `keys.len() == children.len() - 1`. `children[i]` holds every key
    /// less than `keys[i]`; `children[last]` holds everything else.
    pub keys: Vec<PointKey>,
    pub children: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafNode {
    pub keys: Vec<PointKey>,
    pub values: Vec<ValuePtr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Internal(InternalNode),
    Leaf(LeafNode),
}

impl Node {
    pub fn encode(&self) -> EngineResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| EngineError::CorruptTree {
            reason: format!("failed to encode node: {e}"),
        })
    }

    pub fn decode(bytes: &[u8]) -> EngineResult<Self> {
        bincode::deserialize(bytes).map_err(|e| EngineError::CorruptTree {
            reason: format!("failed to decode node: {e}"),
        })
    }
}

impl InternalNode {
    /// Index of the child to descend into for `key`.
    pub fn child_index(&self, key: PointKey) -> usize {
        self.keys.partition_point(|&sep| sep <= key)
    }

    pub fn is_overflow(&self, max_keys: usize) -> bool {
        self.keys.len() > max_keys
    }

    /// Split the (already overflowing) node into two halves plus the
    /// separator key promoted to the parent.
    pub fn split(mut self) -> (InternalNode, PointKey, InternalNode) {
        let mid = self.keys.len() / 2;
        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let promoted = self.keys.remove(mid);
        (
            InternalNode {
                keys: self.keys,
                children: self.children,
            },
            promoted,
            InternalNode {
                keys: right_keys,
                children: right_children,
            },
        )
    }
}

impl LeafNode {
    pub fn empty() -> Self {
        LeafNode {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn find(&self, key: PointKey) -> Option<ValuePtr> {
        self.keys
            .iter()
            .position(|&k| k == key)
            .map(|i| self.values[i])
    }

    /// Insert or overwrite `key`'s value. Returns `true` if this is a new
    /// key (the caller uses this to maintain the tree's `entry_count`).
    pub fn upsert(&mut self, key: PointKey, value: ValuePtr) -> bool {
        match self.keys.binary_search(&key) {
            Ok(i) => {
                self.values[i] = value;
                false
            }
            Err(i) => {
                self.keys.insert(i, key);
                self.values.insert(i, value);
                true
            }
        }
    }

    pub fn is_overflow(&self, max_keys: usize) -> bool {
        self.keys.len() > max_keys
    }

    /// Split the (already overflowing) leaf into two halves plus the
    /// separator key promoted to the parent (the right half's first key).
    pub fn split(mut self) -> (LeafNode, PointKey, LeafNode) {
        let mid = self.keys.len() / 2;
        let right_keys = self.keys.split_off(mid);
        let right_values = self.values.split_off(mid);
        let promoted = right_keys[0];
        (
            LeafNode {
                keys: self.keys,
                values: self.values,
            },
            promoted,
            LeafNode {
                keys: right_keys,
                values: right_values,
            },
        )
    }
}
