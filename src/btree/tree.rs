// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `DynamicBPlusTree`: an ordered `PointKey -> DistanceList` map backed by
//! two files, a *directory* of interior/leaf nodes and a *data* file of
//! payloads.
//!
//! Every `put` is copy-on-write: a node is never rewritten in place, it is
//! re-encoded and appended fresh, with the new offset threaded up to a new
//! root. This keeps every read's `(offset, len)` pair pointing at exactly
//! the bytes last written for it, which is what lets the directory file's
//! `Buffered` `PagedStorage` use a plain offset-keyed dirty cache instead of
//! a page-versioning scheme.

use crate::btree::node::{InternalNode, LeafNode, Node, ValuePtr};
use crate::btree::types::{max_keys_per_bucket, PointKey, TreeHandle, BTREE_MAGIC, HEADER_SIZE};
use crate::codec::DistanceListCodec;
use crate::distlist::DistanceList;
use crate::error::{EngineError, EngineResult};
use crate::storage::{PagedStorage, DEFAULT_CACHE_BOUND};
use std::path::{Path, PathBuf};

pub struct DynamicBPlusTree {
    directory: PagedStorage,
    data: PagedStorage,
    directory_path: PathBuf,
    data_path: PathBuf,
    root_offset: u64,
    entry_count: u64,
    max_keys: usize,
    /// Neighbor-list capacity shared by every value in this tree, needed to
    /// reconstruct a `DistanceList` on `get` without external bookkeeping.
    k: usize,
}

impl DynamicBPlusTree {
    /// Create a fresh tree sized for `estimated_unique_ids` distinct keys,
    /// or open an already-initialized pair of files at the same paths.
    pub fn create<P1: AsRef<Path>, P2: AsRef<Path>>(
        directory_path: P1,
        data_path: P2,
        estimated_unique_ids: u64,
        k: usize,
    ) -> EngineResult<Self> {
        let directory_path = directory_path.as_ref().to_path_buf();
        let data_path = data_path.as_ref().to_path_buf();
        let directory = PagedStorage::open_buffered(&directory_path, DEFAULT_CACHE_BOUND)?;
        let data = PagedStorage::open_direct(&data_path)?;

        let mut tree = DynamicBPlusTree {
            directory,
            data,
            directory_path,
            data_path,
            root_offset: 0,
            entry_count: 0,
            max_keys: max_keys_per_bucket(estimated_unique_ids),
            k,
        };

        if tree.directory.length() == 0 {
            tree.directory.write(0, &vec![0u8; HEADER_SIZE as usize])?;
            let root_offset = tree.append_node(&Node::Leaf(LeafNode::empty()))?;
            tree.root_offset = root_offset;
            tree.write_header()?;
        } else {
            tree.load_header()?;
        }
        Ok(tree)
    }

    /// Open a previously-closed tree's files by their header.
    pub fn open<P1: AsRef<Path>, P2: AsRef<Path>>(
        directory_path: P1,
        data_path: P2,
    ) -> EngineResult<Self> {
        let directory_path = directory_path.as_ref().to_path_buf();
        let data_path = data_path.as_ref().to_path_buf();
        let directory = PagedStorage::open_buffered(&directory_path, DEFAULT_CACHE_BOUND)?;
        let data = PagedStorage::open_direct(&data_path)?;

        if directory.length() < HEADER_SIZE {
            return Err(EngineError::CorruptTree {
                reason: format!(
                    "directory file {} shorter than header ({} bytes)",
                    directory_path.display(),
                    HEADER_SIZE
                ),
            });
        }

        let mut tree = DynamicBPlusTree {
            directory,
            data,
            directory_path,
            data_path,
            root_offset: 0,
            entry_count: 0,
            max_keys: 5,
            k: 0,
        };
        tree.load_header()?;
        Ok(tree)
    }

    /// Insert or update `key`'s value.
    pub fn put(&mut self, key: PointKey, value: &DistanceList) -> EngineResult<()> {
        let encoded = DistanceListCodec::encode(value);
        let data_offset = self.data.append(&encoded)?;
        let ptr = ValuePtr {
            offset: data_offset,
            len: encoded.len() as u32,
        };

        let (new_root, split, inserted_new) = self.insert(self.root_offset, key, ptr)?;
        self.root_offset = match split {
            Some((split_key, right_offset)) => {
                let new_root_node = Node::Internal(InternalNode {
                    keys: vec![split_key],
                    children: vec![new_root, right_offset],
                });
                self.append_node(&new_root_node)?
            }
            None => new_root,
        };
        if inserted_new {
            self.entry_count += 1;
        }
        self.write_header()?;
        Ok(())
    }

    /// Fetch `key`'s value, decoded with this tree's shared `k`.
    pub fn get(&mut self, key: PointKey) -> EngineResult<DistanceList> {
        let leaf = self.descend_to_leaf(key)?;
        let ptr = leaf.find(key).ok_or(EngineError::KeyMissing { key })?;
        let bytes = self.data.read(ptr.offset, ptr.len as usize)?;
        DistanceListCodec::decode(&bytes, self.k)
    }

    /// Whether `key` has an entry.
    pub fn contains(&mut self, key: PointKey) -> EngineResult<bool> {
        let leaf = self.descend_to_leaf(key)?;
        Ok(leaf.find(key).is_some())
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Sync both backing files and return the handle to pin this tree into
    /// a package descriptor.
    pub fn close(mut self) -> EngineResult<TreeHandle> {
        self.write_header()?;
        self.directory.sync()?;
        self.data.sync()?;
        Ok(TreeHandle {
            directory_path: self.directory_path,
            data_path: self.data_path,
            root_offset: self.root_offset,
            entry_count: self.entry_count,
        })
    }

    fn descend_to_leaf(&mut self, key: PointKey) -> EngineResult<LeafNode> {
        let mut offset = self.root_offset;
        loop {
            match self.read_node(offset)? {
                Node::Leaf(leaf) => return Ok(leaf),
                Node::Internal(internal) => {
                    let idx = internal.child_index(key);
                    offset = internal.children[idx];
                }
            }
        }
    }

    /// Recursive copy-on-write insert. Returns the freshly-appended
    /// offset for this subtree's new root, an optional `(separator,
    /// right_offset)` if this level split, and whether `key` was new.
    fn insert(
        &mut self,
        node_offset: u64,
        key: PointKey,
        value: ValuePtr,
    ) -> EngineResult<(u64, Option<(PointKey, u64)>, bool)> {
        match self.read_node(node_offset)? {
            Node::Leaf(mut leaf) => {
                let inserted_new = leaf.upsert(key, value);
                if leaf.is_overflow(self.max_keys) {
                    let (left, promoted, right) = leaf.split();
                    let left_offset = self.append_node(&Node::Leaf(left))?;
                    let right_offset = self.append_node(&Node::Leaf(right))?;
                    Ok((left_offset, Some((promoted, right_offset)), inserted_new))
                } else {
                    let offset = self.append_node(&Node::Leaf(leaf))?;
                    Ok((offset, None, inserted_new))
                }
            }
            Node::Internal(mut internal) => {
                let idx = internal.child_index(key);
                let (child_offset, split, inserted_new) =
                    self.insert(internal.children[idx], key, value)?;
                internal.children[idx] = child_offset;
                if let Some((split_key, right_offset)) = split {
                    internal.keys.insert(idx, split_key);
                    internal.children.insert(idx + 1, right_offset);
                }
                if internal.is_overflow(self.max_keys) {
                    let (left, promoted, right) = internal.split();
                    let left_offset = self.append_node(&Node::Internal(left))?;
                    let right_offset = self.append_node(&Node::Internal(right))?;
                    Ok((left_offset, Some((promoted, right_offset)), inserted_new))
                } else {
                    let offset = self.append_node(&Node::Internal(internal))?;
                    Ok((offset, None, inserted_new))
                }
            }
        }
    }

    /// A node record is `[len:4B][crc32:4B][bytes]`: the CRC guards
    /// against a partially-written or bit-flipped node, matching the
    /// teacher's page-level checksum convention.
    fn append_node(&mut self, node: &Node) -> EngineResult<u64> {
        let bytes = node.encode()?;
        let crc = crc32fast::hash(&bytes);
        let mut record = Vec::with_capacity(8 + bytes.len());
        record.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        record.extend_from_slice(&crc.to_be_bytes());
        record.extend_from_slice(&bytes);
        self.directory.append(&record)
    }

    fn read_node(&mut self, offset: u64) -> EngineResult<Node> {
        let prefix = self.directory.read(offset, 8)?;
        let len = u32::from_be_bytes(prefix[0..4].try_into().unwrap()) as usize;
        let expected_crc = u32::from_be_bytes(prefix[4..8].try_into().unwrap());
        let bytes = self.directory.read(offset + 8, len)?;
        let actual_crc = crc32fast::hash(&bytes);
        if actual_crc != expected_crc {
            return Err(EngineError::CorruptTree {
                reason: format!(
                    "node at offset {offset} failed checksum: expected {expected_crc:#x}, got {actual_crc:#x}"
                ),
            });
        }
        Node::decode(&bytes)
    }

    fn write_header(&mut self) -> EngineResult<()> {
        let mut buf = Vec::with_capacity(HEADER_SIZE as usize);
        buf.extend_from_slice(&BTREE_MAGIC.to_be_bytes());
        buf.extend_from_slice(&(self.max_keys as u32).to_be_bytes());
        buf.extend_from_slice(&(self.k as u32).to_be_bytes());
        buf.extend_from_slice(&self.root_offset.to_be_bytes());
        buf.extend_from_slice(&self.entry_count.to_be_bytes());
        self.directory.write(0, &buf)
    }

    fn load_header(&mut self) -> EngineResult<()> {
        let buf = self.directory.read(0, HEADER_SIZE as usize)?;
        let magic = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        if magic != BTREE_MAGIC {
            return Err(EngineError::CorruptTree {
                reason: format!("bad directory header magic: {magic:#x}"),
            });
        }
        self.max_keys = u32::from_be_bytes(buf[4..8].try_into().unwrap()) as usize;
        self.k = u32::from_be_bytes(buf[8..12].try_into().unwrap()) as usize;
        self.root_offset = u64::from_be_bytes(buf[12..20].try_into().unwrap());
        self.entry_count = u64::from_be_bytes(buf[20..28].try_into().unwrap());
        Ok(())
    }
}
