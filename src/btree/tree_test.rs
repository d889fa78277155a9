// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use super::tree::DynamicBPlusTree;
use crate::distlist::DistanceList;
use crate::error::EngineError;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use tempfile::tempdir;

fn list_for(owner_id: u32) -> DistanceList {
    let mut list = DistanceList::new(owner_id, 3);
    list.add_distance(owner_id + 1, 1.0);
    list
}

#[test]
fn put_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let mut tree =
        DynamicBPlusTree::create(dir.path().join("dir.bin"), dir.path().join("data.bin"), 10, 3)
            .unwrap();

    tree.put(1, &list_for(1)).unwrap();
    tree.put(2, &list_for(2)).unwrap();

    assert_eq!(tree.get(1).unwrap(), list_for(1));
    assert_eq!(tree.get(2).unwrap(), list_for(2));
}

#[test]
fn missing_key_is_key_missing_error() {
    let dir = tempdir().unwrap();
    let mut tree =
        DynamicBPlusTree::create(dir.path().join("dir.bin"), dir.path().join("data.bin"), 10, 3)
            .unwrap();
    tree.put(1, &list_for(1)).unwrap();

    match tree.get(42) {
        Err(EngineError::KeyMissing { key }) => assert_eq!(key, 42),
        other => panic!("expected KeyMissing, got {other:?}"),
    }
    assert!(!tree.contains(42).unwrap());
    assert!(tree.contains(1).unwrap());
}

#[test]
fn update_does_not_grow_entry_count() {
    let dir = tempdir().unwrap();
    let mut tree =
        DynamicBPlusTree::create(dir.path().join("dir.bin"), dir.path().join("data.bin"), 10, 3)
            .unwrap();

    tree.put(1, &list_for(1)).unwrap();
    assert_eq!(tree.entry_count(), 1);

    let mut updated = list_for(1);
    updated.add_distance(99, 0.1);
    tree.put(1, &updated).unwrap();

    assert_eq!(tree.entry_count(), 1);
    assert_eq!(tree.get(1).unwrap(), updated);
}

#[test]
fn survives_many_inserts_past_a_single_bucket() {
    let dir = tempdir().unwrap();
    let mut tree =
        DynamicBPlusTree::create(dir.path().join("dir.bin"), dir.path().join("data.bin"), 4, 3)
            .unwrap();

    // maxKeysPerBucket floors at 5 regardless of the small estimate, so
    // inserting well past that forces at least one leaf (and likely one
    // internal) split.
    for id in 0..40u32 {
        tree.put(id, &list_for(id)).unwrap();
    }
    assert_eq!(tree.entry_count(), 40);
    for id in 0..40u32 {
        assert_eq!(tree.get(id).unwrap(), list_for(id));
    }
}

#[test]
fn close_then_reopen_returns_byte_identical_values() {
    let dir = tempdir().unwrap();
    let directory_path = dir.path().join("dir.bin");
    let data_path = dir.path().join("data.bin");

    let mut tree =
        DynamicBPlusTree::create(&directory_path, &data_path, 10, 3).unwrap();
    for id in 0..12u32 {
        tree.put(id, &list_for(id)).unwrap();
    }
    let handle = tree.close().unwrap();
    assert_eq!(handle.entry_count, 12);
    assert_eq!(handle.directory_path, directory_path);

    let mut reopened = DynamicBPlusTree::open(&directory_path, &data_path).unwrap();
    assert_eq!(reopened.entry_count(), 12);
    for id in 0..12u32 {
        assert_eq!(reopened.get(id).unwrap(), list_for(id));
    }
}

#[test]
fn bit_flip_in_a_node_record_is_caught_as_corrupt_tree() {
    let dir = tempdir().unwrap();
    let directory_path = dir.path().join("dir.bin");
    let data_path = dir.path().join("data.bin");

    let mut tree = DynamicBPlusTree::create(&directory_path, &data_path, 4, 3).unwrap();
    tree.put(1, &list_for(1)).unwrap();
    tree.close().unwrap();

    // Flip a byte just past the root leaf's length/crc prefix, inside its
    // serialized body.
    let mut file = OpenOptions::new().write(true).open(&directory_path).unwrap();
    file.seek(SeekFrom::Start(super::types::HEADER_SIZE + 10)).unwrap();
    file.write_all(&[0xFFu8]).unwrap();
    drop(file);

    let mut reopened = DynamicBPlusTree::open(&directory_path, &data_path).unwrap();
    match reopened.get(1) {
        Err(EngineError::CorruptTree { .. }) => {}
        other => panic!("expected CorruptTree, got {other:?}"),
    }
}
