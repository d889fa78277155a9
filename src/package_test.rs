// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::distance::Euclidean;
use crate::error::EngineError;
use std::fs;
use tempfile::tempdir;

fn write_csv(path: &std::path::Path, rows: &[(u32, f64)]) {
    let body: String = rows
        .iter()
        .map(|(id, v)| format!("{id},{v}\n"))
        .collect();
    fs::write(path, body).unwrap();
}

fn descriptor_with(dir: &std::path::Path, pairings: Vec<PairingEntry>) -> PackageDescriptor {
    PackageDescriptor {
        partitions: vec![
            PartitionEntry {
                id: 0,
                path: dir.join("a.csv"),
            },
            PartitionEntry {
                id: 1,
                path: dir.join("b.csv"),
            },
        ],
        pairings,
    }
}

#[test]
fn run_processes_pending_pairings_and_persists_descriptor() {
    let dir = tempdir().unwrap();
    write_csv(&dir.path().join("a.csv"), &[(1, 0.0), (2, 10.0)]);
    write_csv(&dir.path().join("b.csv"), &[(3, 1.0), (4, 9.0)]);

    let descriptor = descriptor_with(
        dir.path(),
        vec![PairingEntry {
            left_partition_id: 0,
            right_partition_id: 1,
            self_pairing: false,
            estimated_unique_ids: 4,
            result: None,
        }],
    );
    let descriptor_path = dir.path().join("package.json");
    descriptor.save(&descriptor_path).unwrap();

    let metrics = PackageRunner::run(&descriptor_path, 1, &Euclidean, false).unwrap();
    assert_eq!(metrics.pairings_completed(), 1);
    assert!(metrics.total_items() > 0);

    let reloaded = PackageDescriptor::load(&descriptor_path).unwrap();
    assert!(reloaded.pairings[0].result.is_some());
    assert!(reloaded.pending_pairing_indices().is_empty());
}

#[test]
fn rerun_skips_already_resolved_pairings() {
    let dir = tempdir().unwrap();
    write_csv(&dir.path().join("a.csv"), &[(1, 0.0)]);
    write_csv(&dir.path().join("b.csv"), &[(2, 1.0)]);

    let descriptor = descriptor_with(
        dir.path(),
        vec![PairingEntry {
            left_partition_id: 0,
            right_partition_id: 1,
            self_pairing: false,
            estimated_unique_ids: 2,
            result: None,
        }],
    );
    let descriptor_path = dir.path().join("package.json");
    descriptor.save(&descriptor_path).unwrap();

    PackageRunner::run(&descriptor_path, 1, &Euclidean, false).unwrap();
    let first_handle = PackageDescriptor::load(&descriptor_path)
        .unwrap()
        .pairings[0]
        .result
        .clone()
        .unwrap();

    // A second run over the same descriptor must not touch the already
    // resolved pairing: its tree handle is unchanged.
    let metrics = PackageRunner::run(&descriptor_path, 1, &Euclidean, false).unwrap();
    assert_eq!(metrics.pairings_completed(), 0);
    let second_handle = PackageDescriptor::load(&descriptor_path)
        .unwrap()
        .pairings[0]
        .result
        .clone()
        .unwrap();
    assert_eq!(first_handle, second_handle);
}

#[test]
fn empty_partition_fails_before_any_work_starts() {
    let dir = tempdir().unwrap();
    write_csv(&dir.path().join("a.csv"), &[]);
    write_csv(&dir.path().join("b.csv"), &[(1, 0.0)]);

    let descriptor = descriptor_with(
        dir.path(),
        vec![PairingEntry {
            left_partition_id: 0,
            right_partition_id: 1,
            self_pairing: false,
            estimated_unique_ids: 1,
            result: None,
        }],
    );
    let descriptor_path = dir.path().join("package.json");
    descriptor.save(&descriptor_path).unwrap();

    match PackageRunner::run(&descriptor_path, 1, &Euclidean, false) {
        Err(EngineError::EmptyPartition { pairing_index, .. }) => assert_eq!(pairing_index, 0),
        other => panic!("expected EmptyPartition, got {other:?}"),
    }
}

#[test]
fn verify_rejects_dangling_partition_reference() {
    let dir = tempdir().unwrap();
    let descriptor = descriptor_with(
        dir.path(),
        vec![PairingEntry {
            left_partition_id: 0,
            right_partition_id: 99,
            self_pairing: false,
            estimated_unique_ids: 1,
            result: None,
        }],
    );
    assert!(descriptor.verify().is_err());
}
