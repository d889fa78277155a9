// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[test]
fn empty_list_has_no_entries() {
    let list = DistanceList::new(1, 2);
    assert!(list.is_empty());
    assert_eq!(list.k(), 2);
}

#[test]
fn keeps_k_smallest_in_sorted_order() {
    let mut list = DistanceList::new(1, 2);
    list.add_distance(2, 3.0);
    list.add_distance(3, 4.0);
    list.add_distance(4, 1.0);

    let ids: Vec<u32> = list.entries().iter().map(|n| n.neighbor_id).collect();
    let dists: Vec<f64> = list.entries().iter().map(|n| n.distance).collect();
    assert_eq!(ids, vec![4, 2]);
    assert_eq!(dists, vec![1.0, 3.0]);
}

#[test]
fn duplicate_neighbor_keeps_smaller_distance() {
    let mut list = DistanceList::new(1, 3);
    list.add_distance(5, 10.0);
    list.add_distance(5, 2.0);
    assert_eq!(list.len(), 1);
    assert_eq!(list.entries()[0].distance, 2.0);

    // A larger distance for an already-seen neighbor is a no-op.
    list.add_distance(5, 99.0);
    assert_eq!(list.entries()[0].distance, 2.0);
}

#[test]
fn ties_keep_first_seen_order() {
    let mut list = DistanceList::new(1, 1);
    list.add_distance(2, 1.0);
    list.add_distance(3, 1.0);
    // Capacity 1: the first-seen neighbor (2) must survive the tie.
    assert_eq!(list.entries().len(), 1);
    assert_eq!(list.entries()[0].neighbor_id, 2);
}

#[test]
fn k_equals_one_yields_singleton() {
    let mut list = DistanceList::new(9, 1);
    list.add_distance(1, 5.0);
    list.add_distance(2, 1.0);
    assert_eq!(list.len(), 1);
    assert_eq!(list.entries()[0].neighbor_id, 2);
}

#[test]
fn scenario_self_pairing_single_point() {
    // Self-pairing with |A| = 1: the point is its own nearest neighbor
    // at distance 0.
    let mut list = DistanceList::new(1, 2);
    list.add_distance(1, 0.0);
    assert_eq!(list.len(), 1);
    assert_eq!(list.entries()[0].distance, 0.0);
}

#[test]
fn serde_round_trip_preserves_equality() {
    let mut list = DistanceList::new(7, 3);
    list.add_distance(1, 4.0);
    list.add_distance(2, 2.0);
    let encoded = serde_json::to_vec(&list).unwrap();
    let decoded: DistanceList = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(list, decoded);
}
