// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[test]
fn euclidean_matches_known_triangle() {
    assert_eq!(Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
}

#[test]
fn manhattan_sums_absolute_differences() {
    assert_eq!(Manhattan.distance(&[0.0, 0.0], &[3.0, 4.0]), 7.0);
}

#[test]
fn cosine_of_identical_direction_is_zero() {
    let d = Cosine.distance(&[1.0, 2.0], &[2.0, 4.0]);
    assert!(d.abs() < 1e-9);
}

#[test]
fn cosine_handles_zero_vector_without_panicking() {
    assert_eq!(Cosine.distance(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
}

#[test]
fn by_name_resolves_known_functions_and_rejects_unknown() {
    assert_eq!(by_name("euclidean").unwrap().name(), "euclidean");
    assert_eq!(by_name("manhattan").unwrap().name(), "manhattan");
    assert_eq!(by_name("cosine").unwrap().name(), "cosine");
    assert!(by_name("nonsense").is_none());
}
