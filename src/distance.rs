// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Distance functions scoring pairs of points.
//!
//! The engine is agnostic to which function a pairing uses; it only calls
//! `distance(a, b)`. `Euclidean`, `Manhattan`, and `Cosine` cover the
//! reachability-distance functions most commonly selected on the CLI;
//! callers needing another function implement `DistanceFunction` directly.

/// A distance function over two equal-dimensionality vectors.
pub trait DistanceFunction: Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Name used in CLI selection and log output.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Euclidean;

impl DistanceFunction for Euclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }

    fn name(&self) -> &'static str {
        "euclidean"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Manhattan;

impl DistanceFunction for Manhattan {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
    }

    fn name(&self) -> &'static str {
        "manhattan"
    }
}

/// `1 - cosine_similarity`, so that `0` means identical direction and
/// larger values mean more dissimilar, consistent with the other two
/// functions where smaller is closer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cosine;

impl DistanceFunction for Cosine {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b = b.iter().map(|y| y * y).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }
        1.0 - dot / (norm_a * norm_b)
    }

    fn name(&self) -> &'static str {
        "cosine"
    }
}

/// Resolve a distance function by the name the CLI accepts via
/// `--reachdistfunction`.
pub fn by_name(name: &str) -> Option<Box<dyn DistanceFunction>> {
    match name {
        "euclidean" => Some(Box::new(Euclidean)),
        "manhattan" => Some(Box::new(Manhattan)),
        "cosine" => Some(Box::new(Cosine)),
        _ => None,
    }
}
