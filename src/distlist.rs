// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Bounded top-k accumulator for a single query point's neighbors.
//!
//! `DistanceList` holds at most `k` `(neighbor_id, distance)` entries,
//! sorted by non-decreasing distance, with duplicate neighbor ids
//! collapsed to the smaller distance seen. Ties at the capacity boundary
//! keep whichever entry was inserted first.

use serde::{Deserialize, Serialize};

/// One neighbor entry: its id and distance from the owning query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub neighbor_id: u32,
    pub distance: f64,
}

/// Bounded, sorted top-k neighbor list for one query point.
///
/// ## Invariants
/// - `entries.len() <= k`
/// - `entries` sorted by `distance` non-decreasing
/// - no duplicate `neighbor_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceList {
    owner_id: u32,
    k: usize,
    entries: Vec<Neighbor>,
}

impl DistanceList {
    /// Construct an empty list for `owner_id` with capacity `k`.
    pub fn new(owner_id: u32, k: usize) -> Self {
        DistanceList {
            owner_id,
            k,
            entries: Vec::with_capacity(k.min(16)),
        }
    }

    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Insert a candidate neighbor, maintaining sorted order, the
    /// no-duplicates invariant, and the `k`-entry cap.
    ///
    /// If `neighbor_id` is already present, the smaller of the two
    /// distances is kept and the list's order is otherwise left alone
    /// (re-sorting would disturb the stable keep-first-seen tie rule).
    pub fn add_distance(&mut self, neighbor_id: u32, distance: f64) {
        if let Some(existing) = self.entries.iter_mut().find(|n| n.neighbor_id == neighbor_id) {
            if distance < existing.distance {
                existing.distance = distance;
                // Re-establish sort order: the updated entry may now be
                // smaller than one of its predecessors.
                self.entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            }
            return;
        }

        let pos = self
            .entries
            .partition_point(|n| n.distance <= distance);
        self.entries.insert(pos, Neighbor { neighbor_id, distance });

        if self.entries.len() > self.k {
            self.entries.pop();
        }
    }

    /// Stable ordered iteration over the current entries.
    pub fn entries(&self) -> &[Neighbor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
