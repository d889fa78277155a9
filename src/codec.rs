// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size key and variable-size payload codecs.
//!
//! Two contracts: `IntCodec` encodes `PointId` keys as a constant
//! 4-byte big-endian value (matching the big-endian convention the
//! teacher's `store::btree::page` header uses), and `DistanceListCodec`
//! encodes the wire format spec'd for `DistanceList`:
//! `owner_id:4B, count:4B, (neighbor_id:4B, distance:8B) * count`.

use crate::distlist::DistanceList;
use crate::error::{EngineError, EngineResult};

/// Sentinel returned by `fixed_size()` for variable-length encodings.
pub const VARIABLE_SIZE: usize = usize::MAX;

/// Fixed-width 4-byte big-endian codec for `u32` keys.
pub struct IntCodec;

impl IntCodec {
    pub fn encode(value: u32) -> [u8; 4] {
        value.to_be_bytes()
    }

    pub fn decode(bytes: &[u8]) -> EngineResult<u32> {
        let arr: [u8; 4] = bytes.try_into().map_err(|_| EngineError::CorruptTree {
            reason: format!("expected 4-byte key, got {} bytes", bytes.len()),
        })?;
        Ok(u32::from_be_bytes(arr))
    }

    pub fn fixed_size() -> usize {
        4
    }
}

/// Length-prefixed codec for `DistanceList` payloads.
pub struct DistanceListCodec;

impl DistanceListCodec {
    pub fn encode(list: &DistanceList) -> Vec<u8> {
        let entries = list.entries();
        let mut buf = Vec::with_capacity(8 + entries.len() * 12);
        buf.extend_from_slice(&list.owner_id().to_be_bytes());
        buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for n in entries {
            buf.extend_from_slice(&n.neighbor_id.to_be_bytes());
            buf.extend_from_slice(&n.distance.to_be_bytes());
        }
        buf
    }

    pub fn decode(bytes: &[u8], k: usize) -> EngineResult<DistanceList> {
        if bytes.len() < 8 {
            return Err(EngineError::CorruptTree {
                reason: format!("distance list payload too short: {} bytes", bytes.len()),
            });
        }
        let owner_id = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let count = u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize;

        let expected_len = 8 + count * 12;
        if bytes.len() != expected_len {
            return Err(EngineError::CorruptTree {
                reason: format!(
                    "distance list payload length mismatch: expected {expected_len}, got {}",
                    bytes.len()
                ),
            });
        }

        let mut list = DistanceList::new(owner_id, k.max(count));
        for i in 0..count {
            let off = 8 + i * 12;
            let neighbor_id = u32::from_be_bytes(bytes[off..off + 4].try_into().unwrap());
            let distance = f64::from_be_bytes(bytes[off + 4..off + 12].try_into().unwrap());
            list.add_distance(neighbor_id, distance);
        }
        Ok(list)
    }

    pub fn fixed_size() -> usize {
        VARIABLE_SIZE
    }
}
