// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for reachpack.
//!
//! Hand-rolled error enum in the style the rest of the crate expects:
//! struct-like variants carrying enough context to log without a
//! backtrace, a manual `Display` impl, and a `Result` alias used by
//! every fallible operation in the library.

use std::fmt;

/// Which side of a pairing triggered an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The left-hand partition of a pairing.
    Left,
    /// The right-hand partition of a pairing.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// reachpack error type.
#[derive(Debug)]
pub enum EngineError {
    /// Either side of a pairing had zero points. Fatal: aborts the run
    /// before any work starts.
    EmptyPartition { pairing_index: usize, side: Side },

    /// The directory or data file of a `DynamicBPlusTree` failed a
    /// structural check (bad magic, truncated node, checksum mismatch).
    CorruptTree { reason: String },

    /// The package descriptor failed `verify()`.
    CorruptPackage { reason: String },

    /// Any disk I/O error encountered while a pairing was being
    /// processed.
    IoFailure { operation: String, reason: String },

    /// A key that should have existed in the tree (per the `seen` set)
    /// was missing on `get`. Indicates an internal invariant violation.
    KeyMissing { key: u32 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyPartition { pairing_index, side } => write!(
                f,
                "pairing {pairing_index}: {side} partition is empty"
            ),
            EngineError::CorruptTree { reason } => write!(f, "corrupt tree: {reason}"),
            EngineError::CorruptPackage { reason } => write!(f, "corrupt package: {reason}"),
            EngineError::IoFailure { operation, reason } => {
                write!(f, "I/O failure during {operation}: {reason}")
            }
            EngineError::KeyMissing { key } => write!(f, "key {key} missing from tree"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoFailure {
            operation: "io".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
