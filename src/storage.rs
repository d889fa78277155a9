// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Random-access byte store over a single file.
//!
//! `PagedStorage` offers `read`/`write`/`append`/`length`/`sync`/`close`
//! against one backing file, in one of two modes:
//!
//! - `Direct`: every write is an immediate positional write (used for the
//!   tree's append-only data file).
//! - `Buffered`: writes accumulate in a dirty-record cache keyed by
//!   their start offset, flushed to disk on `sync` or once the cache
//!   exceeds its byte bound (used for the tree's directory file, which
//!   is rewritten node-by-node under random access).
//!
//! Both modes guarantee that every write issued before `close()` is
//! durable once `close()` returns.

use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Default byte bound for a `Buffered` storage's dirty-record cache
/// before an implicit flush.
pub const DEFAULT_CACHE_BOUND: usize = 1 << 20; // 1 MiB

enum Mode {
    Direct,
    Buffered {
        dirty: HashMap<u64, Vec<u8>>,
        cache_bound: usize,
        cache_bytes: usize,
    },
}

/// A byte-addressable store over one file.
pub struct PagedStorage {
    file: File,
    path: PathBuf,
    len: u64,
    mode: Mode,
}

impl PagedStorage {
    /// Open (creating if absent) a file in `Direct` mode.
    pub fn open_direct<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::open(path, Mode::Direct)
    }

    /// Open (creating if absent) a file in `Buffered` mode with the
    /// given cache byte bound.
    pub fn open_buffered<P: AsRef<Path>>(path: P, cache_bound: usize) -> EngineResult<Self> {
        Self::open(
            path,
            Mode::Buffered {
                dirty: HashMap::new(),
                cache_bound,
                cache_bytes: 0,
            },
        )
    }

    fn open<P: AsRef<Path>>(path: P, mode: Mode) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| EngineError::IoFailure {
                operation: format!("open {}", path.display()),
                reason: e.to_string(),
            })?;
        let len = file
            .metadata()
            .map_err(|e| EngineError::IoFailure {
                operation: format!("stat {}", path.display()),
                reason: e.to_string(),
            })?
            .len();
        Ok(PagedStorage {
            file,
            path,
            len,
            mode,
        })
    }

    /// Read `len` bytes starting at `offset`.
    ///
    /// In `Buffered` mode, a range entirely covered by a still-unflushed
    /// write is served straight out of the dirty cache: the backing file
    /// may not have those bytes yet. A range that straddles the dirty
    /// cache and the file (or isn't covered at all) falls through to a
    /// real read.
    pub fn read(&mut self, offset: u64, len: usize) -> EngineResult<Vec<u8>> {
        if let Mode::Buffered { dirty, .. } = &self.mode {
            for (&entry_offset, bytes) in dirty {
                if entry_offset <= offset {
                    let start = (offset - entry_offset) as usize;
                    if let Some(end) = start.checked_add(len) {
                        if end <= bytes.len() {
                            return Ok(bytes[start..end].to_vec());
                        }
                    }
                }
            }
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.io_err("seek", e))?;
        let mut buf = vec![0u8; len];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| self.io_err("read", e))?;
        Ok(buf)
    }

    /// Write `bytes` at `offset`, extending the file's tracked length if
    /// the write runs past the current end.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> EngineResult<()> {
        let end = offset + bytes.len() as u64;
        match &mut self.mode {
            Mode::Direct => {
                self.file
                    .seek(SeekFrom::Start(offset))
                    .map_err(|e| EngineError::IoFailure {
                        operation: format!("seek {}", self.path.display()),
                        reason: e.to_string(),
                    })?;
                self.file
                    .write_all(bytes)
                    .map_err(|e| EngineError::IoFailure {
                        operation: format!("write {}", self.path.display()),
                        reason: e.to_string(),
                    })?;
            }
            Mode::Buffered {
                dirty,
                cache_bound,
                cache_bytes,
            } => {
                if let Some(prev) = dirty.insert(offset, bytes.to_vec()) {
                    *cache_bytes -= prev.len();
                }
                *cache_bytes += bytes.len();
                if *cache_bytes >= *cache_bound {
                    self.flush_dirty()?;
                }
            }
        }
        if end > self.len {
            self.len = end;
        }
        Ok(())
    }

    /// Append `bytes` to the end of the file, returning the offset the
    /// write began at.
    pub fn append(&mut self, bytes: &[u8]) -> EngineResult<u64> {
        let offset = self.len;
        self.write(offset, bytes)?;
        Ok(offset)
    }

    /// Current tracked length of the file, including unflushed writes.
    pub fn length(&self) -> u64 {
        self.len
    }

    fn flush_dirty(&mut self) -> EngineResult<()> {
        if let Mode::Buffered {
            dirty, cache_bytes, ..
        } = &mut self.mode
        {
            for (offset, bytes) in dirty.drain() {
                self.file
                    .seek(SeekFrom::Start(offset))
                    .map_err(|e| EngineError::IoFailure {
                        operation: format!("seek {}", self.path.display()),
                        reason: e.to_string(),
                    })?;
                self.file
                    .write_all(&bytes)
                    .map_err(|e| EngineError::IoFailure {
                        operation: format!("flush write {}", self.path.display()),
                        reason: e.to_string(),
                    })?;
            }
            *cache_bytes = 0;
        }
        Ok(())
    }

    /// Flush any buffered writes and fsync the backing file.
    pub fn sync(&mut self) -> EngineResult<()> {
        self.flush_dirty()?;
        self.file.sync_all().map_err(|e| EngineError::IoFailure {
            operation: format!("sync {}", self.path.display()),
            reason: e.to_string(),
        })
    }

    /// Flush and fsync, then drop the file handle.
    pub fn close(mut self) -> EngineResult<()> {
        self.sync()
    }

    fn io_err(&self, operation: &str, e: std::io::Error) -> EngineError {
        EngineError::IoFailure {
            operation: format!("{operation} {}", self.path.display()),
            reason: e.to_string(),
        }
    }
}
