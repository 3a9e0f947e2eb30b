// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of domain events, grounded on the lineage's
//! WAL: each store mutation is appended here and flushed before the in-memory
//! state is updated, so a write the caller observed as durable survives a
//! crash (spec §6: "every write of a terminal job status and every workflow
//! step transition must be durable before the corresponding event is
//! published").
//!
//! On-disk format: a sequence of `u32 length (big-endian) | JSON bytes`
//! records, one per [`orbitmesh_core::Event`].

use crate::error::StoreError;
use orbitmesh_core::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// One record read back from the log.
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// An append-only log backed by a single file, tracking both the highest
/// sequence number written and the highest sequence number the caller has
/// acknowledged as applied (`processed_seq`), so replay after a restart can
/// skip what's already materialized.
pub struct Wal {
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
}

impl Wal {
    /// Open (creating if absent) the log at `path`. `processed_seq` is the
    /// caller's last-known-applied sequence number, persisted externally
    /// alongside the materialized state snapshot.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, StoreError> {
        let file = OpenOptions::new().create(true).read(true).append(true).open(path.as_ref())?;
        let write_seq = Self::count_entries(path.as_ref())?;
        Ok(Self { writer: BufWriter::new(file), write_seq, processed_seq })
    }

    fn count_entries(path: &Path) -> Result<u64, StoreError> {
        let mut file = File::open(path)?;
        let mut count = 0u64;
        loop {
            let mut len_buf = [0u8; 4];
            match file.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_be_bytes(len_buf);
            file.seek(SeekFrom::Current(len as i64))?;
            count += 1;
        }
        Ok(count)
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append one event, returning its sequence number. Does not flush;
    /// callers that need the durability guarantee must call [`Self::flush`].
    pub fn append(&mut self, event: &Event) -> Result<u64, StoreError> {
        let payload = serde_json::to_vec(event)?;
        self.writer.write_all(&(payload.len() as u32).to_be_bytes())?;
        self.writer.write_all(&payload)?;
        self.write_seq += 1;
        Ok(self.write_seq)
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Replay every entry after `processed_seq`, in order.
    pub fn replay(&self, path: impl AsRef<Path>) -> Result<Vec<WalEntry>, StoreError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut seq = 0u64;
        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut payload = vec![0u8; len];
            reader.read_exact(&mut payload).map_err(|e| StoreError::Corrupt {
                offset: seq,
                detail: e.to_string(),
            })?;
            seq += 1;
            if seq <= self.processed_seq {
                continue;
            }
            let event: Event = serde_json::from_slice(&payload)?;
            entries.push(WalEntry { seq, event });
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
