// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow, crate-local store error, funneled into [`orbitmesh_core::OrbitError`]
//! at the boundary (matching the teacher's per-crate error pattern).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("wal entry at offset {offset} is corrupt: {detail}")]
    Corrupt { offset: u64, detail: String },
}

impl From<StoreError> for orbitmesh_core::OrbitError {
    fn from(err: StoreError) -> Self {
        orbitmesh_core::OrbitError::unavailable(err.to_string())
    }
}
