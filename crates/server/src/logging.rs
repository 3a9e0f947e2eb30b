// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing` initialization (spec §10.3): `EnvFilter` honoring `RUST_LOG`,
//! stderr always, plus a non-blocking rolling file appender when a log
//! directory is configured.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Guard that must be held for the process lifetime to keep the non-blocking
/// file writer flushing.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init(log_dir: Option<&Path>) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "orbitmeshd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            registry.with_writer(non_blocking).init();
            LoggingGuard { _file_guard: Some(guard) }
        }
        None => {
            registry.init();
            LoggingGuard { _file_guard: None }
        }
    }
}
