// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmeshd`: the OrbitMesh coordinator process. Binds the agent session
//! listener and the administrative control socket, runs the central event
//! reactor and the periodic sweep, and drains on shutdown (spec §9).

mod admin_listener;
mod app;
mod background;
mod config;
mod connections;
mod logging;
mod session_listener;

use app::App;
use clap::Parser;
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "orbitmeshd", about = "OrbitMesh coordinator daemon")]
struct Args {
    /// Path to a TOML config file. Defaults to the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("orbitmeshd: invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };

    let _logging_guard = logging::init(config.log_dir.as_deref());

    if config.shared_token.is_empty() {
        error!("no shared_token configured; refusing to start with no usable authenticator");
        return ExitCode::from(4);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("orbitmeshd: failed to start async runtime: {err}");
            return ExitCode::from(3);
        }
    };

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> ExitCode {
    let drain_timeout_ms = config.drain_timeout_ms;
    let app = match App::new(config) {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "failed to initialize store");
            return ExitCode::from(3);
        }
    };

    let session_listener = match tokio::net::TcpListener::bind(&app.config.session_bind).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, bind = %app.config.session_bind, "failed to bind session listener");
            return ExitCode::from(3);
        }
    };
    info!(bind = %app.config.session_bind, "session listener bound");

    let admin_socket_path = app.config.admin_socket_path();
    let _ = std::fs::remove_file(&admin_socket_path);
    if let Some(parent) = admin_socket_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let admin_listener = match tokio::net::UnixListener::bind(&admin_socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, path = ?admin_socket_path, "failed to bind admin socket");
            return ExitCode::from(3);
        }
    };
    info!(path = ?admin_socket_path, "admin listener bound");

    tokio::spawn(session_listener::run(session_listener, app.clone()));
    tokio::spawn(admin_listener::run(admin_listener, app.clone()));
    tokio::spawn(background::run_event_reactor(app.clone()));
    tokio::spawn(background::run_sweep(app.clone()));

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, shutting down");
            true
        }
        _ = app.shutdown.notified() => {
            info!("shutdown requested, draining");
            false
        }
    };

    app.stop(drain_timeout_ms).await;
    let _ = std::fs::remove_file(&admin_socket_path);

    if interrupted {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    }
}
