// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmesh`: a thin administrative client for `orbitmeshd`. Issues
//! `Request`s over the admin socket and renders `Response`s; no business
//! logic lives here (spec §10.1).

mod client;
mod color;
mod commands;
mod exit_error;
mod output;
mod table;

use clap::{Parser, Subcommand};
use client::DaemonClient;
use commands::{agent, decision, events, job, workflow};
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "orbitmesh", about = "Administrative client for orbitmeshd", styles = color::styles())]
struct Cli {
    /// Admin socket path. Defaults to the platform state dir's `admin.sock`.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the daemon is reachable
    Ping,
    /// Request a graceful shutdown
    Shutdown {
        #[arg(long)]
        drain_timeout_ms: Option<u64>,
    },
    /// Agent registry commands
    Agent(agent::AgentArgs),
    /// Job dispatch commands
    Job(job::JobArgs),
    /// Workflow definition and instance commands
    Workflow(workflow::WorkflowArgs),
    /// Human-in-the-loop decision commands
    Decision(decision::DecisionArgs),
    /// Tail the event bus
    Events(events::EventsArgs),
}

fn default_socket_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("orbitmesh")
        .join("admin.sock")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let socket_path = cli.socket.clone().unwrap_or_else(default_socket_path);
    let client = DaemonClient::new(socket_path);

    match run(cli.command, &client, cli.output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("orbitmesh: {err}");
            ExitCode::from(err.code as u8)
        }
    }
}

async fn run(command: Command, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        Command::Ping => {
            client.send_ok(&orbitmesh_wire::Request::Ping).await?;
            println!("pong");
            Ok(())
        }
        Command::Shutdown { drain_timeout_ms } => {
            client.send(&orbitmesh_wire::Request::Shutdown { drain_timeout_ms }).await?;
            println!("Shutdown requested");
            Ok(())
        }
        Command::Agent(args) => agent::handle(args.command, client, format).await,
        Command::Job(args) => job::handle(args.command, client, format).await,
        Command::Workflow(args) => workflow::handle(args.command, client, format).await,
        Command::Decision(args) => decision::handle(args.command, client, format).await,
        Command::Events(args) => events::handle(args, client, format).await,
    }
}
