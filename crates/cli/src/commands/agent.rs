// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmesh agent` — agent registry queries and lifecycle mutations.

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, OutputFormat};
use crate::table::{Column, Table};
use clap::{Args, Subcommand};
use orbitmesh_core::agent::Capability;
use orbitmesh_core::{Agent, AgentId};
use orbitmesh_wire::{Request, Response};
use std::collections::BTreeMap;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List registered agents
    List {
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one agent
    Get { agent_id: String },
    /// Pause an agent (stop assigning it new jobs)
    Pause { agent_id: String },
    /// Resume a paused agent
    Resume { agent_id: String },
    /// Request a graceful stop
    Stop { agent_id: String },
    /// Remove a disconnected agent from the registry
    Remove { agent_id: String },
    /// Replace an agent's advertised capabilities
    UpdateCapabilities {
        agent_id: String,
        /// One capability as `name` or `name@version` — repeatable
        #[arg(long = "capability", required = true)]
        capabilities: Vec<String>,
    },
}

pub async fn handle(command: AgentCommand, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        AgentCommand::List { group, status } => {
            let response = client.send(&Request::AgentsList { group, status }).await?;
            let Response::Agents { agents } = response else {
                return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
            };
            handle_list(format, &agents, "No agents registered", render_agent_table)
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        AgentCommand::Get { agent_id } => {
            let response = client.send(&Request::AgentGet { agent_id: AgentId::from_string(&agent_id) }).await?;
            let Response::Agent { agent } = response else {
                return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
            };
            let agent = agent.ok_or_else(|| ExitError::new(1, "agent not found"))?;
            format_or_json(format, &agent, || print_agent_detail(&agent))
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        AgentCommand::Pause { agent_id } => {
            client.send_ok(&Request::AgentPause { agent_id: AgentId::from_string(&agent_id) }).await?;
            println!("Agent {agent_id} paused");
            Ok(())
        }
        AgentCommand::Resume { agent_id } => {
            client.send_ok(&Request::AgentResume { agent_id: AgentId::from_string(&agent_id) }).await?;
            println!("Agent {agent_id} resumed");
            Ok(())
        }
        AgentCommand::Stop { agent_id } => {
            client.send_ok(&Request::AgentStop { agent_id: AgentId::from_string(&agent_id) }).await?;
            println!("Agent {agent_id} stopping");
            Ok(())
        }
        AgentCommand::Remove { agent_id } => {
            client.send_ok(&Request::AgentRemove { agent_id: AgentId::from_string(&agent_id) }).await?;
            println!("Agent {agent_id} removed");
            Ok(())
        }
        AgentCommand::UpdateCapabilities { agent_id, capabilities } => {
            let capabilities = capabilities.iter().map(|spec| parse_capability(spec)).collect();
            client
                .send_ok(&Request::AgentUpdateCapabilities {
                    agent_id: AgentId::from_string(&agent_id),
                    capabilities,
                })
                .await?;
            println!("Agent {agent_id} capabilities updated");
            Ok(())
        }
    }
}

fn parse_capability(spec: &str) -> Capability {
    match spec.split_once('@') {
        Some((name, version)) => {
            Capability { name: name.to_string(), version: version.to_string(), props: BTreeMap::new() }
        }
        None => Capability { name: spec.to_string(), version: String::new(), props: BTreeMap::new() },
    }
}

fn render_agent_table(agents: &[Agent], out: &mut dyn std::io::Write) {
    let mut table = Table::new(vec![
        Column::muted("ID"),
        Column::left("NAME"),
        Column::left("GROUP"),
        Column::left("STATUS"),
        Column::left("ASSIGNMENTS"),
        Column::left("LAST HEARTBEAT"),
    ]);
    for agent in agents {
        table.row(vec![
            agent.id.to_string(),
            agent.name.clone(),
            agent.group.clone().unwrap_or_else(|| "-".to_string()),
            agent.status.to_string(),
            agent.active_assignments.to_string(),
            crate::output::format_time_ago(agent.last_heartbeat_ms),
        ]);
    }
    table.render(out);
}

fn print_agent_detail(agent: &Agent) {
    println!("{} {}", crate::color::header("Agent:"), crate::color::muted(agent.id.as_str()));
    println!("{} {}", crate::color::context("Name:    "), agent.name);
    println!(
        "{} {}",
        crate::color::context("Group:   "),
        agent.group.as_deref().unwrap_or("-")
    );
    println!("{} {}", crate::color::context("Status:  "), agent.status);
    println!("{} {}", crate::color::context("Tags:    "), agent.tags.join(", "));
    println!(
        "{} {}",
        crate::color::context("Capabilities:"),
        agent.capabilities.iter().map(|c| format!("{}@{}", c.name, c.version)).collect::<Vec<_>>().join(", ")
    );
    println!("{} {}", crate::color::context("Active jobs:"), agent.active_assignments);
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
