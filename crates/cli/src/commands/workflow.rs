// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmesh workflow` — definitions and instance control.

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use crate::table::{Column, Table};
use clap::{Args, Subcommand};
use orbitmesh_core::{InstanceId, WorkflowDefinition, WorkflowId, WorkflowInstance};
use orbitmesh_wire::{Request, Response};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Args)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommand,
}

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Register a workflow definition from a YAML or JSON file
    Define { file: PathBuf },
    /// Show a registered definition
    Get { workflow_id: String },
    /// Delete a registered definition
    Delete { workflow_id: String },
    /// List registered definitions
    List {},
    /// Start a new instance of a workflow
    Start {
        workflow_id: String,
        /// Input variables as `key=json_value`, repeatable
        #[arg(long = "input")]
        inputs: Vec<String>,
    },
    /// Show one workflow instance
    InstanceGet { instance_id: String },
    /// Cancel a running instance
    InstanceCancel {
        instance_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Send an event signal to a waiting instance
    Signal {
        instance_id: String,
        event_type: String,
        #[arg(long)]
        correlation_key: Option<String>,
        /// JSON payload, defaults to `null`
        #[arg(long)]
        payload: Option<String>,
    },
}

pub async fn handle(command: WorkflowCommand, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        WorkflowCommand::Define { file } => {
            let definition = load_definition(&file)?;
            client.send_ok(&Request::WorkflowDefine { definition: definition.clone() }).await?;
            println!("Workflow {} registered (version {})", definition.id, definition.version);
            Ok(())
        }
        WorkflowCommand::Get { workflow_id } => {
            let response = client.send(&Request::WorkflowGet { workflow_id: WorkflowId::from_string(&workflow_id) }).await?;
            let Response::WorkflowDefinition { definition } = response else {
                return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
            };
            let definition = definition.ok_or_else(|| ExitError::new(1, "workflow not found"))?;
            format_or_json(format, &definition, || print_definition_detail(&definition))
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        WorkflowCommand::Delete { workflow_id } => {
            client.send_ok(&Request::WorkflowDelete { workflow_id: WorkflowId::from_string(&workflow_id) }).await?;
            println!("Workflow {workflow_id} deleted");
            Ok(())
        }
        WorkflowCommand::List {} => {
            let response = client.send(&Request::WorkflowsList).await?;
            let Response::WorkflowDefinitions { definitions } = response else {
                return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
            };
            handle_list(format, &definitions, "No workflows registered", render_definition_table)
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        WorkflowCommand::Start { workflow_id, inputs } => {
            let input = parse_inputs(&inputs)?;
            let response = client.send(&Request::WorkflowStart { workflow_id: WorkflowId::from_string(&workflow_id), input }).await?;
            let instance = instance_from_response(response)?;
            println!("Instance {} started", instance.id);
            Ok(())
        }
        WorkflowCommand::InstanceGet { instance_id } => {
            let response = client.send(&Request::WorkflowInstanceGet { instance_id: InstanceId::from_string(&instance_id) }).await?;
            let instance = instance_from_response(response)?;
            format_or_json(format, &instance, || print_instance_detail(&instance))
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        WorkflowCommand::InstanceCancel { instance_id, reason } => {
            client
                .send_ok(&Request::WorkflowInstanceCancel { instance_id: InstanceId::from_string(&instance_id), reason })
                .await?;
            println!("Instance {instance_id} cancelled");
            Ok(())
        }
        WorkflowCommand::Signal { instance_id, event_type, correlation_key, payload } => {
            let payload = match payload {
                Some(raw) => serde_json::from_str(&raw).map_err(|err| ExitError::new(1, format!("invalid --payload JSON: {err}")))?,
                None => serde_json::Value::Null,
            };
            client
                .send_ok(&Request::WorkflowInstanceSignal {
                    instance_id: InstanceId::from_string(&instance_id),
                    event_type,
                    correlation_key,
                    payload,
                })
                .await?;
            println!("Signal delivered to instance {instance_id}");
            Ok(())
        }
    }
}

fn load_definition(path: &PathBuf) -> Result<WorkflowDefinition, ExitError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| ExitError::new(1, format!("reading {}: {err}", path.display())))?;
    serde_yaml::from_str(&contents).map_err(|err| ExitError::new(1, format!("parsing {}: {err}", path.display())))
}

fn parse_inputs(inputs: &[String]) -> Result<HashMap<String, serde_json::Value>, ExitError> {
    let mut map = HashMap::new();
    for spec in inputs {
        let (key, raw_value) = spec
            .split_once('=')
            .ok_or_else(|| ExitError::new(1, format!("invalid --input {spec:?}, expected key=value")))?;
        let value: serde_json::Value =
            serde_json::from_str(raw_value).unwrap_or_else(|_| serde_json::Value::String(raw_value.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn instance_from_response(response: Response) -> Result<WorkflowInstance, ExitError> {
    match response {
        Response::WorkflowInstance { instance: Some(instance) } => Ok(*instance),
        Response::WorkflowInstance { instance: None } => Err(ExitError::new(1, "instance not found")),
        other => Err(DaemonClient::reject::<()>(other).unwrap_err().into()),
    }
}

fn render_definition_table(definitions: &[WorkflowDefinition], out: &mut dyn std::io::Write) {
    let mut table = Table::new(vec![
        Column::muted("ID"),
        Column::left("VERSION"),
        Column::left("STEPS"),
        Column::left("TRIGGERS"),
    ]);
    for def in definitions {
        table.row(vec![
            def.id.to_string(),
            def.version.to_string(),
            def.steps.len().to_string(),
            def.triggers.len().to_string(),
        ]);
    }
    table.render(out);
}

fn print_definition_detail(def: &WorkflowDefinition) {
    println!("{} {}", crate::color::header("Workflow:"), crate::color::muted(def.id.as_str()));
    println!("{} {}", crate::color::context("Version:"), def.version);
    println!("{} {}", crate::color::context("Steps:  "), def.steps.len());
    println!("{} {}", crate::color::context("Triggers:"), def.triggers.len());
}

fn print_instance_detail(instance: &WorkflowInstance) {
    println!("{} {}", crate::color::header("Instance:"), crate::color::muted(instance.id.as_str()));
    println!("{} {}", crate::color::context("Workflow:"), instance.workflow_id);
    println!("{} {}", crate::color::context("Status:  "), instance.status);
    println!("{} {}", crate::color::context("Started: "), format_time_ago(instance.started_at_ms));
    println!("{} {}", crate::color::context("Steps:   "), instance.step_instances.len());
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
