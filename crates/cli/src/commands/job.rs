// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmesh job` — submission, lifecycle control, and listing.

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use crate::table::{Column, Table};
use clap::{Args, Subcommand};
use orbitmesh_core::{AgentId, IdempotencyKey, Job, JobId, JobRequest};
use orbitmesh_wire::{Request, Response};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Submit a new job
    Submit {
        command: String,
        #[arg(long)]
        pattern: Option<String>,
        /// Required agent capability, e.g. `gpu@2`. Repeatable.
        #[arg(long = "requires")]
        required_capabilities: Vec<String>,
        #[arg(long, default_value_t = 5)]
        priority: u8,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        target_agent: Option<String>,
        #[arg(long)]
        max_retries: Option<u32>,
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Show one job
    Get { job_id: String },
    /// Cancel a job
    Cancel {
        job_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Retry a terminally-failed or timed-out job
    Retry { job_id: String },
    /// List jobs
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        agent_id: Option<String>,
        #[arg(long)]
        command: Option<String>,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
}

pub async fn handle(command: JobCommand, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        JobCommand::Submit {
            command,
            pattern,
            required_capabilities,
            priority,
            timeout_ms,
            target_agent,
            max_retries,
            idempotency_key,
        } => {
            let request = JobRequest {
                command,
                pattern,
                required_capabilities,
                priority,
                timeout_ms,
                target_agent_id: target_agent.map(|id| AgentId::from_string(&id)),
                payload: Vec::new(),
                idempotency_key: idempotency_key.map(IdempotencyKey),
                max_retries: max_retries.unwrap_or(0),
            };
            let response = client.send(&Request::JobSubmit { request }).await?;
            let job = job_from_response(response)?;
            format_or_json(format, &job, || print_job_detail(&job)).map_err(|err| ExitError::new(1, err.to_string()))
        }
        JobCommand::Get { job_id } => {
            let response = client.send(&Request::JobGet { job_id: JobId::from_string(&job_id) }).await?;
            let job = job_from_response(response)?;
            format_or_json(format, &job, || print_job_detail(&job)).map_err(|err| ExitError::new(1, err.to_string()))
        }
        JobCommand::Cancel { job_id, reason } => {
            let response = client.send(&Request::JobCancel { job_id: JobId::from_string(&job_id), reason }).await?;
            let job = job_from_response(response)?;
            println!("Job {} cancelled", job.id);
            Ok(())
        }
        JobCommand::Retry { job_id } => {
            let response = client.send(&Request::JobRetry { job_id: JobId::from_string(&job_id) }).await?;
            let job = job_from_response(response)?;
            println!("Job {} retried (attempt {})", job.id, job.retry_count);
            Ok(())
        }
        JobCommand::List { status, agent_id, command, page_size, page } => {
            let response = client
                .send(&Request::JobsList {
                    status,
                    agent_id: agent_id.map(|id| AgentId::from_string(&id)),
                    command,
                    page_size,
                    page,
                })
                .await?;
            let Response::Jobs { jobs, total, page, page_size } = response else {
                return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
            };
            handle_list(format, &jobs, "No jobs found", |jobs, out| render_job_table(jobs, out))
                .map_err(|err| ExitError::new(1, err.to_string()))?;
            if format == OutputFormat::Text && !jobs.is_empty() {
                println!("\npage {page} ({page_size}/page), {total} total");
            }
            Ok(())
        }
    }
}

fn job_from_response(response: Response) -> Result<Job, ExitError> {
    match response {
        Response::Job { job: Some(job) } => Ok(*job),
        Response::Job { job: None } => Err(ExitError::new(1, "job not found")),
        other => Err(DaemonClient::reject::<()>(other).unwrap_err().into()),
    }
}

fn render_job_table(jobs: &[Job], out: &mut dyn std::io::Write) {
    let mut table = Table::new(vec![
        Column::muted("ID"),
        Column::left("COMMAND").with_max(30),
        Column::left("STATUS"),
        Column::left("AGENT").with_max(12),
        Column::left("RETRIES"),
        Column::left("CREATED"),
    ]);
    for job in jobs {
        table.row(vec![
            job.id.to_string(),
            job.command.clone(),
            job.status.to_string(),
            job.assigned_agent_id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            job.retry_count.to_string(),
            format_time_ago(job.created_at_ms),
        ]);
    }
    table.render(out);
}

fn print_job_detail(job: &Job) {
    println!("{} {}", crate::color::header("Job:"), crate::color::muted(job.id.as_str()));
    println!("{} {}", crate::color::context("Command: "), job.command);
    println!("{} {}", crate::color::context("Status:  "), job.status);
    if let Some(ref agent_id) = job.assigned_agent_id {
        println!("{} {}", crate::color::context("Agent:   "), agent_id);
    }
    println!("{} {}", crate::color::context("Priority:"), job.priority);
    println!("{} {}/{}", crate::color::context("Retries: "), job.retry_count, job.max_retries);
    if let Some(ref error) = job.error {
        println!("{} {} ({})", crate::color::context("Error:   "), error.message, error.code);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
