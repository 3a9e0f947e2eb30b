// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmesh decision` — human-in-the-loop approvals raised by `Approval`
//! workflow steps.

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use crate::table::{Column, Table};
use clap::{Args, Subcommand};
use orbitmesh_core::{Decision, DecisionId};
use orbitmesh_wire::{Request, Response};
use std::io::{BufRead, IsTerminal, Write};

#[derive(Args)]
pub struct DecisionArgs {
    #[command(subcommand)]
    pub command: DecisionCommand,
}

#[derive(Subcommand)]
pub enum DecisionCommand {
    /// List unresolved decisions
    List {},
    /// Show one decision
    Show { decision_id: String },
    /// Resolve a pending decision by choosing one of its options
    Resolve {
        decision_id: String,
        /// Label of the chosen option, exactly as shown by `decision show`
        chosen_label: String,
    },
    /// Interactively resolve every pending decision, one at a time
    Review {},
}

pub async fn handle(command: DecisionCommand, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        DecisionCommand::List {} => {
            let response = client.send(&Request::DecisionsList).await?;
            let Response::Decisions { decisions } = response else {
                return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
            };
            handle_list(format, &decisions, "No pending decisions", render_decision_table)
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        DecisionCommand::Show { decision_id } => {
            let decision = get_decision(client, decision_id).await?;
            format_or_json(format, &decision, || print_decision_detail(&mut std::io::stdout(), &decision, true))
                .map_err(|err| ExitError::new(1, err.to_string()))
        }
        DecisionCommand::Resolve { decision_id, chosen_label } => {
            client
                .send_ok(&Request::DecisionResolve {
                    decision_id: DecisionId::from_string(&decision_id),
                    chosen_label: chosen_label.clone(),
                })
                .await?;
            println!("Resolved decision {decision_id} -> {chosen_label}");
            Ok(())
        }
        DecisionCommand::Review {} => review(client, format).await,
    }
}

async fn get_decision(client: &DaemonClient, decision_id: String) -> Result<Decision, ExitError> {
    let response = client.send(&Request::DecisionGet { decision_id: DecisionId::from_string(&decision_id) }).await?;
    match response {
        Response::Decision { decision: Some(decision) } => Ok(*decision),
        Response::Decision { decision: None } => Err(ExitError::new(1, "decision not found")),
        other => Err(DaemonClient::reject::<()>(other).unwrap_err().into()),
    }
}

async fn review(client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    if !std::io::stdin().is_terminal() {
        return Err(ExitError::new(1, "review requires an interactive terminal"));
    }
    if format == OutputFormat::Json {
        return Err(ExitError::new(1, "review does not support --output json"));
    }

    let response = client.send(&Request::DecisionsList).await?;
    let Response::Decisions { decisions } = response else {
        return Err(DaemonClient::reject::<()>(response).unwrap_err().into());
    };
    if decisions.is_empty() {
        println!("No pending decisions");
        return Ok(());
    }

    let total = decisions.len();
    println!("{} pending decision{}", total, if total == 1 { "" } else { "s" });
    println!();

    let mut resolved = 0usize;
    let mut skipped = 0usize;
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    for (i, summary) in decisions.iter().enumerate() {
        println!("[{}/{}]", i + 1, total);
        print_decision_detail(&mut std::io::stdout(), summary, false);

        eprint!("Choose [1-{}=pick, s=skip, q=quit]: ", summary.options.len());
        std::io::stderr().flush().ok();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };

        match parse_review_input(&line, summary.options.len()) {
            ReviewAction::Pick(n) => {
                let label = summary.options[n - 1].label.clone();
                match client
                    .send_ok(&Request::DecisionResolve { decision_id: summary.id.clone(), chosen_label: label.clone() })
                    .await
                {
                    Ok(()) => {
                        println!("  Resolved {} -> {}", summary.id, label);
                        resolved += 1;
                    }
                    Err(err) => {
                        eprintln!("  error: {err}");
                        skipped += 1;
                    }
                }
            }
            ReviewAction::Skip => skipped += 1,
            ReviewAction::Quit => {
                skipped += total - i - resolved;
                break;
            }
            ReviewAction::Invalid => {
                eprintln!("  invalid input, skipping");
                skipped += 1;
            }
        }
        println!();
    }

    println!("Done. {resolved} resolved, {skipped} skipped.");
    Ok(())
}

#[derive(Debug, PartialEq)]
pub(crate) enum ReviewAction {
    Pick(usize),
    Skip,
    Quit,
    Invalid,
}

pub(crate) fn parse_review_input(input: &str, option_count: usize) -> ReviewAction {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("s") {
        return ReviewAction::Skip;
    }
    if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("x") {
        return ReviewAction::Quit;
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n >= 1 && n <= option_count => ReviewAction::Pick(n),
        _ => ReviewAction::Invalid,
    }
}

fn render_decision_table(decisions: &[Decision], out: &mut dyn std::io::Write) {
    let mut table = Table::new(vec![
        Column::muted("ID"),
        Column::left("PROMPT").with_max(50),
        Column::left("OPTIONS"),
        Column::left("AGE"),
    ]);
    for decision in decisions {
        table.row(vec![
            decision.id.to_string(),
            decision.prompt.clone(),
            decision.options.len().to_string(),
            format_time_ago(decision.created_at_ms),
        ]);
    }
    table.render(out);
}

pub(crate) fn print_decision_detail(out: &mut impl Write, decision: &Decision, show_resolve_hint: bool) {
    let _ = writeln!(out, "{} {}", crate::color::header("Decision:"), crate::color::muted(decision.id.as_str()));
    let _ = writeln!(out, "{} {}", crate::color::context("Age:    "), format_time_ago(decision.created_at_ms));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", crate::color::header("Prompt:"));
    for line in decision.prompt.lines() {
        let _ = writeln!(out, "  {line}");
    }

    if decision.resolved_at_ms.is_some() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} resolved", crate::color::context("Status:"));
        if let Some(ref label) = decision.chosen_label {
            let _ = writeln!(out, "{} {}", crate::color::context("Chosen:"), label);
        }
        return;
    }

    if !decision.options.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", crate::color::header("Options:"));
        for (i, option) in decision.options.iter().enumerate() {
            let _ = write!(out, "  {}. {}", i + 1, option.label);
            if let Some(ref description) = option.description {
                let _ = write!(out, " - {description}");
            }
            let _ = writeln!(out);
        }
        if show_resolve_hint {
            let _ = writeln!(out);
            let _ = writeln!(out, "Use: orbitmesh decision resolve {} <label>", decision.id);
        }
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
