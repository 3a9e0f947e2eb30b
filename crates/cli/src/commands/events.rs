// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orbitmesh events` — tail the event bus over the admin socket's
//! long-lived subscription connection.

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use clap::Args;

#[derive(Args)]
pub struct EventsArgs {
    /// Only receive events on this topic (e.g. "job:", "agent:")
    #[arg(long)]
    pub topic: Option<String>,
}

pub async fn handle(args: EventsArgs, client: &DaemonClient, format: OutputFormat) -> Result<(), ExitError> {
    let mut stream = client.subscribe(args.topic).await?;
    while let Some(event) = stream.next().await? {
        match format {
            OutputFormat::Json => {
                let line = serde_json::to_string(&event).map_err(|err| ExitError::new(1, err.to_string()))?;
                println!("{line}");
            }
            OutputFormat::Text => println!("{event:?}"),
        }
    }
    Ok(())
}
