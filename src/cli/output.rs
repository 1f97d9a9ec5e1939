//! CLI output handling - Event receiver loop.
//!
//! Receives [`HostEvent`]s from the CLI host and renders them as plain text
//! or JSON lines.

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::host::HostEvent;

/// Run the event loop until every sender is gone.
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<HostEvent>,
    json_mode: bool,
) -> Result<()> {
    while let Some(event) = event_rx.recv().await {
        if json_mode {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{}", render(&event));
        }
        io::stdout().flush()?;
    }

    Ok(())
}

/// Human-readable line for an event.
pub fn render(event: &HostEvent) -> String {
    match event {
        HostEvent::PageShown { wallet, page } => format!("[{}] page: {}", wallet, page),
        HostEvent::Navigated { wallet, page } => format!("[{}] navigated to {}", wallet, page),
        HostEvent::LoadStarted { wallet, generation } => {
            format!("[{}] loading (#{})", wallet, generation)
        }
        HostEvent::LoadFinished { wallet, generation } => {
            format!("[{}] load #{} finished", wallet, generation)
        }
        HostEvent::SettingSettled { setting, outcome } => {
            format!("[settings] {}: {:?}", setting, outcome)
        }
    }
}
