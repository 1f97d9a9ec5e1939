//! Terminal host used by `wallet-coordinator-cli`.
//!
//! Page and load activity is emitted as [`HostEvent`]s on a channel drained by
//! the CLI output loop. Dialogs are answered on stdin, or automatically with
//! `--auto-confirm`.

use std::io::{self, Write};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::coinjoin::CoinJoinProfile;
use crate::pipeline::CommitOutcome;
use crate::session::{LoadGeneration, SessionPage};
use crate::signal::Signal;

use super::{DialogHost, DialogRequest, DialogResponse, HostError, PageHost, SessionLoader};

/// Activity reported to the CLI output loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    PageShown {
        wallet: String,
        page: SessionPage,
    },
    Navigated {
        wallet: String,
        page: SessionPage,
    },
    LoadStarted {
        wallet: String,
        generation: u64,
    },
    LoadFinished {
        wallet: String,
        generation: u64,
    },
    SettingSettled {
        setting: String,
        outcome: CommitOutcome,
    },
}

pub struct CliHost {
    event_tx: RwLock<mpsc::UnboundedSender<HostEvent>>,
    load_completed: Signal<LoadGeneration>,
    /// `None` leaves completion to the `loaded` command
    load_delay: Option<Duration>,
    auto_confirm: bool,
}

impl CliHost {
    pub fn new(
        event_tx: mpsc::UnboundedSender<HostEvent>,
        load_delay: Duration,
        auto_confirm: bool,
    ) -> Self {
        Self {
            event_tx: RwLock::new(event_tx),
            load_completed: Signal::trigger(),
            load_delay: (!load_delay.is_zero()).then_some(load_delay),
            auto_confirm,
        }
    }

    /// Signal fired when a simulated load finishes.
    pub fn load_completed(&self) -> &Signal<LoadGeneration> {
        &self.load_completed
    }

    pub fn emit(&self, event: HostEvent) {
        // Output loop may already be gone during shutdown
        if self.event_tx.read().send(event).is_err() {
            tracing::debug!("Host event dropped, output loop closed");
        }
    }

    /// Drop the live sender so the output loop drains and exits.
    pub fn close(&self) {
        let (closed_tx, _) = mpsc::unbounded_channel();
        *self.event_tx.write() = closed_tx;
    }

    fn auto_answer(request: &DialogRequest) -> DialogResponse {
        match request {
            DialogRequest::Confirm { .. } => DialogResponse::Confirmed(true),
            DialogRequest::SelectCoinJoinProfile { current } => {
                DialogResponse::ProfileSelected(current.unwrap_or(CoinJoinProfile::Economical))
            }
        }
    }
}

/// Map a line typed at a dialog prompt to a response.
pub fn parse_answer(request: &DialogRequest, input: &str) -> DialogResponse {
    let input = input.trim().to_lowercase();
    match request {
        DialogRequest::Confirm { .. } => match input.as_str() {
            "y" | "yes" => DialogResponse::Confirmed(true),
            "n" | "no" => DialogResponse::Confirmed(false),
            _ => DialogResponse::Dismissed,
        },
        DialogRequest::SelectCoinJoinProfile { .. } => {
            let by_index = input
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| CoinJoinProfile::ALL.get(i).copied());
            match by_index.or_else(|| CoinJoinProfile::from_id(&input)) {
                Some(profile) => DialogResponse::ProfileSelected(profile),
                None => DialogResponse::Dismissed,
            }
        }
    }
}

fn prompt_text(request: &DialogRequest) -> String {
    match request {
        DialogRequest::Confirm { prompt } => format!("\n{}\n(y)es / (n)o: ", prompt),
        DialogRequest::SelectCoinJoinProfile { current } => {
            let mut text = String::from("\nSelect a coinjoin profile");
            if let Some(current) = current {
                text.push_str(&format!(" (current: {})", current));
            }
            text.push('\n');
            for (i, profile) in CoinJoinProfile::ALL.iter().enumerate() {
                text.push_str(&format!("  {}) {}\n", i + 1, profile));
            }
            text.push_str("number, or empty to cancel: ");
            text
        }
    }
}

impl PageHost for CliHost {
    fn show(&self, wallet: &str, page: SessionPage) {
        self.emit(HostEvent::PageShown {
            wallet: wallet.to_string(),
            page,
        });
    }

    fn navigate(&self, wallet: &str, page: SessionPage) {
        self.emit(HostEvent::Navigated {
            wallet: wallet.to_string(),
            page,
        });
    }
}

impl SessionLoader for CliHost {
    fn begin_load(&self, wallet: &str, generation: LoadGeneration) {
        self.emit(HostEvent::LoadStarted {
            wallet: wallet.to_string(),
            generation: generation.0,
        });

        let Some(delay) = self.load_delay else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, wallet load will not complete on its own");
            return;
        };

        let completed = self.load_completed.clone();
        let event_tx = self.event_tx.read().clone();
        let wallet = wallet.to_string();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(HostEvent::LoadFinished {
                wallet,
                generation: generation.0,
            });
            completed.fire(generation);
        });
    }
}

#[async_trait]
impl DialogHost for CliHost {
    async fn ask(
        &self,
        _request_id: String,
        request: DialogRequest,
    ) -> Result<DialogResponse, HostError> {
        if self.auto_confirm {
            let response = Self::auto_answer(&request);
            eprintln!("[auto-confirmed] {:?}", response);
            return Ok(response);
        }

        if !atty::is(atty::Stream::Stdin) {
            return Err(HostError::NotInteractive);
        }

        let text = prompt_text(&request);
        let input = tokio::task::spawn_blocking(move || -> io::Result<String> {
            eprint!("{}", text);
            io::stderr().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input)
        })
        .await
        .map_err(|e| HostError::Other(e.to_string()))??;

        Ok(parse_answer(&request, &input))
    }

    fn is_interactive(&self) -> bool {
        self.auto_confirm || atty::is(atty::Stream::Stdin)
    }
}
