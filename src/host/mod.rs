//! External collaborators of the coordinators.
//!
//! Coordinators never reach for global services. Everything that renders a
//! page, starts a wallet load or asks the user a question is injected as one
//! of the traits below:
//!
//! - [`PageHost`]: displays session pages and brings them to the front
//! - [`SessionLoader`]: starts loading a wallet for a given load generation
//! - [`DialogHost`]: request/response interaction with the user
//!
//! # Object Safety
//! All traits are object-safe and intended to be used as `Arc<dyn Trait>`.
//! `DialogHost::ask()` uses `#[async_trait]`, which boxes the future. This is
//! acceptable since dialogs are infrequent and user-bound.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coinjoin::CoinJoinProfile;
use crate::session::{LoadGeneration, SessionPage};

pub mod channel;
#[cfg(feature = "cli")]
pub mod cli;

pub use channel::{ChannelDialogHost, PendingDialog};
#[cfg(feature = "cli")]
pub use cli::{CliHost, HostEvent};

/// Host-specific errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Not running in interactive mode (no TTY)")]
    NotInteractive,

    #[error("Dialog request {0} was abandoned by the host")]
    Abandoned(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Displays session pages.
pub trait PageHost: Send + Sync + 'static {
    /// Entry action of `page`; called exactly once per transition.
    fn show(&self, wallet: &str, page: SessionPage);

    /// Bring `page` to the front (the wallet is focused).
    fn navigate(&self, wallet: &str, page: SessionPage);
}

/// Starts wallet loads. Completion is reported by firing the coordinator's
/// load-completed signal with the same generation.
pub trait SessionLoader: Send + Sync + 'static {
    fn begin_load(&self, wallet: &str, generation: LoadGeneration);
}

/// Question put to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogRequest {
    /// Yes/no confirmation
    Confirm { prompt: String },

    /// Pick a coinjoin profile
    SelectCoinJoinProfile { current: Option<CoinJoinProfile> },
}

/// Answer to a [`DialogRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DialogResponse {
    Confirmed(bool),
    ProfileSelected(CoinJoinProfile),
    /// The user closed the dialog without answering
    Dismissed,
}

/// Request/response interaction with the user.
#[async_trait]
pub trait DialogHost: Send + Sync + 'static {
    /// Present `request` and wait for the user's answer.
    ///
    /// # Errors
    /// - `HostError::NotInteractive` if no user can answer
    /// - `HostError::Abandoned` if the host dropped the request
    async fn ask(
        &self,
        request_id: String,
        request: DialogRequest,
    ) -> Result<DialogResponse, HostError>;

    /// Check if a user can answer dialogs at all
    fn is_interactive(&self) -> bool;
}
