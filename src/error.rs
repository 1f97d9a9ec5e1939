use serde::Serialize;
use thiserror::Error;

use crate::host::HostError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Settings persistence failed: {0}")]
    Persistence(String),

    #[error("Interaction '{0}' already has an outstanding request")]
    InteractionBusy(String),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    /// Wrap an `anyhow` chain from the settings layer as a persistence failure.
    pub fn persistence(err: anyhow::Error) -> Self {
        CoordinatorError::Persistence(format!("{:#}", err))
    }
}

// Hosts render errors as plain strings
impl Serialize for CoordinatorError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
