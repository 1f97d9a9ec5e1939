//! Single-flight wrapper around a [`DialogHost`].
//!
//! Each coordinator interaction (profile selection, setting confirmation)
//! owns one `InteractionChannel`. While a request is outstanding, further
//! asks on the same channel fail with [`CoordinatorError::InteractionBusy`]
//! instead of stacking dialogs.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{CoordinatorError, Result};
use crate::host::{DialogHost, DialogRequest, DialogResponse};

pub struct InteractionChannel {
    name: String,
    host: Arc<dyn DialogHost>,
    in_flight: Mutex<()>,
}

impl InteractionChannel {
    pub fn new(name: impl Into<String>, host: Arc<dyn DialogHost>) -> Self {
        Self {
            name: name.into(),
            host,
            in_flight: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while a request is waiting for an answer.
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Ask the host and wait for the answer.
    pub async fn ask(&self, request: DialogRequest) -> Result<DialogResponse> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!(channel = %self.name, "Rejecting concurrent interaction request");
            return Err(CoordinatorError::InteractionBusy(self.name.clone()));
        };

        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(channel = %self.name, %request_id, "Asking dialog host");
        let response = self.host.ask(request_id.clone(), request).await?;
        tracing::debug!(channel = %self.name, %request_id, ?response, "Dialog answered");
        Ok(response)
    }
}

impl std::fmt::Debug for InteractionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionChannel")
            .field("name", &self.name)
            .field("busy", &self.is_busy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ChannelDialogHost, HostError};
    use crate::test_support::ScriptedDialogs;

    fn confirm(prompt: &str) -> DialogRequest {
        DialogRequest::Confirm {
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn forwards_request_and_returns_answer() {
        let dialogs = ScriptedDialogs::with_responses([DialogResponse::Confirmed(true)]);
        let channel = InteractionChannel::new("confirm", dialogs.clone());

        let response = channel.ask(confirm("Enable?")).await.unwrap();

        assert_eq!(response, DialogResponse::Confirmed(true));
        assert_eq!(dialogs.requests(), vec![confirm("Enable?")]);
        assert!(!channel.is_busy());
    }

    #[tokio::test]
    async fn second_ask_while_outstanding_is_rejected() {
        let (host, mut presented) = ChannelDialogHost::new();
        let host = Arc::new(host);
        let channel = Arc::new(InteractionChannel::new("profile", host.clone()));

        let first = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.ask(confirm("first")).await })
        };
        let pending = presented.recv().await.unwrap();
        assert!(channel.is_busy());

        let second = channel.ask(confirm("second")).await;
        assert!(matches!(
            second,
            Err(CoordinatorError::InteractionBusy(name)) if name == "profile"
        ));

        host.respond(&pending.request_id, DialogResponse::Dismissed);
        assert_eq!(first.await.unwrap().unwrap(), DialogResponse::Dismissed);

        // Channel is free again once the first request is answered
        assert!(!channel.is_busy());
    }

    #[tokio::test]
    async fn host_failure_maps_to_host_error() {
        let (host, presented) = ChannelDialogHost::new();
        drop(presented);
        let channel = InteractionChannel::new("confirm", Arc::new(host));

        let result = channel.ask(confirm("anyone?")).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::Host(HostError::NotInteractive))
        ));
    }
}
