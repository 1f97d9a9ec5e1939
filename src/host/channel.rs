//! Channel-backed dialog host.
//!
//! Requests are pushed to an unbounded channel consumed by whatever presents
//! dialogs (a GUI shell, a test). The presenter answers with
//! [`ChannelDialogHost::respond`], which completes the waiting `ask`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::{DialogHost, DialogRequest, DialogResponse, HostError};

/// A dialog waiting to be presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDialog {
    pub request_id: String,
    pub request: DialogRequest,
}

type PendingMap = Arc<RwLock<HashMap<String, oneshot::Sender<DialogResponse>>>>;

pub struct ChannelDialogHost {
    request_tx: mpsc::UnboundedSender<PendingDialog>,
    pending: PendingMap,
}

/// Removes a request's pending entry when its `ask` future completes or is
/// dropped.
struct PendingGuard {
    pending: PendingMap,
    request_id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.pending.write().remove(&self.request_id).is_some() {
            tracing::debug!("Dialog {} abandoned before an answer", self.request_id);
        }
    }
}

impl ChannelDialogHost {
    /// Create the host and the receiver the presenter reads requests from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingDialog>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        (
            Self {
                request_tx,
                pending: Arc::new(RwLock::new(HashMap::new())),
            },
            request_rx,
        )
    }

    /// Called by the presenter when the user answers.
    ///
    /// Returns `false` if no request with that id is waiting.
    pub fn respond(&self, request_id: &str, response: DialogResponse) -> bool {
        match self.pending.write().remove(request_id) {
            // Ignore send errors - the asking side may have been dropped
            Some(tx) => {
                let _ = tx.send(response);
                true
            }
            None => {
                tracing::warn!("No pending dialog found for request_id: {}", request_id);
                false
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }
}

#[async_trait]
impl DialogHost for ChannelDialogHost {
    async fn ask(
        &self,
        request_id: String,
        request: DialogRequest,
    ) -> Result<DialogResponse, HostError> {
        let (tx, rx) = oneshot::channel();
        self.pending.write().insert(request_id.clone(), tx);
        let _guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            request_id: request_id.clone(),
        };

        let dialog = PendingDialog {
            request_id: request_id.clone(),
            request,
        };
        if self.request_tx.send(dialog).is_err() {
            return Err(HostError::NotInteractive);
        }

        rx.await.map_err(|_| HostError::Abandoned(request_id))
    }

    fn is_interactive(&self) -> bool {
        !self.request_tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ask_completes_when_presenter_responds() {
        let (host, mut requests) = ChannelDialogHost::new();
        let host = Arc::new(host);

        let asker = {
            let host = host.clone();
            tokio::spawn(async move {
                host.ask(
                    "req-1".to_string(),
                    DialogRequest::Confirm {
                        prompt: "Sure?".to_string(),
                    },
                )
                .await
            })
        };

        let pending = requests.recv().await.unwrap();
        assert_eq!(pending.request_id, "req-1");
        assert_eq!(host.pending_count(), 1);
        assert!(host.respond(&pending.request_id, DialogResponse::Confirmed(true)));

        let response = asker.await.unwrap().unwrap();
        assert_eq!(response, DialogResponse::Confirmed(true));
        assert_eq!(host.pending_count(), 0);
    }

    #[tokio::test]
    async fn ask_fails_without_presenter() {
        let (host, requests) = ChannelDialogHost::new();
        drop(requests);

        assert!(!host.is_interactive());
        let result = host
            .ask(
                "req-2".to_string(),
                DialogRequest::Confirm {
                    prompt: "Anyone?".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(HostError::NotInteractive)));
        assert_eq!(host.pending_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_ask_releases_its_request() {
        let (host, mut requests) = ChannelDialogHost::new();
        let host = Arc::new(host);

        let asker = {
            let host = host.clone();
            tokio::spawn(async move {
                host.ask(
                    "req-3".to_string(),
                    DialogRequest::Confirm {
                        prompt: "Still there?".to_string(),
                    },
                )
                .await
            })
        };

        let pending = requests.recv().await.unwrap();
        assert_eq!(host.pending_count(), 1);

        asker.abort();
        assert!(asker.await.unwrap_err().is_cancelled());

        assert_eq!(host.pending_count(), 0);
        assert!(!host.respond(&pending.request_id, DialogResponse::Dismissed));
    }

    #[test]
    fn respond_to_unknown_request_is_rejected() {
        let (host, _requests) = ChannelDialogHost::new();
        assert!(!host.respond("missing", DialogResponse::Dismissed));
    }
}
