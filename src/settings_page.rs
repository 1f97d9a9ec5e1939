//! Settings page coordinator: confirmation prompts for sensitive settings.

use std::sync::Arc;

use crate::error::Result;
use crate::host::{DialogHost, DialogRequest, DialogResponse};
use crate::interaction::InteractionChannel;

pub struct SettingsPageCoordinator {
    confirmations: InteractionChannel,
}

impl SettingsPageCoordinator {
    pub fn new(dialogs: Arc<dyn DialogHost>) -> Self {
        Self {
            confirmations: InteractionChannel::new("confirm_setting", dialogs),
        }
    }

    /// Ask the user to confirm a setting change. Dismissing the dialog counts
    /// as a refusal.
    pub async fn confirm_setting(&self, prompt: impl Into<String>) -> Result<bool> {
        let response = self
            .confirmations
            .ask(DialogRequest::Confirm {
                prompt: prompt.into(),
            })
            .await?;

        Ok(match response {
            DialogResponse::Confirmed(answer) => answer,
            DialogResponse::Dismissed => false,
            other => {
                tracing::warn!(response = ?other, "Unexpected answer to confirmation");
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedDialogs;

    #[tokio::test]
    async fn answers_map_to_bool() {
        let dialogs = ScriptedDialogs::with_responses([
            DialogResponse::Confirmed(true),
            DialogResponse::Confirmed(false),
            DialogResponse::Dismissed,
        ]);
        let page = SettingsPageCoordinator::new(dialogs.clone());

        assert!(page.confirm_setting("Enable Tor?").await.unwrap());
        assert!(!page.confirm_setting("Enable Tor?").await.unwrap());
        assert!(!page.confirm_setting("Enable Tor?").await.unwrap());
        assert_eq!(dialogs.requests().len(), 3);
    }
}
