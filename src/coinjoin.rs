//! Coinjoin settings coordinator.
//!
//! Exposes the coinjoin preferences of one wallet as signals the UI binds to.
//! Free-form edits of the anonymity score target and the pleb-stop threshold
//! are debounced into the settings file by two [`CommitPipeline`]s; the
//! auto-coinjoin toggle and profile selection are explicit commands that may
//! ask the user through an [`InteractionChannel`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::{CoordinatorError, Result};
use crate::host::{DialogHost, DialogRequest, DialogResponse};
use crate::interaction::InteractionChannel;
use crate::pipeline::{CommitPipeline, PipelineHandle};
use crate::settings::schema::ANON_SCORE_TARGET_RANGE;
use crate::settings::{SettingField, SettingStore, SettingsManager};
use crate::signal::Signal;

/// Preset coinjoin strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinJoinProfile {
    Speedy,
    Economical,
    PrivacyFocused,
}

impl CoinJoinProfile {
    pub const ALL: [CoinJoinProfile; 3] = [
        CoinJoinProfile::Speedy,
        CoinJoinProfile::Economical,
        CoinJoinProfile::PrivacyFocused,
    ];

    /// Identifier stored in the settings file.
    pub fn id(&self) -> &'static str {
        match self {
            CoinJoinProfile::Speedy => "speedy",
            CoinJoinProfile::Economical => "economical",
            CoinJoinProfile::PrivacyFocused => "privacy_focused",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CoinJoinProfile::Speedy => "Speedy",
            CoinJoinProfile::Economical => "Economical",
            CoinJoinProfile::PrivacyFocused => "Privacy Focused",
        }
    }

    /// Anonymity score target applied when the profile is selected.
    pub fn anon_score_target(&self) -> u32 {
        match self {
            CoinJoinProfile::Speedy | CoinJoinProfile::Economical => 5,
            CoinJoinProfile::PrivacyFocused => 50,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl std::fmt::Display for CoinJoinProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Display name for the stored profile id.
pub fn profile_display_name(profile: Option<&str>) -> String {
    match profile {
        None => "None".to_string(),
        Some(id) => CoinJoinProfile::from_id(id)
            .map(|p| p.title().to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// Validate a raw anonymity score target edit.
pub fn parse_anon_score_target(raw: &i64) -> Option<u32> {
    u32::try_from(*raw)
        .ok()
        .filter(|v| ANON_SCORE_TARGET_RANGE.contains(v))
}

/// Validate a raw pleb-stop threshold edit.
pub fn parse_pleb_stop_threshold(raw: &String) -> Option<Amount> {
    Amount::try_parse(raw)
}

/// Coinjoin settings of one wallet.
pub struct CoinJoinSettingsCoordinator {
    manager: Arc<SettingsManager>,
    auto_coinjoin_store: Arc<SettingField<bool>>,
    profiles: InteractionChannel,

    auto_coinjoin: Signal<bool>,
    anon_score_target: Signal<i64>,
    pleb_stop_threshold: Signal<String>,
    is_profile_selected: Signal<bool>,
    selected_profile_name: Signal<String>,

    anon_pipeline: PipelineHandle,
    pleb_pipeline: PipelineHandle,
}

impl CoinJoinSettingsCoordinator {
    /// Seed the signals from the settings and start both pipelines.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(manager: Arc<SettingsManager>, dialogs: Arc<dyn DialogHost>) -> Self {
        let settings = manager.get();
        let coinjoin = &settings.coinjoin;
        let quiet_window = settings.coordinator.quiet_window();

        let auto_coinjoin = Signal::new(coinjoin.auto_coinjoin);
        let anon_score_target = Signal::new(i64::from(coinjoin.anon_score_target));
        let pleb_stop_threshold = Signal::new(coinjoin.pleb_stop_threshold.to_string());
        let is_profile_selected = Signal::new(coinjoin.is_profile_selected());
        let selected_profile_name = Signal::new(profile_display_name(coinjoin.profile.as_deref()));

        let anon_store: Arc<dyn SettingStore<u32>> =
            Arc::new(SettingField::anon_score_target(manager.clone()));
        let anon_pipeline =
            CommitPipeline::new("anon_score_target", anon_store, parse_anon_score_target)
                .with_quiet_window(quiet_window)
                .observe(&anon_score_target);

        let pleb_store: Arc<dyn SettingStore<Amount>> =
            Arc::new(SettingField::pleb_stop_threshold(manager.clone()));
        let pleb_pipeline =
            CommitPipeline::new("pleb_stop_threshold", pleb_store, parse_pleb_stop_threshold)
                .with_quiet_window(quiet_window)
                .observe(&pleb_stop_threshold);

        tracing::debug!(
            wallet = %settings.wallet.name,
            ?quiet_window,
            "Coinjoin settings coordinator started"
        );

        Self {
            auto_coinjoin_store: Arc::new(SettingField::auto_coinjoin(manager.clone())),
            manager,
            profiles: InteractionChannel::new("select_coinjoin_profile", dialogs),
            auto_coinjoin,
            anon_score_target,
            pleb_stop_threshold,
            is_profile_selected,
            selected_profile_name,
            anon_pipeline,
            pleb_pipeline,
        }
    }

    pub fn auto_coinjoin(&self) -> &Signal<bool> {
        &self.auto_coinjoin
    }

    pub fn anon_score_target(&self) -> &Signal<i64> {
        &self.anon_score_target
    }

    pub fn pleb_stop_threshold(&self) -> &Signal<String> {
        &self.pleb_stop_threshold
    }

    pub fn is_profile_selected(&self) -> &Signal<bool> {
        &self.is_profile_selected
    }

    pub fn selected_profile_name(&self) -> &Signal<String> {
        &self.selected_profile_name
    }

    pub fn anon_pipeline(&self) -> &PipelineHandle {
        &self.anon_pipeline
    }

    pub fn pleb_pipeline(&self) -> &PipelineHandle {
        &self.pleb_pipeline
    }

    /// User edit of the anonymity score target.
    pub fn set_anon_score_target(&self, raw: i64) {
        self.anon_score_target.set(raw);
    }

    /// User edit of the pleb-stop threshold text.
    pub fn set_pleb_stop_threshold(&self, raw: impl Into<String>) {
        self.pleb_stop_threshold.set(raw.into());
    }

    fn stored_profile(&self) -> Option<String> {
        self.manager.read(|s| s.coinjoin.profile.clone())
    }

    /// Flip auto-coinjoin.
    ///
    /// Without a selected profile the user is asked to pick one first; if
    /// they decline, auto-coinjoin is forced off and nothing is written.
    /// Returns the resulting value.
    pub async fn toggle_auto_coinjoin(&self) -> Result<bool> {
        let desired = !self.auto_coinjoin.get().unwrap_or(false);

        if self.stored_profile().is_none() {
            self.ask_for_profile().await?;
        }

        if self.stored_profile().is_none() {
            tracing::debug!("No coinjoin profile selected, auto-coinjoin stays off");
            self.auto_coinjoin.set(false);
            return Ok(false);
        }

        let store = Arc::clone(&self.auto_coinjoin_store);
        run_blocking(move || store.write(desired)).await?;
        self.auto_coinjoin.set(desired);
        tracing::info!(auto_coinjoin = desired, "Auto-coinjoin toggled");
        Ok(desired)
    }

    /// Let the user pick a coinjoin profile, then re-read auto-coinjoin.
    pub async fn select_profile(&self) -> Result<Option<CoinJoinProfile>> {
        let selected = self.ask_for_profile().await?;
        let auto = self.manager.read(|s| s.coinjoin.auto_coinjoin);
        self.auto_coinjoin.set(auto);
        Ok(selected)
    }

    async fn ask_for_profile(&self) -> Result<Option<CoinJoinProfile>> {
        let current = self
            .stored_profile()
            .as_deref()
            .and_then(CoinJoinProfile::from_id);
        let response = self
            .profiles
            .ask(DialogRequest::SelectCoinJoinProfile { current })
            .await?;

        match response {
            DialogResponse::ProfileSelected(profile) => {
                self.apply_profile(profile).await?;
                Ok(Some(profile))
            }
            DialogResponse::Dismissed => Ok(None),
            other => {
                tracing::warn!(response = ?other, "Unexpected answer to profile selection");
                Ok(None)
            }
        }
    }

    async fn apply_profile(&self, profile: CoinJoinProfile) -> Result<()> {
        let manager = Arc::clone(&self.manager);
        run_blocking(move || {
            manager
                .update(|s| {
                    s.coinjoin.profile = Some(profile.id().to_string());
                    s.coinjoin.anon_score_target = profile.anon_score_target();
                })
                .map_err(CoordinatorError::persistence)
        })
        .await?;
        tracing::info!(profile = profile.id(), "Coinjoin profile selected");

        self.is_profile_selected.set(true);
        self.selected_profile_name.set(profile.title().to_string());
        // Settles as unchanged: the preset is already stored.
        self.anon_score_target
            .set(i64::from(profile.anon_score_target()));
        Ok(())
    }

    /// Re-seed every signal from the stored settings.
    ///
    /// Re-seeded values equal the stored ones, so the pipelines settle them
    /// without writing.
    pub fn on_navigated_to(&self) {
        let coinjoin = self.manager.read(|s| s.coinjoin.clone());
        self.pleb_stop_threshold
            .set(coinjoin.pleb_stop_threshold.to_string());
        self.anon_score_target
            .set(i64::from(coinjoin.anon_score_target));
        self.is_profile_selected.set(coinjoin.is_profile_selected());
        self.selected_profile_name
            .set(profile_display_name(coinjoin.profile.as_deref()));
    }

    /// Stop both pipelines. Pending edits are discarded.
    pub fn dispose(&self) {
        self.anon_pipeline.dispose();
        self.pleb_pipeline.dispose();
    }
}

/// Settings writes touch the filesystem; keep them off the async workers.
async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T> + Send + 'static,
) -> Result<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoordinatorError::Internal(format!("settings write task failed: {}", e)))?
}
