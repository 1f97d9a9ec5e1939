//! Typed read/write access to one field of the wallet settings.
//!
//! Pipelines never see the whole settings object. They get a
//! [`SettingStore`] for the single value they own, which for the real
//! application is a [`SettingField`] projecting into the
//! [`SettingsManager`].

use std::sync::Arc;

use crate::amount::Amount;
use crate::error::{CoordinatorError, Result};

use super::loader::SettingsManager;
use super::schema::WalletSettings;

/// Durable backing store for one logical setting.
///
/// `write` is synchronous from the caller's point of view and is not retried;
/// a failure is reported to whoever drives the write.
pub trait SettingStore<V>: Send + Sync + 'static {
    fn read(&self) -> V;

    fn write(&self, value: V) -> Result<()>;
}

/// A single field of [`WalletSettings`] persisted through a [`SettingsManager`].
pub struct SettingField<V> {
    manager: Arc<SettingsManager>,
    name: &'static str,
    get: fn(&WalletSettings) -> V,
    set: fn(&mut WalletSettings, V),
}

impl<V> SettingField<V> {
    pub fn new(
        manager: Arc<SettingsManager>,
        name: &'static str,
        get: fn(&WalletSettings) -> V,
        set: fn(&mut WalletSettings, V),
    ) -> Self {
        Self {
            manager,
            name,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl SettingField<u32> {
    pub fn anon_score_target(manager: Arc<SettingsManager>) -> Self {
        Self::new(
            manager,
            "coinjoin.anon_score_target",
            |s| s.coinjoin.anon_score_target,
            |s, v| s.coinjoin.anon_score_target = v,
        )
    }
}

impl SettingField<Amount> {
    pub fn pleb_stop_threshold(manager: Arc<SettingsManager>) -> Self {
        Self::new(
            manager,
            "coinjoin.pleb_stop_threshold",
            |s| s.coinjoin.pleb_stop_threshold,
            |s, v| s.coinjoin.pleb_stop_threshold = v,
        )
    }
}

impl SettingField<bool> {
    pub fn auto_coinjoin(manager: Arc<SettingsManager>) -> Self {
        Self::new(
            manager,
            "coinjoin.auto_coinjoin",
            |s| s.coinjoin.auto_coinjoin,
            |s, v| s.coinjoin.auto_coinjoin = v,
        )
    }
}

impl<V: Send + Sync + 'static> SettingStore<V> for SettingField<V> {
    fn read(&self) -> V {
        self.manager.read(self.get)
    }

    fn write(&self, value: V) -> Result<()> {
        let set = self.set;
        self.manager
            .update(move |settings| set(settings, value))
            .map_err(CoordinatorError::persistence)?;
        tracing::debug!(setting = self.name, "Setting persisted");
        Ok(())
    }
}
