//! TOML-based settings for the wallet coordinator.
//!
//! Settings are loaded from `~/.wallet-coordinator/settings.toml` (or an
//! explicit path). The [`SettingsManager`] owns the in-memory copy and
//! persists every update atomically; [`SettingField`] exposes one field as a
//! [`SettingStore`] for the debounced commit pipelines.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wallet_coordinator::settings::{SettingField, SettingStore, SettingsManager};
//!
//! let manager = Arc::new(SettingsManager::new().await?);
//! let target = SettingField::anon_score_target(manager.clone());
//! target.write(21)?;
//! ```

pub mod field;
pub mod loader;
pub mod schema;

pub use field::{SettingField, SettingStore};
pub use loader::{settings_path, SettingsManager};
pub use schema::{CoinJoinSettings, CoordinatorSettings, WalletSettings};
