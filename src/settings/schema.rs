//! Settings schema definitions for the wallet coordinator.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Default coinjoin anonymity score target.
pub const DEFAULT_ANON_SCORE_TARGET: u32 = 5;

/// Accepted anonymity score target range.
pub const ANON_SCORE_TARGET_RANGE: std::ops::RangeInclusive<u32> = 2..=300;

/// Default pleb-stop threshold (0.01 coin).
pub const DEFAULT_PLEB_STOP_THRESHOLD: Amount = Amount::from_cents(1);

/// Root settings structure.
///
/// Loaded from `~/.wallet-coordinator/settings.toml`.
/// Version field enables future migrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Wallet identity
    pub wallet: WalletIdentitySettings,

    /// Coinjoin preferences persisted per wallet
    pub coinjoin: CoinJoinSettings,

    /// Coordinator timing
    pub coordinator: CoordinatorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletIdentitySettings {
    /// Display name of the wallet
    pub name: String,
}

/// Coinjoin preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinJoinSettings {
    /// Start coinjoin automatically
    pub auto_coinjoin: bool,

    /// Anonymity score each coin should reach
    pub anon_score_target: u32,

    /// Do not coinjoin while the wallet balance is below this amount
    pub pleb_stop_threshold: Amount,

    /// Selected coinjoin profile id (e.g. "speedy")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Coordinator timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Debounce quiet window for settings edits, in milliseconds
    pub quiet_window_ms: u64,

    /// Delay of the simulated wallet loader used by the CLI, in milliseconds
    pub load_delay_ms: u64,
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            version: 1,
            wallet: WalletIdentitySettings::default(),
            coinjoin: CoinJoinSettings::default(),
            coordinator: CoordinatorSettings::default(),
        }
    }
}

impl Default for WalletIdentitySettings {
    fn default() -> Self {
        Self {
            name: "Wallet".to_string(),
        }
    }
}

impl Default for CoinJoinSettings {
    fn default() -> Self {
        Self {
            auto_coinjoin: false,
            anon_score_target: DEFAULT_ANON_SCORE_TARGET,
            pleb_stop_threshold: DEFAULT_PLEB_STOP_THRESHOLD,
            profile: None,
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            quiet_window_ms: 1000,
            load_delay_ms: 500,
        }
    }
}

impl CoinJoinSettings {
    pub fn is_profile_selected(&self) -> bool {
        self.profile.is_some()
    }
}

impl CoordinatorSettings {
    pub fn quiet_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.quiet_window_ms)
    }

    pub fn load_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.load_delay_ms)
    }
}
