//! Settings loading, saving, and dot-notation access.
//!
//! The `SettingsManager` handles:
//! - Loading settings from `~/.wallet-coordinator/settings.toml`
//! - Atomic file writes with temp file + rename
//! - First-run template generation
//!
//! It is the single owner of the wallet settings. Readers get snapshots;
//! writers go through [`SettingsManager::update`], which serializes
//! concurrent writers and persists before returning.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};

use super::schema::WalletSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wallet-coordinator")
        .join("settings.toml")
}

/// Manages settings loading and persistence.
pub struct SettingsManager {
    /// Cached settings
    settings: RwLock<WalletSettings>,

    /// Held for the whole mutate + write sequence
    persist_lock: Mutex<()>,

    /// Path to the settings file
    path: PathBuf,
}

impl SettingsManager {
    /// Create a new SettingsManager, loading from the default path if available.
    pub async fn new() -> Result<Self> {
        Self::load(settings_path()).await
    }

    /// Create a SettingsManager backed by a specific file.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Self::load_from_path(&path).await?;

        Ok(Self::with_settings(path, settings))
    }

    /// Create a SettingsManager with explicit contents (nothing is read from disk).
    pub fn with_settings(path: impl Into<PathBuf>, settings: WalletSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            persist_lock: Mutex::new(()),
            path: path.into(),
        }
    }

    async fn load_from_path(path: &Path) -> Result<WalletSettings> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            return Ok(WalletSettings::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read settings file")?;

        let settings: WalletSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Get the current settings (snapshot).
    pub fn get(&self) -> WalletSettings {
        self.settings.read().clone()
    }

    /// Read a projection of the settings without cloning everything.
    pub fn read<R>(&self, f: impl FnOnce(&WalletSettings) -> R) -> R {
        f(&self.settings.read())
    }

    /// Mutate the settings and persist them to disk.
    ///
    /// The cache only takes the new value once the file has been written; a
    /// failed write leaves both untouched.
    pub fn update(&self, f: impl FnOnce(&mut WalletSettings)) -> Result<()> {
        let _persist = self.persist_lock.lock();
        let mut updated = self.get();
        f(&mut updated);
        self.write_file(&updated)?;
        *self.settings.write() = updated;
        Ok(())
    }

    /// Replace the settings wholesale and persist.
    pub fn replace(&self, new_settings: WalletSettings) -> Result<()> {
        self.update(move |settings| *settings = new_settings)
    }

    /// Persist the cached settings as they are.
    pub fn save(&self) -> Result<()> {
        self.update(|_| {})
    }

    fn write_file(&self, settings: &WalletSettings) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(settings).context("Failed to serialize settings")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &toml_string).context("Failed to write settings file")?;
        std::fs::rename(&temp_path, &self.path).context("Failed to replace settings file")?;

        tracing::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Get a specific setting by dot-notation key (e.g., "coinjoin.anon_score_target").
    pub fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let json = serde_json::to_value(&*self.settings.read())?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Setting '{}' not found", key))?;
        }

        Ok(current.clone())
    }

    /// Set a specific setting by dot-notation key and persist.
    pub fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut json = serde_json::to_value(self.get())?;

        let parts: Vec<&str> = key.split('.').collect();
        set_nested_value(&mut json, &parts, value)?;

        let updated: WalletSettings = serde_json::from_value(json)
            .with_context(|| format!("Invalid value for setting '{}'", key))?;
        self.replace(updated)
    }

    /// Reset to defaults and persist.
    pub fn reset(&self) -> Result<()> {
        self.replace(WalletSettings::default())
    }

    /// Check if settings file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure settings file exists, creating from template if needed.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, TEMPLATE).await?;
        tracing::info!("Generated settings template at {:?}", self.path);
        Ok(true)
    }

    /// Reload settings from disk.
    pub async fn reload(&self) -> Result<()> {
        let settings = Self::load_from_path(&self.path).await?;
        *self.settings.write() = settings;
        Ok(())
    }
}

/// Set a value in a nested JSON object using a key path.
fn set_nested_value(
    json: &mut serde_json::Value,
    parts: &[&str],
    value: serde_json::Value,
) -> Result<()> {
    let Some((last, parents)) = parts.split_last() else {
        return Err(anyhow::anyhow!("Empty key path"));
    };

    let mut current = json;
    for part in parents {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Setting path '{}' not found", parts.join(".")))?;
    }

    match current.as_object_mut() {
        Some(obj) if obj.contains_key(*last) => {
            obj.insert((*last).to_string(), value);
            Ok(())
        }
        Some(_) => Err(anyhow::anyhow!("Setting '{}' not found", parts.join("."))),
        None => Err(anyhow::anyhow!("Cannot set value on non-object")),
    }
}
