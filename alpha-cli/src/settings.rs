//! alphasign settings

use std::path::{Path, PathBuf};

use alpha_protocol::ChecksumScope;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings read from `settings.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Bytes covered by packet checksums
    pub checksum_scope: ChecksumScope,
    /// NUL bytes sent ahead of a composed frame so the sign can sync
    pub wake_up_padding: usize,
    /// Text removed by `strip` when no target is given
    pub strip_targets: Vec<String>,
    /// Log filter used when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            checksum_scope: ChecksumScope::Content,
            wake_up_padding: 20,
            strip_targets: Vec::new(),
            log_filter: "alphasign=info,alpha_protocol=warn".to_string(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for alphasign
    /// Uses $XDG_CONFIG_HOME/alphasign, falls back to ~/.config/alphasign
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("alphasign"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("alphasign"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location
    ///
    /// A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse settings in {}", path.display()))
    }
}
