// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::map::client::DEFAULT_MAX_LIST_COUNT;
use crate::obex::DEFAULT_MAX_PACKET_LENGTH;

/// Directory name under the platform config and data dirs.
const APP_DIR: &str = "map-client";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Data directory for history.
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// OBEX session settings.
    pub obex: ObexConfig,

    /// Defaults for listing requests.
    pub listing: ListingConfig,

    /// History settings.
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Adapter name such as "hci0"; the default adapter when unset.
    pub adapter: Option<String>,

    /// Address of the phone to connect to on startup.
    pub address: Option<String>,

    /// RFCOMM channel of the MAS; resolved through SDP when unset.
    pub rfcomm_channel: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObexConfig {
    /// Maximum packet length offered in CONNECT.
    pub max_packet_length: u16,
}

impl Default for ObexConfig {
    fn default() -> Self {
        Self {
            max_packet_length: DEFAULT_MAX_PACKET_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListingConfig {
    pub max_list_count: u16,
    pub list_start_offset: u16,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_list_count: DEFAULT_MAX_LIST_COUNT,
            list_start_offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record shell commands.
    pub enabled: bool,

    /// Maximum entries kept; older ones are pruned.
    pub max_entries: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load configuration from the default file or create it.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = Self::load_from(&path)?;

        config.data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    ///
    /// The data directory is left next to the file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        } else {
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            config
        };

        config.data_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, address: Option<String>, channel: Option<u8>) {
        if address.is_some() {
            self.bluetooth.address = address;
        }
        if channel.is_some() {
            self.bluetooth.rfcomm_channel = channel;
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.obex.max_packet_length, 0xFFFF);
        assert_eq!(config.listing.max_list_count, 1024);
        assert_eq!(config.listing.list_start_offset, 0);
        assert!(config.history.enabled);
        assert_eq!(config.history.max_entries, 1000);
        assert!(config.bluetooth.address.is_none());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map-client").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.data_dir, dir.path().join("map-client"));
        assert_eq!(config.listing, ListingConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bluetooth]\naddress = \"00:11:22:33:44:55\"\nrfcomm_channel = 4\n\n[history]\nenabled = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.bluetooth.address.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(config.bluetooth.rfcomm_channel, Some(4));
        assert!(!config.history.enabled);
        assert_eq!(config.history.max_entries, 1000);
        assert_eq!(config.obex.max_packet_length, 0xFFFF);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[obex]\nmax_packet_length = \"big\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.listing.max_list_count = 50;
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.listing.max_list_count, 50);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.bluetooth.address = Some("AA:BB:CC:DD:EE:FF".into());

        config.apply_overrides(None, Some(2));
        assert_eq!(config.bluetooth.address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(config.bluetooth.rfcomm_channel, Some(2));

        config.apply_overrides(Some("00:00:00:00:00:01".into()), None);
        assert_eq!(config.bluetooth.address.as_deref(), Some("00:00:00:00:00:01"));
    }
}
