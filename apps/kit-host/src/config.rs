// Licensed under the Apache-2.0 license

use anyhow::{anyhow, bail, Context, Result};
use emulator_hsm::EmulatorConfig;
use kit_protocol::config::DEFAULT_MESSAGE_DELIMITER;
use kit_protocol::KitConfig;
use log::LevelFilter;
use serde::Deserialize;
use std::path::Path;

/// Host configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub kit: KitSection,
    pub emulator: EmulatorConfig,
    pub boot: BootSection,
}

/// Kit Protocol settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KitSection {
    pub log_level: String,
    pub secure_boot: bool,
    pub reject_reserved_slots: bool,
    pub message_delimiter: char,
}

impl Default for KitSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            secure_boot: false,
            reject_reserved_slots: true,
            message_delimiter: DEFAULT_MESSAGE_DELIMITER as char,
        }
    }
}

/// Supervisory boot settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootSection {
    /// Boot sequencer polls allowed before the HSM is declared hung.
    pub max_boot_polls: u32,
}

impl Default for BootSection {
    fn default() -> Self {
        Self {
            max_boot_polls: 1000,
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: HostConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    pub fn kit_config(&self) -> Result<KitConfig> {
        let delimiter = self.kit.message_delimiter;
        if !delimiter.is_ascii() {
            bail!("Message delimiter {:?} is not an ASCII character", delimiter);
        }
        Ok(KitConfig::new()
            .with_secure_boot(self.kit.secure_boot)
            .with_reject_reserved_slots(self.kit.reject_reserved_slots)
            .with_message_delimiter(delimiter as u8))
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        parse_log_level(&self.kit.log_level)
    }
}

pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("Invalid log level: {}", level))
}
