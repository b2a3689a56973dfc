//! Bridge configuration
//!
//! A single TOML file under the user's config directory. Missing files are
//! created with defaults so the bridge always starts; malformed files are an
//! error rather than being silently replaced.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::bridge::{CollectorSettings, ForwarderSettings, PadMode};
use crate::device::{DeviceSettings, DEFAULT_UINPUT_PATH};

const CONFIG_DIR: &str = "padmapper";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("No config directory available on this system")]
    NoConfigDir,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Control node to open
    pub uinput_path: PathBuf,

    /// Stick deadzone as a fraction of full deflection
    pub joystick_deadzone: f32,

    /// Sleep between gilrs polls
    pub poll_interval_us: u64,

    /// Which physical gamepad to forward; `None` picks the first one
    pub gamepad_index: Option<usize>,

    /// `single` forwards one pad, `joy_con_pair` merges a left and a right Joy-Con
    pub pad_mode: PadMode,

    /// gilrs reports stick up as positive, evdev pads as negative
    pub invert_left_y: bool,
    pub invert_right_y: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            uinput_path: PathBuf::from(DEFAULT_UINPUT_PATH),
            joystick_deadzone: 0.05,
            poll_interval_us: 100,
            gamepad_index: None,
            pad_mode: PadMode::Single,
            invert_left_y: true,
            invert_right_y: true,
        }
    }
}

impl BridgeConfig {
    /// `$XDG_CONFIG_HOME/padmapper/config.toml` or the platform equivalent
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        if !exists {
            info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path).await?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.joystick_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "joystick_deadzone must be in [0.0, 1.0), got {}",
                self.joystick_deadzone
            )));
        }
        if self.uinput_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("uinput_path is empty".to_string()));
        }
        Ok(())
    }

    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            uinput_path: self.uinput_path.clone(),
        }
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            joystick_deadzone: self.joystick_deadzone,
            poll_interval_us: self.poll_interval_us,
            gamepad_index: self.gamepad_index,
            pad_mode: self.pad_mode,
        }
    }

    pub fn forwarder_settings(&self) -> ForwarderSettings {
        ForwarderSettings {
            invert_left_y: self.invert_left_y,
            invert_right_y: self.invert_right_y,
        }
    }
}
