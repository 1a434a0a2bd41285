use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use tracing::*;

/// Duration of the min-hold sampling window
pub const MEASURING_WINDOW: Duration = Duration::from_millis(50_000);
/// No-sampling pause between the end of a measuring window and the first send attempt
pub const SETTLE_WINDOW: Duration = Duration::from_millis(10_000);
/// Pause after a failed send before the same payload is tried again
pub const RETRY_BACKOFF: Duration = Duration::from_millis(1_000);
/// Pause between network association polls at startup
pub const ASSOCIATION_POLL_PERIOD: Duration = Duration::from_millis(1_000);

/// Voltage of one ADC count in millivolts (ADS1115 at +/-6.144V gain)
pub const ADC_LSB_MILLIVOLTS: f64 = 0.1875;

/// Bus address of the ADC serving channels 0-3
pub const ADC_A_ADDRESS: u8 = 0x48;
/// Bus address of the ADC serving channels 4-7
pub const ADC_B_ADDRESS: u8 = 0x49;

// Default upload endpoint
pub const SERVER_HOST: &str = "172.16.18.25";
pub const SERVER_PORT: u16 = 80;
pub const UPLOAD_PATH: &str = "/phpfiles/save_data.php";

/// Names a JSON file overriding [`ServerConfig`] defaults
pub const SERVER_CONFIG_ENV: &str = "ADC_UPLINK_SERVER_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read server config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("unable to parse server config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Where aggregated payloads are posted to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.to_string(),
            port: SERVER_PORT,
            path: UPLOAD_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load the server config from the file named by [`SERVER_CONFIG_ENV`], else use defaults
    pub fn load() -> Result<Self, ConfigError> {
        match env::var(SERVER_CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => {
                info!("{SERVER_CONFIG_ENV} not set, using default server config");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let config: ServerConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: shown.clone(),
                source,
            })?;

        info!("Loaded server config from {shown}: {:?}", config);
        Ok(config)
    }
}
