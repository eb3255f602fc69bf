use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thermo_api::models::Coordinates;

use crate::configs::normalize_path;

const DEFAULT_SETTINGS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../",
    "configs/default.toml"
));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    pub refresh_token: String,
    pub tls: Option<ServerTls>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("url", &self.url)
            .field("refresh_token", &"<redacted>")
            .field("tls", &self.tls)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub base_id: String,
    pub coordinates: Coordinates,
    pub device_type: String,
    pub units: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub interval_secs: u64,
    /// Send a fresh identifier with every notification instead of the device identity
    pub unique_notification_id: bool,
    pub notification_kind: String,
}

impl Report {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub devices_dir: PathBuf,
    pub family_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gpio {
    pub led_pin: u32,
    pub sysfs_path: PathBuf,
    /// Skip the hardware probe and always use the logging stand-in
    pub simulate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub server: Server,
    pub device: Device,
    pub report: Report,
    pub sensor: Sensor,
    pub gpio: Gpio,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Self::environment())
    }

    /// Environment source mapping `THERMO_SECTION__KEY` onto `section.key`.
    pub fn environment() -> Environment {
        Environment::with_prefix("THERMO")
            .prefix_separator("_")
            .separator("__")
    }

    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        if settings.server.url.trim().is_empty() {
            return Err(ConfigError::Message("server.url must not be empty".into()));
        }

        if settings.server.refresh_token.is_empty() {
            return Err(ConfigError::Message("server.refresh_token must not be empty".into()));
        }

        if settings.report.interval_secs == 0 {
            return Err(ConfigError::Message("report.interval_secs must be greater than zero".into()));
        }

        if let Some(tls) = &settings.server.tls {
            let cert_path = normalize_path(&tls.cert_path)
                .map_err(|e| ConfigError::Message(e.to_string()))?
                .to_string_lossy()
                .to_string();
            let key_path = normalize_path(&tls.key_path)
                .map_err(|e| ConfigError::Message(e.to_string()))?
                .to_string_lossy()
                .to_string();

            settings.server.tls = Some(ServerTls { cert_path, key_path });
        }

        Ok(settings)
    }
}
