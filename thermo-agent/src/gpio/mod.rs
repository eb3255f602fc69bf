use std::fmt;
use std::fs::OpenOptions;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::configs::settings;
use crate::errors::GpioError;

mod logging;
mod sysfs;

pub use logging::{GpioOperation, LoggingGpio};
pub use sysfs::SysfsGpio;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Input => f.write_str("in"),
            PinMode::Output => f.write_str("out"),
        }
    }
}

#[async_trait]
pub trait Gpio: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    async fn setup(&self, pin: u32, mode: PinMode) -> Result<(), GpioError>;

    /// Drive an output pin; any non-zero value is high.
    async fn output(&self, pin: u32, value: u8) -> Result<(), GpioError>;
}

/// Pick the GPIO backend once at startup.
///
/// The sysfs backend is used when its `export` file can be opened for writing,
/// otherwise operations are only logged.
pub fn probe(settings: &settings::Gpio) -> Arc<dyn Gpio> {
    let export = settings.sysfs_path.join("export");

    let gpio: Arc<dyn Gpio> = if settings.simulate {
        Arc::new(LoggingGpio::new())
    } else if OpenOptions::new().write(true).open(&export).is_ok() {
        Arc::new(SysfsGpio::new(&settings.sysfs_path))
    } else {
        Arc::new(LoggingGpio::new())
    };

    info!("Using {} gpio backend", gpio.name());

    gpio
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::{env, fs};

    use uuid::Uuid;

    use super::*;

    fn gpio_settings(sysfs_path: PathBuf, simulate: bool) -> settings::Gpio {
        settings::Gpio {
            led_pin: 17,
            sysfs_path,
            simulate,
        }
    }

    #[test]
    fn test_probe_without_sysfs_uses_logging() {
        let missing = env::temp_dir().join(format!("thermo-gpio-{}", Uuid::new_v4()));

        let gpio = probe(&gpio_settings(missing, false));

        assert_eq!(gpio.name(), "logging");
    }

    #[test]
    fn test_probe_with_export_uses_sysfs() {
        let root = env::temp_dir().join(format!("thermo-gpio-{}", Uuid::new_v4()));
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("export"), "").unwrap();

        let gpio = probe(&gpio_settings(root.clone(), false));
        assert_eq!(gpio.name(), "sysfs");

        let simulated = probe(&gpio_settings(root.clone(), true));
        assert_eq!(simulated.name(), "logging");

        fs::remove_dir_all(&root).unwrap();
    }
}
