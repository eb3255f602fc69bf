use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{Gpio, PinMode};
use crate::errors::GpioError;

/// Legacy `/sys/class/gpio` interface.
pub struct SysfsGpio {
    base_path: PathBuf,
}

impl SysfsGpio {
    pub fn new(base_path: &Path) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
        }
    }

    fn pin_path(&self, pin: u32) -> PathBuf {
        self.base_path.join(format!("gpio{pin}"))
    }

    /// Export a pin if not already exported.
    async fn ensure_exported(&self, pin: u32) -> Result<(), GpioError> {
        if tokio::fs::try_exists(self.pin_path(pin)).await.unwrap_or(false) {
            return Ok(());
        }

        tokio::fs::write(self.base_path.join("export"), pin.to_string())
            .await
            .map_err(|source| GpioError::Export { pin, source })?;

        debug!("Exported gpio {}", pin);

        Ok(())
    }
}

#[async_trait]
impl Gpio for SysfsGpio {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    async fn setup(&self, pin: u32, mode: PinMode) -> Result<(), GpioError> {
        self.ensure_exported(pin).await?;

        tokio::fs::write(self.pin_path(pin).join("direction"), mode.to_string())
            .await
            .map_err(|source| GpioError::Direction { pin, source })
    }

    async fn output(&self, pin: u32, value: u8) -> Result<(), GpioError> {
        let level = if value == 0 { "0" } else { "1" };

        tokio::fs::write(self.pin_path(pin).join("value"), level)
            .await
            .map_err(|source| GpioError::Value { pin, source })
    }
}
