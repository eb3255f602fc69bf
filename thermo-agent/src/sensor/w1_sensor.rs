use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Reading, TemperatureSensor};

/// Family code of DS18B20 style thermometers.
pub const DS18B20_FAMILY: &str = "28-";
pub const SLAVE_FILE: &str = "w1_slave";

/// Outcome of scanning one `w1_slave` dump.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Sample {
    Value(f64),
    BadCrc,
    Unparsable,
    Missing,
}

/// Scan the driver output.
///
/// Any `crc=... NO` line rejects the whole dump, wherever it appears; otherwise the first
/// `t=` line yields the value in millidegrees.
fn parse_slave(content: &str) -> Sample {
    if content
        .lines()
        .any(|line| line.contains("crc=") && line.contains("NO"))
    {
        return Sample::BadCrc;
    }

    let Some(raw) = content
        .lines()
        .find_map(|line| line.split_once("t=").map(|(_, raw)| raw))
    else {
        return Sample::Missing;
    };

    match raw.trim().parse::<f64>() {
        Ok(milli) if milli.is_finite() => Sample::Value(milli / 1000.0),
        _ => Sample::Unparsable,
    }
}

/// One-wire thermometer exposed by the kernel `w1_therm` driver.
pub struct W1TempSensor {
    path: Option<PathBuf>,
    last_good: f64,
}

impl W1TempSensor {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            last_good: 0.0,
        }
    }

    /// Use the first `<devices_dir>/<family_prefix>*/w1_slave` file, if any.
    pub fn discover(devices_dir: &Path, family_prefix: &str) -> Self {
        let path = Self::find_slave(devices_dir, family_prefix);

        match &path {
            Some(path) => info!("Temperature sensor found at {}", path.display()),
            None => warn!(
                "No temperature sensor under {}, reporting fallback values",
                devices_dir.display()
            ),
        }

        Self::new(path)
    }

    fn find_slave(devices_dir: &Path, family_prefix: &str) -> Option<PathBuf> {
        let entries = fs::read_dir(devices_dir).ok()?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(family_prefix))
            .map(|entry| entry.path().join(SLAVE_FILE))
            .filter(|path| path.is_file())
            .collect();

        candidates.sort();
        candidates.into_iter().next()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn last_good(&self) -> f64 {
        self.last_good
    }
}

#[async_trait]
impl TemperatureSensor for W1TempSensor {
    async fn read(&mut self) -> Reading {
        let Some(path) = &self.path else {
            return Reading::now(self.last_good);
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return Reading::now(self.last_good);
            }
        };

        match parse_slave(&content) {
            Sample::Value(value) => self.last_good = value,
            sample => debug!("Sensor fault {:?}, keeping {}", sample, self.last_good),
        }

        Reading::now(self.last_good)
    }
}
