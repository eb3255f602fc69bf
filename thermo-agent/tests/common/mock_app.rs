use std::path::PathBuf;
use std::sync::Arc;

use thermo_agent::configs::Settings;
use thermo_agent::configs::settings::{Device, Gpio, Logger, Report, Sensor, Server};
use thermo_agent::gpio::LoggingGpio;
use thermo_agent::identity::DeviceIdentity;
use thermo_agent::mock::{MockRemote, MockSession};
use thermo_api::models::Coordinates;

pub const LED_PIN: u32 = 17;

pub fn test_settings(interval_secs: u64) -> Settings {
    Settings {
        logger: Logger {
            level: String::from("debug"),
        },
        server: Server {
            url: String::from("mqtt://localhost:1883"),
            refresh_token: String::from("test-refresh-token"),
            tls: None,
        },
        device: Device {
            base_id: String::from("raspi-thermo"),
            coordinates: Coordinates {
                lat: 40.20328995345767,
                lng: -8.4270206263202,
            },
            device_type: String::from("Thermostats"),
            units: String::from("c"),
        },
        report: Report {
            interval_secs,
            unique_notification_id: false,
            notification_kind: String::from("temperature"),
        },
        sensor: Sensor {
            devices_dir: PathBuf::from("/nonexistent/w1/devices"),
            family_prefix: String::from("28-"),
        },
        gpio: Gpio {
            led_pin: LED_PIN,
            sysfs_path: PathBuf::from("/nonexistent/gpio"),
            simulate: true,
        },
    }
}

pub struct MockApp {
    pub settings: Settings,
    pub identity: DeviceIdentity,
    pub session: MockSession,
    pub remote: MockRemote,
    pub gpio: Arc<LoggingGpio>,
}

impl MockApp {
    pub fn new(interval_secs: u64) -> Self {
        let settings = test_settings(interval_secs);
        let identity = DeviceIdentity::new(&settings.device.base_id, &settings.server.refresh_token);
        let (session, remote) = MockSession::new();

        Self {
            settings,
            identity,
            session,
            remote,
            gpio: Arc::new(LoggingGpio::new()),
        }
    }
}
