use std::sync::Arc;
use std::time::Duration;

use thermo_api::models::{Coordinates, Notification, NotificationParameters};
use thermo_api::uuid::{FixedIdGenerator, IdGenerator, RandomUuidGenerator};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::configs::Settings;
use crate::errors::TransportError;
use crate::identity::DeviceIdentity;
use crate::sensor::TemperatureSensor;
use crate::transport::DeviceHandle;

/// Periodic sample-and-report task.
///
/// The first report goes out as soon as the task starts, then once per interval
/// until the shutdown signal fires or a send fails.
pub struct ReportingService<S, D> {
    sensor: S,
    device: Arc<D>,
    id_generator: Box<dyn IdGenerator>,
    coordinates: Coordinates,
    device_type: String,
    units: String,
    kind: String,
    interval: Duration,
}

impl<S, D> ReportingService<S, D>
where
    S: TemperatureSensor,
    D: DeviceHandle,
{
    pub fn new(settings: &Settings, identity: &DeviceIdentity, sensor: S, device: Arc<D>) -> Self {
        let id_generator: Box<dyn IdGenerator> = if settings.report.unique_notification_id {
            Box::new(RandomUuidGenerator)
        } else {
            Box::new(FixedIdGenerator::new(identity.as_str()))
        };

        Self {
            sensor,
            device,
            id_generator,
            coordinates: settings.device.coordinates,
            device_type: settings.device.device_type.clone(),
            units: settings.device.units.clone(),
            kind: settings.report.notification_kind.clone(),
            interval: settings.report.interval(),
        }
    }

    /// Take one reading and send it.
    pub async fn report(&mut self) -> Result<Notification, TransportError> {
        let reading = self.sensor.read().await;

        let notification = Notification {
            id: self.id_generator.generate(),
            coordinates: self.coordinates,
            parameters: NotificationParameters {
                device_type: self.device_type.clone(),
                value: reading.value,
                units: self.units.clone(),
            },
            timestamp: reading.taken_at,
        };

        self.device.send_notification(&self.kind, &notification).await?;

        debug!("Reported {} {}", reading.value, self.units);

        Ok(notification)
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), TransportError> {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Reporting every {:?}", self.interval);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    self.report().await?;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Reporting stopped");

        Ok(())
    }
}
