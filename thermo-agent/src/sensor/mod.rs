use async_trait::async_trait;
use time::OffsetDateTime;

mod w1_sensor;

pub use w1_sensor::*;

/// A single temperature sample in full units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub taken_at: OffsetDateTime,
}

impl Reading {
    pub fn now(value: f64) -> Self {
        Self {
            value,
            taken_at: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
pub trait TemperatureSensor: Send {
    /// Best-effort sample; faults yield the last known-good value instead of an error.
    async fn read(&mut self) -> Reading;
}
