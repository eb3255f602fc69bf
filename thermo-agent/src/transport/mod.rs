use std::sync::Arc;

use async_trait::async_trait;
use thermo_api::models::{CommandRecord, CommandUpdate, DeviceRegistration, Notification};
use tokio::sync::mpsc;

use crate::errors::TransportError;

mod mqtt;

pub use mqtt::*;

/// A connected session with the device management service.
#[async_trait]
pub trait Session: Send + Sync {
    type Device: DeviceHandle;

    /// Announce the device and obtain a handle for its traffic
    async fn register_device(
        &self,
        registration: &DeviceRegistration,
    ) -> Result<Self::Device, TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait DeviceHandle: Send + Sync + 'static {
    fn device_id(&self) -> &str;

    async fn send_notification(
        &self,
        kind: &str,
        notification: &Notification,
    ) -> Result<(), TransportError>;

    /// Stream of commands inserted for this device. Can only be taken once.
    async fn subscribe_insert_commands(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<Command>, TransportError>;
}

/// Delivers command outcomes back to the service.
#[async_trait]
pub trait CommandAck: Send + Sync {
    async fn acknowledge(&self, update: &CommandUpdate) -> Result<(), TransportError>;
}

/// Inbound command; the handler sets `status` and calls [`Command::save`].
pub struct Command {
    record: CommandRecord,
    pub status: Option<String>,
    ack: Arc<dyn CommandAck>,
}

impl Command {
    pub fn new(record: CommandRecord, ack: Arc<dyn CommandAck>) -> Self {
        let status = record.status.clone();

        Self { record, status, ack }
    }

    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.command
    }

    pub fn parameters(&self) -> Option<&serde_json::Value> {
        self.record.parameters.as_ref()
    }

    /// Send the current status back to the service
    pub async fn save(&self) -> Result<(), TransportError> {
        let update = CommandUpdate {
            id: self.record.id,
            command: self.record.command.clone(),
            status: self.status.clone().unwrap_or_default(),
        };

        self.ack.acknowledge(&update).await
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.record.id)
            .field("command", &self.record.command)
            .field("status", &self.status)
            .finish()
    }
}
