//! In-memory stand-ins for the transport and sensor seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thermo_api::models::{CommandRecord, CommandUpdate, DeviceRegistration, Notification};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::errors::TransportError;
use crate::sensor::{Reading, TemperatureSensor};
use crate::transport::{Command, CommandAck, DeviceHandle, Session};

/// Collects every acknowledgement instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingAck {
    updates: Mutex<Vec<CommandUpdate>>,
}

impl RecordingAck {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn updates(&self) -> Vec<CommandUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build a command that acknowledges into this recorder.
    pub fn command(self: &Arc<Self>, id: i64, name: &str) -> Command {
        let record = CommandRecord {
            id,
            command: name.to_string(),
            parameters: None,
            status: None,
        };

        Command::new(record, Arc::clone(self) as Arc<dyn CommandAck>)
    }
}

#[async_trait]
impl CommandAck for RecordingAck {
    async fn acknowledge(&self, update: &CommandUpdate) -> Result<(), TransportError> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentNotification {
    pub kind: String,
    pub notification: Notification,
    pub at: Instant,
}

pub struct MockDevice {
    device_id: String,
    sent: mpsc::UnboundedSender<SentNotification>,
    commands: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
    fail_sends: bool,
}

#[async_trait]
impl DeviceHandle for MockDevice {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn send_notification(
        &self,
        kind: &str,
        notification: &Notification,
    ) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Closed);
        }

        self.sent
            .send(SentNotification {
                kind: kind.to_string(),
                notification: notification.clone(),
                at: Instant::now(),
            })
            .map_err(|_| TransportError::Closed)
    }

    async fn subscribe_insert_commands(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<Command>, TransportError> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(TransportError::AlreadySubscribed)
    }
}

/// Session whose far end is a [`MockRemote`].
pub struct MockSession {
    sent: mpsc::UnboundedSender<SentNotification>,
    commands: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
    registrations: Arc<Mutex<Vec<DeviceRegistration>>>,
    fail_sends: bool,
}

impl MockSession {
    pub fn new() -> (Self, MockRemote) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let registrations = Arc::new(Mutex::new(Vec::new()));

        let session = Self {
            sent: sent_tx,
            commands: Mutex::new(Some(command_rx)),
            registrations: Arc::clone(&registrations),
            fail_sends: false,
        };

        let remote = MockRemote {
            notifications: sent_rx,
            commands: Some(command_tx),
            ack: RecordingAck::new(),
            registrations,
        };

        (session, remote)
    }

    /// Every notification send fails with [`TransportError::Closed`].
    pub fn with_failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }
}

#[async_trait]
impl Session for MockSession {
    type Device = MockDevice;

    async fn register_device(
        &self,
        registration: &DeviceRegistration,
    ) -> Result<Self::Device, TransportError> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(registration.clone());

        Ok(MockDevice {
            device_id: registration.id.clone(),
            sent: self.sent.clone(),
            commands: Mutex::new(
                self.commands
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take(),
            ),
            fail_sends: self.fail_sends,
        })
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Service side of a [`MockSession`].
pub struct MockRemote {
    pub notifications: mpsc::UnboundedReceiver<SentNotification>,
    commands: Option<mpsc::UnboundedSender<Command>>,
    pub ack: Arc<RecordingAck>,
    registrations: Arc<Mutex<Vec<DeviceRegistration>>>,
}

impl MockRemote {
    /// Deliver a command to the device; its acknowledgement lands in `ack`.
    pub async fn insert_command(&self, id: i64, name: &str) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(self.ack.command(id, name));
        }
    }

    /// Simulate the session dropping its inbound command stream.
    pub fn close_commands(&mut self) {
        self.commands = None;
    }

    pub fn registrations(&self) -> Vec<DeviceRegistration> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Returns the queued values in order, then repeats the last one.
pub struct StubSensor {
    values: VecDeque<f64>,
    last: f64,
}

impl StubSensor {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            last: 0.0,
        }
    }
}

#[async_trait]
impl TemperatureSensor for StubSensor {
    async fn read(&mut self) -> Reading {
        if let Some(value) = self.values.pop_front() {
            self.last = value;
        }

        Reading::now(self.last)
    }
}
