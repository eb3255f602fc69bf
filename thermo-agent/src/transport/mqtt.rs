use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::tokio_rustls::rustls::{ClientConfig, RootCertStore};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use rustls_pemfile::{Item, certs, read_one};
use thermo_api::models::{CommandRecord, CommandUpdate, DeviceRegistration, Notification};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use super::{Command, CommandAck, DeviceHandle, Session};
use crate::configs::settings::{Server, ServerTls};
use crate::errors::TransportError;
use crate::identity::DeviceIdentity;

const PLAIN_PORT: u16 = 1883;
const TLS_PORT: u16 = 8883;

/// Broker address parsed from the configured server url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::InvalidUrl(url.to_string());

        let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
        let secure = match scheme.to_ascii_lowercase().as_str() {
            "mqtt" | "tcp" => false,
            "mqtts" | "ssl" => true,
            _ => return Err(invalid()),
        };

        let authority = rest.split('/').next().unwrap_or_default();
        // Credentials come from settings, never from the url.
        let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

        let (host, port) = match authority.strip_prefix('[') {
            Some(bracketed) => {
                let (host, tail) = bracketed.split_once(']').ok_or_else(invalid)?;
                match tail {
                    "" => (host, None),
                    _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
                }
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };

        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None if secure => TLS_PORT,
            None => PLAIN_PORT,
        };

        if host.is_empty() || (host.contains(':') && !authority.starts_with('[')) {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            port,
            secure,
        })
    }
}

/// Topic layout for one device.
#[derive(Debug, Clone)]
pub struct Topics {
    pub device: String,
    pub notification: String,
    pub command_insert: String,
    pub command_update: String,
}

impl Topics {
    pub fn new(device_id: &str) -> Self {
        let base = format!("devicehive/{device_id}");

        Self {
            device: format!("{base}/device"),
            notification: format!("{base}/notification"),
            command_insert: format!("{base}/command/insert"),
            command_update: format!("{base}/command/update"),
        }
    }

    pub fn notification(&self, kind: &str) -> String {
        format!("{}/{kind}", self.notification)
    }
}

fn tls_config(auth: Option<&ServerTls>) -> Result<ClientConfig, TransportError> {
    let mut root_cert_store = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for e in &native.errors {
        warn!("Failed to load native certificate: {}", e);
    }
    root_cert_store.add_parsable_certificates(native.certs);

    let builder = ClientConfig::builder().with_root_certificates(root_cert_store);

    let Some(auth) = auth else {
        return Ok(builder.with_no_client_auth());
    };

    let certs = certs(&mut BufReader::new(File::open(&auth.cert_path)?))
        .collect::<Result<Vec<_>, _>>()?;
    let mut key_buffer = BufReader::new(File::open(&auth.key_path)?);
    let key = loop {
        match read_one(&mut key_buffer)? {
            Some(Item::Sec1Key(key)) => break key.into(),
            Some(Item::Pkcs1Key(key)) => break key.into(),
            Some(Item::Pkcs8Key(key)) => break key.into(),
            None => {
                return Err(TransportError::Tls(
                    "no keys found or encrypted keys not supported".into(),
                ));
            }
            _ => {}
        }
    };

    builder
        .with_client_auth_cert(certs, key)
        .map_err(|e| TransportError::Tls(e.to_string()))
}

struct MqttCommandAck {
    client: AsyncClient,
    topic: String,
}

#[async_trait]
impl CommandAck for MqttCommandAck {
    async fn acknowledge(&self, update: &CommandUpdate) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(update)?;

        self.client
            .publish(&self.topic, QoS::AtLeastOnce, false, payload)
            .await?;

        Ok(())
    }
}

/// Session over an MQTT broker. The network event loop runs in its own task
/// and ends at the first connection error, which closes the command stream.
pub struct MqttSession {
    client: AsyncClient,
    device_id: String,
    topics: Topics,
    commands: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
}

impl MqttSession {
    pub fn connect(server: &Server, identity: &DeviceIdentity) -> Result<Self, TransportError> {
        let endpoint = Endpoint::parse(&server.url)?;
        let device_id = identity.to_string();
        let topics = Topics::new(&device_id);

        let mut options = MqttOptions::new(&device_id, &endpoint.host, endpoint.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_credentials(&device_id, &server.refresh_token);

        if endpoint.secure {
            let tls_config = tls_config(server.tls.as_ref())?;
            options.set_transport(Transport::Tls(TlsConfiguration::from(tls_config)));
        }

        let (client, event_loop) = AsyncClient::new(options, 10);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let ack: Arc<dyn CommandAck> = Arc::new(MqttCommandAck {
            client: client.clone(),
            topic: topics.command_update.clone(),
        });

        tokio::spawn(Self::drive(
            event_loop,
            topics.command_insert.clone(),
            ack,
            command_tx,
        ));

        debug!("MQTT session for {} at {}:{}", device_id, endpoint.host, endpoint.port);

        Ok(Self {
            client,
            device_id,
            topics,
            commands: Mutex::new(Some(command_rx)),
        })
    }

    /// Polls the connection. Never waits on the command consumer: acknowledgements
    /// published by the consumer are only flushed while this loop keeps polling.
    async fn drive(
        mut event_loop: EventLoop,
        command_topic: String,
        ack: Arc<dyn CommandAck>,
        commands: mpsc::UnboundedSender<Command>,
    ) {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => info!("Connected to broker"),
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == command_topic => {
                    match serde_json::from_slice::<CommandRecord>(&publish.payload) {
                        Ok(record) => {
                            if commands.send(Command::new(record, Arc::clone(&ack))).is_err() {
                                debug!("Command receiver dropped, stopping event loop");
                                break;
                            }
                        }
                        Err(e) => warn!("Ignoring malformed command: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT error: {}", e);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl Session for MqttSession {
    type Device = MqttDevice;

    async fn register_device(
        &self,
        registration: &DeviceRegistration,
    ) -> Result<Self::Device, TransportError> {
        self.client
            .subscribe(&self.topics.command_insert, QoS::AtLeastOnce)
            .await?;

        self.client
            .publish(
                &self.topics.device,
                QoS::AtLeastOnce,
                true,
                serde_json::to_vec(registration)?,
            )
            .await?;

        debug!("Registered device {}", registration.id);

        Ok(MqttDevice {
            client: self.client.clone(),
            device_id: self.device_id.clone(),
            topics: self.topics.clone(),
            commands: Mutex::new(self.commands.lock().await.take()),
        })
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.client.disconnect().await?;

        Ok(())
    }
}

pub struct MqttDevice {
    client: AsyncClient,
    device_id: String,
    topics: Topics,
    commands: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
}

#[async_trait]
impl DeviceHandle for MqttDevice {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn send_notification(
        &self,
        kind: &str,
        notification: &Notification,
    ) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(notification)?;

        self.client
            .publish(self.topics.notification(kind), QoS::AtLeastOnce, false, payload)
            .await?;

        Ok(())
    }

    async fn subscribe_insert_commands(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<Command>, TransportError> {
        self.commands
            .lock()
            .await
            .take()
            .ok_or(TransportError::AlreadySubscribed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_endpoint() {
        let endpoint = Endpoint::parse("mqtt://broker.local:1884").unwrap();

        assert_eq!(endpoint.host, "broker.local");
        assert_eq!(endpoint.port, 1884);
        assert!(!endpoint.secure);
    }

    #[test]
    fn test_parse_endpoint_default_ports() {
        assert_eq!(Endpoint::parse("tcp://broker.local").unwrap().port, 1883);

        let secure = Endpoint::parse("mqtts://playground.devicehive.com/api").unwrap();
        assert_eq!(secure.host, "playground.devicehive.com");
        assert_eq!(secure.port, 8883);
        assert!(secure.secure);
    }

    #[test]
    fn test_parse_invalid_endpoint() {
        assert!(Endpoint::parse("broker.local:1883").is_err());
        assert!(Endpoint::parse("http://broker.local").is_err());
        assert!(Endpoint::parse("mqtt://:1883").is_err());
        assert!(Endpoint::parse("mqtt://broker.local:port").is_err());
    }

    #[test]
    fn test_parse_endpoint_with_userinfo() {
        let endpoint = Endpoint::parse("mqtt://user:pw@broker.local:1884").unwrap();

        assert_eq!(endpoint.host, "broker.local");
        assert_eq!(endpoint.port, 1884);

        assert_eq!(Endpoint::parse("mqtts://user@broker.local").unwrap().port, 8883);
    }

    #[test]
    fn test_parse_ipv6_endpoint() {
        let endpoint = Endpoint::parse("mqtt://[::1]:1884").unwrap();
        assert_eq!(endpoint.host, "::1");
        assert_eq!(endpoint.port, 1884);

        let endpoint = Endpoint::parse("mqtts://[fe80::1]").unwrap();
        assert_eq!(endpoint.host, "fe80::1");
        assert_eq!(endpoint.port, 8883);

        assert!(Endpoint::parse("mqtt://[::1").is_err());
        assert!(Endpoint::parse("mqtt://[::1]1883").is_err());
        assert!(Endpoint::parse("mqtt://[]:1883").is_err());
        assert!(Endpoint::parse("mqtt://::1:1883").is_err());
    }

    #[test]
    fn test_topics() {
        let topics = Topics::new("raspi-thermo-0123abcd");

        assert_eq!(topics.device, "devicehive/raspi-thermo-0123abcd/device");
        assert_eq!(
            topics.notification("temperature"),
            "devicehive/raspi-thermo-0123abcd/notification/temperature"
        );
        assert_eq!(topics.command_insert, "devicehive/raspi-thermo-0123abcd/command/insert");
        assert_eq!(topics.command_update, "devicehive/raspi-thermo-0123abcd/command/update");
    }
}
