use std::io;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid server url `{0}`")]
    InvalidUrl(String),

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Command stream already taken")]
    AlreadySubscribed,

    #[error("Session closed")]
    Closed,
}
