pub mod gpio;
pub mod transport;

pub use gpio::GpioError;
pub use transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Gpio(#[from] GpioError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
