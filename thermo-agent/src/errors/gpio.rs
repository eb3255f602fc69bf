use std::io;

#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[error("Failed to export gpio {pin}: {source}")]
    Export { pin: u32, source: io::Error },

    #[error("Failed to set gpio {pin} direction: {source}")]
    Direction { pin: u32, source: io::Error },

    #[error("Failed to write gpio {pin} value: {source}")]
    Value { pin: u32, source: io::Error },
}
