use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::warn;

use super::{Gpio, PinMode};
use crate::errors::GpioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioOperation {
    Setup { pin: u32, mode: PinMode },
    Output { pin: u32, value: u8 },
}

/// Stand-in for hosts without GPIO hardware: records and logs every operation.
#[derive(Debug, Default)]
pub struct LoggingGpio {
    history: Mutex<Vec<GpioOperation>>,
}

impl LoggingGpio {
    pub fn new() -> Self {
        warn!("Fake gpio initialized");
        Self::default()
    }

    /// Operations performed so far, oldest first
    pub fn history(&self) -> Vec<GpioOperation> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, operation: GpioOperation) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operation);
    }
}

#[async_trait]
impl Gpio for LoggingGpio {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn setup(&self, pin: u32, mode: PinMode) -> Result<(), GpioError> {
        warn!("Set gpio {}; Mode: {};", pin, mode);
        self.record(GpioOperation::Setup { pin, mode });
        Ok(())
    }

    async fn output(&self, pin: u32, value: u8) -> Result<(), GpioError> {
        warn!("Set gpio {}; Value: {};", pin, value);
        self.record(GpioOperation::Output { pin, value });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_output_is_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let gpio = LoggingGpio::new();
        gpio.output(17, 1).await.unwrap();

        let contents = logs.contents();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("Set gpio 17; Value: 1;"));
    }

    #[tokio::test]
    async fn test_output_is_recorded() {
        let gpio = LoggingGpio::new();

        gpio.output(17, 1).await.unwrap();

        assert_eq!(gpio.history(), vec![GpioOperation::Output { pin: 17, value: 1 }]);
    }

    #[tokio::test]
    async fn test_operations_keep_order() {
        let gpio = LoggingGpio::new();

        gpio.setup(17, PinMode::Output).await.unwrap();
        gpio.output(17, 0).await.unwrap();
        gpio.output(17, 1).await.unwrap();

        assert_eq!(
            gpio.history(),
            vec![
                GpioOperation::Setup { pin: 17, mode: PinMode::Output },
                GpioOperation::Output { pin: 17, value: 0 },
                GpioOperation::Output { pin: 17, value: 1 },
            ]
        );
    }
}
