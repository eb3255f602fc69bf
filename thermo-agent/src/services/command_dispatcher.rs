use std::sync::Arc;

use thermo_api::models::{STATUS_OK, STATUS_UNKNOWN_COMMAND};
use tracing::{error, info};

use crate::gpio::Gpio;
use crate::transport::Command;

pub const LED_ON: &str = "led/on";
pub const LED_OFF: &str = "led/off";

/// Maps inbound commands onto the indicator pin.
pub struct CommandDispatcher {
    gpio: Arc<dyn Gpio>,
    led_pin: u32,
}

impl CommandDispatcher {
    pub fn new(gpio: Arc<dyn Gpio>, led_pin: u32) -> Self {
        Self { gpio, led_pin }
    }

    /// Execute the command, set its status and acknowledge it once.
    pub async fn handle(&self, command: &mut Command) {
        info!("Command {} `{}` received", command.id(), command.name());

        let status = match command.name() {
            LED_ON => self.switch_led(1).await,
            LED_OFF => self.switch_led(0).await,
            _ => STATUS_UNKNOWN_COMMAND.to_string(),
        };

        command.status = Some(status);

        if let Err(e) = command.save().await {
            error!("Failed to acknowledge command {}: {}", command.id(), e);
        }
    }

    async fn switch_led(&self, value: u8) -> String {
        match self.gpio.output(self.led_pin, value).await {
            Ok(()) => STATUS_OK.to_string(),
            Err(e) => {
                error!("{}", e);
                format!("Error: {e}")
            }
        }
    }
}
