use std::sync::Arc;

use thermo_api::models::DeviceRegistration;
use tokio::sync::watch;
use tracing::{error, info};

use crate::configs::Settings;
use crate::errors::{AgentError, TransportError};
use crate::gpio::{Gpio, PinMode};
use crate::identity::DeviceIdentity;
use crate::sensor::{TemperatureSensor, W1TempSensor};
use crate::services::{CommandDispatcher, ReportingService};
use crate::transport::{DeviceHandle, MqttSession, Session};

pub mod configs;
pub mod errors;
pub mod gpio;
pub mod identity;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod sensor;
pub mod services;
pub mod transport;

pub async fn run(settings: &Arc<Settings>) -> Result<(), AgentError> {
    let identity = DeviceIdentity::new(&settings.device.base_id, &settings.server.refresh_token);

    info!("Connecting to {}", settings.server.url);
    info!("DeviceId: {}", identity);

    let gpio = gpio::probe(&settings.gpio);
    let sensor = W1TempSensor::discover(&settings.sensor.devices_dir, &settings.sensor.family_prefix);
    let session = MqttSession::connect(&settings.server, &identity)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Unable to listen for shutdown signal: {}", e);
                // Dropping the sender would stop the agent.
                std::future::pending::<()>().await;
            }
        }
    });

    let result = serve(settings, &identity, &session, sensor, gpio, shutdown_rx).await;

    if let Err(e) = session.disconnect().await {
        error!("Failed to disconnect: {}", e);
    }

    result
}

/// Register the device, start reporting and handle commands until shutdown.
///
/// Returns an error when the reporting task fails or the session closes its command stream.
pub async fn serve<S, T>(
    settings: &Settings,
    identity: &DeviceIdentity,
    session: &S,
    sensor: T,
    gpio: Arc<dyn Gpio>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AgentError>
where
    S: Session,
    T: TemperatureSensor + 'static,
{
    let led_pin = settings.gpio.led_pin;
    gpio.setup(led_pin, PinMode::Output).await?;
    gpio.output(led_pin, 0).await?;

    let registration = DeviceRegistration {
        id: identity.to_string(),
        name: identity.to_string(),
        device_type: settings.device.device_type.clone(),
    };
    let device = Arc::new(session.register_device(&registration).await?);
    let mut commands = device.subscribe_insert_commands().await?;

    info!("Connected as {}", device.device_id());

    let reporting = ReportingService::new(settings, identity, sensor, Arc::clone(&device));
    let mut reporting_task = tokio::spawn(reporting.run(shutdown.clone()));

    let dispatcher = CommandDispatcher::new(gpio, led_pin);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            command = commands.recv() => match command {
                Some(mut command) => dispatcher.handle(&mut command).await,
                None => {
                    reporting_task.abort();
                    return Err(TransportError::Closed.into());
                }
            },
            joined = &mut reporting_task => return finish(joined),
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    finish(reporting_task.await)
}

fn finish(
    joined: Result<Result<(), TransportError>, tokio::task::JoinError>,
) -> Result<(), AgentError> {
    Ok(joined??)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_maps_errors() {
        assert!(finish(Ok(Ok(()))).is_ok());
        assert!(matches!(
            finish(Ok(Err(TransportError::Closed))),
            Err(AgentError::Transport(TransportError::Closed))
        ));
    }
}
