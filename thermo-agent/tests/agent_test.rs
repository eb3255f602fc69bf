use std::sync::Arc;
use std::time::Duration;

use thermo_agent::errors::{AgentError, TransportError};
use thermo_agent::gpio::{Gpio, GpioOperation, PinMode};
use thermo_agent::mock::{MockSession, StubSensor};
use thermo_agent::serve;
use tokio::sync::watch;

mod common;
use common::mock_app::{LED_PIN, MockApp};

#[tokio::test(start_paused = true)]
async fn test_serve_reports_and_handles_commands() {
    let MockApp {
        settings,
        identity,
        session,
        mut remote,
        gpio,
    } = MockApp::new(5);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let agent = serve(
        &settings,
        &identity,
        &session,
        StubSensor::new([21.5]),
        gpio.clone() as Arc<dyn Gpio>,
        shutdown_rx,
    );

    let service = async {
        let first = remote.notifications.recv().await.unwrap();

        remote.insert_command(1, "led/on").await;
        remote.insert_command(2, "led/dance").await;
        while remote.ack.updates().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.send(true).unwrap();
        first
    };

    let (result, first) = tokio::join!(agent, service);

    result.unwrap();

    assert_eq!(first.notification.id, identity.as_str());
    assert_eq!(first.notification.parameters.value, 21.5);

    let registrations = remote.registrations();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].id, identity.as_str());
    assert_eq!(registrations[0].device_type, "Thermostats");

    assert_eq!(
        gpio.history(),
        vec![
            GpioOperation::Setup { pin: LED_PIN, mode: PinMode::Output },
            GpioOperation::Output { pin: LED_PIN, value: 0 },
            GpioOperation::Output { pin: LED_PIN, value: 1 },
        ]
    );

    let updates = remote.ack.updates();
    assert_eq!(updates[0].status, "Ok");
    assert_eq!(updates[1].status, "Unknown command");
}

#[tokio::test]
async fn test_serve_fails_when_command_stream_closes() {
    let MockApp {
        settings,
        identity,
        session,
        mut remote,
        gpio,
    } = MockApp::new(3600);
    remote.close_commands();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = serve(&settings, &identity, &session, StubSensor::new([20.0]), gpio, shutdown_rx).await;

    assert!(matches!(result, Err(AgentError::Transport(TransportError::Closed))));
}

#[tokio::test]
async fn test_serve_fails_when_reporting_fails() {
    let app = MockApp::new(3600);
    let (session, _remote) = MockSession::new();
    let session = session.with_failing_sends();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = serve(
        &app.settings,
        &app.identity,
        &session,
        StubSensor::new([20.0]),
        app.gpio,
        shutdown_rx,
    )
    .await;

    assert!(matches!(result, Err(AgentError::Transport(TransportError::Closed))));
}
