//! MQTT broker adapter.
//!
//! Connects over TCP, subscribes to the configured topic, and forwards
//! each non-empty publish into the event queue. Session drops and
//! connect failures are retried forever at the configured fixed delays.
//! The publish capability (absent on the serial transport) is exposed as
//! a separate cloneable object rather than a trait method.

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::{RawMessage, TransportKind};

use crate::config::{BrokerConfig, QosLevel};
use crate::queue::QueuePusher;
use crate::supervisor::{ConnectionSupervisor, FailureKind, RetryPolicy};

use super::{TransportError, TransportHandle};

/// MQTT keep-alive interval.
const KEEP_ALIVE: std::time::Duration = std::time::Duration::from_secs(60);

/// Capacity of the rumqttc request channel (subscribe/publish commands).
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Grace period for the broker to ack the final disconnect.
const DISCONNECT_GRACE: std::time::Duration = std::time::Duration::from_millis(250);

/// Outbound publish capability of the broker adapter.
///
/// Cheap to clone; safe to hold after the adapter shuts down (publishes
/// then fail with `PublishFailed`).
#[derive(Clone)]
pub struct BrokerPublisher {
    client: AsyncClient,
    qos: QoS,
}

impl BrokerPublisher {
    /// Publishes a payload to the given topic at the adapter's QoS.
    pub async fn publish(
        &self,
        topic: &str,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), TransportError> {
        self.client
            .publish(topic, self.qos, false, payload.into())
            .await
            .map_err(|e| TransportError::PublishFailed {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Spawns the broker reception loop and returns its handle.
pub fn spawn_broker_adapter(cfg: BrokerConfig, queue: QueuePusher) -> TransportHandle {
    let cancel = CancellationToken::new();
    let policy = RetryPolicy {
        reconnect_delay: cfg.reconnect_delay(),
        init_retry_delay: cfg.init_retry_delay(),
    };
    let (supervisor, state_rx) = ConnectionSupervisor::new(TransportKind::Broker, policy);

    // Unique client id per process: brokers kick duplicate ids, which
    // would otherwise turn a restart race into a reconnect loop.
    let client_id = format!("{}-{}", cfg.client_id, std::process::id());
    let mut options = MqttOptions::new(client_id, cfg.address.clone(), cfg.port);
    options.set_keep_alive(KEEP_ALIVE);
    options.set_clean_session(true);

    let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

    let publisher = BrokerPublisher {
        client: client.clone(),
        qos: qos_of(cfg.qos),
    };

    let task = tokio::spawn(run_reception_loop(
        cfg,
        client,
        event_loop,
        supervisor,
        queue,
        cancel.clone(),
    ));

    TransportHandle::new(
        TransportKind::Broker,
        cancel,
        state_rx,
        Some(publisher),
        task,
    )
}

async fn run_reception_loop(
    cfg: BrokerConfig,
    client: AsyncClient,
    mut event_loop: EventLoop,
    mut supervisor: ConnectionSupervisor,
    queue: QueuePusher,
    cancel: CancellationToken,
) {
    let qos = qos_of(cfg.qos);
    let mut session_up = false;

    info!(
        address = %cfg.address,
        port = cfg.port,
        topic = %cfg.subscribe_topic,
        "Broker adapter started"
    );
    supervisor.connecting();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    match client.subscribe(cfg.subscribe_topic.clone(), qos).await {
                        Ok(()) => {
                            supervisor.connected();
                            session_up = true;
                            info!(topic = %cfg.subscribe_topic, qos = ?qos, "Subscribed");
                        }
                        Err(e) => {
                            // Request channel trouble; the next reconnect
                            // cycle produces a fresh ConnAck to retry on.
                            warn!(error = %e, "Subscribe request failed");
                        }
                    }
                }

                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if publish.payload.is_empty() {
                        debug!(topic = %publish.topic, "Ignoring empty publish");
                    } else {
                        let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                        debug!(topic = %publish.topic, payload = %payload, "Message received");
                        queue.push(RawMessage::new(
                            publish.topic.clone(),
                            payload,
                            TransportKind::Broker,
                        ));
                    }
                }

                Ok(_) => {}

                Err(e) => {
                    let kind = if session_up {
                        FailureKind::ConnectionLost
                    } else {
                        FailureKind::InitFailure
                    };
                    session_up = false;
                    warn!(error = %e, "Broker connection error");

                    let delay = supervisor.retry_after(kind);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = sleep(delay) => supervisor.connecting(),
                    }
                }
            }
        }
    }

    // Graceful teardown: unsubscribe, disconnect, and give the event
    // loop a moment to flush both before dropping the connection.
    let _ = client.unsubscribe(cfg.subscribe_topic.clone()).await;
    let _ = client.disconnect().await;
    let _ = timeout(DISCONNECT_GRACE, drain_until_error(&mut event_loop)).await;

    supervisor.disconnected();
    info!("Broker adapter stopped");
}

async fn drain_until_error(event_loop: &mut EventLoop) {
    while event_loop.poll().await.is_ok() {}
}

fn qos_of(level: QosLevel) -> QoS {
    match level {
        QosLevel::AtMostOnce => QoS::AtMostOnce,
        QosLevel::AtLeastOnce => QoS::AtLeastOnce,
        QosLevel::ExactlyOnce => QoS::ExactlyOnce,
    }
}
