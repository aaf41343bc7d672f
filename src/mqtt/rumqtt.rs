//! `rumqttc` backed transport over WebSocket.
//!
//! Every session gets its own event loop task (the pump). The pump translates `rumqttc`
//! packets into [`TransportEvent`]s and drives the fixed-period retry the pages rely on:
//! after a connection error it reports `Error` and `Close`, waits the reconnect period,
//! reports `Reconnect` and polls again, which makes `rumqttc` dial the broker anew.
//!
//! ## Termination
//!
//! ```text
//! terminate(force = true)   shutdown token ──► pump stops at once
//! terminate(force = false)  try_disconnect + closing token ──► pump keeps polling until
//!                           Outgoing::Disconnect, an error or DISCONNECT_GRACE, then stops
//! ```
//!
//! Either way the [`Stopped`] receiver resolves when the pump task finishes.

use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::transport::{
    Completion, PublishRequest, SessionOptions, Stopped, Transport, TransportEvent,
    TransportSession,
};
use crate::error::{ConnectivityError, DeliveryError};

const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Upper bound for flushing the DISCONNECT of a graceful termination.
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct RumqttTransport {
    channel_capacity: usize,
}

impl Default for RumqttTransport {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

pub struct RumqttSession {
    client_id: String,
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
    closing: CancellationToken,
    stopped: Stopped,
}

/// What the pump polls. Implemented by `rumqttc`'s [`EventLoop`].
pub trait EventSource: Send {
    fn next_event(&mut self) -> impl Future<Output = Result<Event, ConnectionError>> + Send;
}

impl EventSource for EventLoop {
    fn next_event(&mut self) -> impl Future<Output = Result<Event, ConnectionError>> + Send {
        self.poll()
    }
}

/// Everything a pump shares with its session.
pub struct PumpLink {
    pub events: mpsc::Sender<TransportEvent>,
    pub connected: Arc<AtomicBool>,
    pub shutdown: CancellationToken,
    pub closing: CancellationToken,
    pub reconnect_period: Duration,
    /// Dropped when the pump returns
    pub stopped: oneshot::Sender<()>,
}

/// Builds `rumqttc` options, rejecting input `MqttOptions::new` would panic on.
pub fn mqtt_options(options: &SessionOptions) -> Result<MqttOptions, ConnectivityError> {
    if options.client_id.is_empty() || options.client_id.starts_with(' ') {
        return Err(ConnectivityError::InvalidEndpoint {
            endpoint: options.url.clone(),
            reason: format!("invalid client id {:?}", options.client_id),
        });
    }

    let host = options
        .url
        .strip_prefix("ws://")
        .map(|rest| rest.split(['/', ':']).next().unwrap_or_default())
        .unwrap_or_default();
    if host.is_empty() {
        return Err(ConnectivityError::InvalidEndpoint {
            endpoint: options.url.clone(),
            reason: "expected ws://<host>:<port>".to_string(),
        });
    }

    let mut mqtt_options =
        MqttOptions::new(options.client_id.clone(), options.url.clone(), options.port);
    mqtt_options
        .set_transport(rumqttc::Transport::Ws)
        .set_clean_session(options.clean_session)
        .set_keep_alive(options.keep_alive);

    Ok(mqtt_options)
}

impl Transport for RumqttTransport {
    type Session = RumqttSession;

    fn connect(
        &self,
        options: &SessionOptions,
    ) -> Result<(RumqttSession, mpsc::Receiver<TransportEvent>), ConnectivityError> {
        let mqtt_options = mqtt_options(options)?;
        let (client, eventloop) = AsyncClient::new(mqtt_options, self.channel_capacity);
        let (events_tx, events_rx) = mpsc::channel(self.channel_capacity);
        let (stopped_tx, stopped_rx) = oneshot::channel();

        let connected = Arc::new(AtomicBool::new(false));
        let shutdown = CancellationToken::new();
        let closing = CancellationToken::new();

        info!("Connecting {} to {}", options.client_id, options.url);
        tokio::spawn(pump(
            eventloop,
            PumpLink {
                events: events_tx,
                connected: connected.clone(),
                shutdown: shutdown.clone(),
                closing: closing.clone(),
                reconnect_period: options.reconnect_period,
                stopped: stopped_tx,
            },
        ));

        let session = RumqttSession {
            client_id: options.client_id.clone(),
            client,
            connected,
            shutdown,
            closing,
            stopped: stopped_rx,
        };
        Ok((session, events_rx))
    }
}

impl TransportSession for RumqttSession {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self, topic: &str) -> Completion {
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            let result = client
                .subscribe(topic.as_str(), QoS::AtMostOnce)
                .await
                .map_err(|e| DeliveryError::Rejected {
                    topic,
                    reason: e.to_string(),
                });
            let _ = tx.send(result);
        });
        rx
    }

    fn publish(&self, request: PublishRequest) -> Completion {
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        tokio::spawn(async move {
            let PublishRequest { topic, value } = request;
            let result = client
                .publish(topic.as_str(), QoS::AtMostOnce, false, value.into_bytes())
                .await
                .map_err(|e| DeliveryError::Rejected {
                    topic,
                    reason: e.to_string(),
                });
            let _ = tx.send(result);
        });
        rx
    }

    fn terminate(self, force: bool) -> Stopped {
        debug!("Terminating session {} (force: {})", self.client_id, force);
        self.connected.store(false, Ordering::SeqCst);

        if force {
            self.shutdown.cancel();
            return self.stopped;
        }

        match self.client.try_disconnect() {
            Ok(()) => self.closing.cancel(),
            Err(e) => {
                warn!("Graceful disconnect of {} failed: {}", self.client_id, e);
                self.shutdown.cancel();
            }
        }
        self.stopped
    }
}

async fn emit(events: &mpsc::Sender<TransportEvent>, event: TransportEvent) -> bool {
    events.send(event).await.is_ok()
}

/// Runs a session's event loop until it is terminated or its event receiver is dropped.
pub async fn pump<S: EventSource>(mut source: S, link: PumpLink) {
    let PumpLink {
        events,
        connected,
        shutdown,
        closing,
        reconnect_period,
        stopped: _stopped,
    } = link;

    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = closing.cancelled() => break,
            polled = source.next_event() => polled,
        };

        let delivered = match polled {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!("ConnAck received: {:?}", ack.code);
                connected.store(true, Ordering::SeqCst);
                emit(&events, TransportEvent::Connect).await
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let event = TransportEvent::Message {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                emit(&events, event).await
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                connected.store(false, Ordering::SeqCst);
                emit(&events, TransportEvent::Close).await
            }
            Ok(event) => {
                trace!("MQTT event: {:?}", event);
                true
            }
            Err(e) => {
                connected.store(false, Ordering::SeqCst);
                warn!("MQTT connection error: {}", e);
                if !emit(&events, TransportEvent::Error(e.to_string())).await
                    || !emit(&events, TransportEvent::Close).await
                {
                    break;
                }

                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    // the connection is already down, there is nothing to disconnect
                    _ = closing.cancelled() => return,
                    _ = tokio::time::sleep(reconnect_period) => {}
                }
                emit(&events, TransportEvent::Reconnect).await
            }
        };

        // Receiver gone: the session was replaced or is closing
        if !delivered {
            break;
        }
    }

    if closing.is_cancelled() && !shutdown.is_cancelled() {
        let flushed = tokio::select! {
            _ = shutdown.cancelled() => false,
            flushed = tokio::time::timeout(DISCONNECT_GRACE, flush_disconnect(&mut source)) => {
                flushed.is_ok()
            }
        };
        if !flushed {
            warn!("DISCONNECT not confirmed within {:?}", DISCONNECT_GRACE);
        }
    }
    debug!("MQTT event pump stopped");
}

/// Polls until the queued DISCONNECT has been written or the connection fails.
async fn flush_disconnect<S: EventSource>(source: &mut S) {
    loop {
        match source.next_event().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("DISCONNECT sent");
                return;
            }
            Ok(event) => trace!("MQTT event while closing: {:?}", event),
            Err(e) => {
                debug!("Connection ended while closing: {}", e);
                return;
            }
        }
    }
}
