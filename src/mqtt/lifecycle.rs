//! Connection lifecycle controller shared by both pages.
//!
//! # State Machine
//!
//! ```text
//!                  connect
//!   Disconnected ──────────► Connected
//!     ▲     │ ▲                 │
//!     │     │ └─────────────────┘
//!     │     │       close
//!     │     ▼ reconnect (attempt += 1)
//!    Reconnecting
//!     │  ▲
//!     └──┘ close / reconnect
//! ```
//!
//! States follow the transport's events only. `error` is shown to the operator but leaves
//! the state alone, the paired `close` moves it. The controller owns the one live session;
//! starting a new one always terminates the previous session first.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::message::SensorReading;
use super::transport::{SessionOptions, Transport, TransportEvent, TransportSession};
use crate::config::BrokerConfig;
use crate::ui::presenter::{ConnectionInfo, Presenter, Severity};

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Reconnecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Reconnecting => "Reconnecting...",
            ConnectionState::Connected => "Connected",
        };
        write!(f, "{}", label)
    }
}

/// What a handled transport event meant for the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleNotice {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32 },
    Error(String),
    Message(SensorReading),
}

/// `<prefix>-<8 hex digits>`, new for every session.
pub fn generate_client_id(prefix: &str) -> String {
    let suffix: u32 = rand::rng().random();
    format!("{}-{:08x}", prefix, suffix)
}

pub struct LifecycleController<T: Transport> {
    transport: T,
    broker: BrokerConfig,
    client_prefix: String,
    presenter: Arc<dyn Presenter>,
    state: ConnectionState,
    reconnect_attempts: u32,
    session: Option<T::Session>,
    events: Option<mpsc::Receiver<TransportEvent>>,
    pending_restart: Option<Instant>,
}

impl<T: Transport> LifecycleController<T> {
    pub fn new(
        transport: T,
        broker: BrokerConfig,
        client_prefix: impl Into<String>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            transport,
            broker,
            client_prefix: client_prefix.into(),
            presenter,
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            session: None,
            events: None,
            pending_restart: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    pub fn session(&self) -> Option<&T::Session> {
        self.session.as_ref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.client_id())
    }

    pub fn restart_deadline(&self) -> Option<Instant> {
        self.pending_restart
    }

    /// Opens a new session with a fresh client id, replacing any existing one.
    pub fn start(&mut self) {
        self.pending_restart = None;
        self.teardown();

        let client_id = generate_client_id(&self.client_prefix);
        let options = SessionOptions {
            url: self.broker.ws_url(),
            port: self.broker.port,
            client_id: client_id.clone(),
            clean_session: true,
            reconnect_period: self.broker.reconnect_period(),
            keep_alive: self.broker.keep_alive(),
        };

        self.presenter.set_connection_info(ConnectionInfo {
            host: self.broker.host.clone(),
            port: self.broker.port,
            client_id: client_id.clone(),
            reconnect_period: self.broker.reconnect_period(),
        });

        match self.transport.connect(&options) {
            Ok((session, events)) => {
                info!("Started MQTT session {} for {}", client_id, options.url);
                self.session = Some(session);
                self.events = Some(events);
            }
            Err(e) => {
                error!("Failed to start MQTT session: {}", e);
                self.set_state(ConnectionState::Disconnected);
                self.presenter.set_reconnect_enabled(true);
                self.presenter
                    .append_log(format!("Failed to connect: {}", e), Severity::Error);
            }
        }
    }

    /// Tears the current session down and schedules [`start`](Self::start) after the
    /// manual reconnect delay. Returns `false` if a restart is already pending.
    pub fn manual_reconnect(&mut self) -> bool {
        if self.pending_restart.is_some() {
            debug!("Manual reconnect already pending, ignoring request");
            return false;
        }

        info!("Manual reconnect requested");
        self.presenter.set_reconnect_enabled(false);
        self.teardown();
        self.pending_restart = Some(Instant::now() + self.broker.manual_reconnect_delay());
        true
    }

    /// Graceful end of the live session when the page closes. Waits until the session has
    /// sent its DISCONNECT or given up on it.
    pub async fn shutdown(&mut self) {
        self.pending_restart = None;
        self.events = None;
        if let Some(session) = self.session.take() {
            info!("Closing MQTT session {}", session.client_id());
            let _ = session.terminate(false).await;
        }
    }

    /// Next event of the live session. Pends forever while there is none.
    pub async fn recv_event(&mut self) -> Option<TransportEvent> {
        let Some(events) = self.events.as_mut() else {
            return std::future::pending().await;
        };

        let event = events.recv().await;
        if event.is_none() {
            warn!("MQTT event stream ended");
            self.events = None;
        }
        event
    }

    pub fn handle_event(&mut self, event: TransportEvent) -> LifecycleNotice {
        match event {
            TransportEvent::Connect => {
                info!("Connected to MQTT broker");
                self.reconnect_attempts = 0;
                self.set_state(ConnectionState::Connected);
                self.presenter.set_reconnect_info(0);
                self.presenter.set_reconnect_enabled(false);
                LifecycleNotice::Connected
            }
            TransportEvent::Close => {
                info!("MQTT connection closed");
                self.set_state(ConnectionState::Disconnected);
                self.presenter
                    .set_reconnect_enabled(self.pending_restart.is_none());
                LifecycleNotice::Disconnected
            }
            TransportEvent::Reconnect => {
                self.reconnect_attempts += 1;
                info!("Reconnecting... (attempt {})", self.reconnect_attempts);
                self.set_state(ConnectionState::Reconnecting);
                self.presenter.set_reconnect_info(self.reconnect_attempts);
                self.presenter.set_reconnect_enabled(false);
                LifecycleNotice::Reconnecting {
                    attempt: self.reconnect_attempts,
                }
            }
            TransportEvent::Error(message) => {
                warn!("MQTT error: {}", message);
                self.presenter.set_status(ConnectionState::Disconnected);
                self.presenter
                    .set_reconnect_enabled(self.pending_restart.is_none());
                self.presenter
                    .append_log(format!("Error: {}", message), Severity::Error);
                LifecycleNotice::Error(message)
            }
            TransportEvent::Message { topic, payload } => {
                let reading = SensorReading::from_bytes(topic, &payload);
                debug!("Message received: {}", reading);
                LifecycleNotice::Message(reading)
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.presenter.set_status(state);
    }

    /// Forced termination of the live session, reported like a close.
    fn teardown(&mut self) {
        self.events = None;
        if let Some(session) = self.session.take() {
            debug!("Disposing of MQTT session {}", session.client_id());
            // Forced, nothing to wait for
            drop(session.terminate(true));
            self.set_state(ConnectionState::Disconnected);
        }
    }
}
