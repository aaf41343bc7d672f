//! Capability interface over the MQTT client.
//!
//! The lifecycle controller only ever talks to these traits. Each call to
//! [`Transport::connect`] yields a fresh session together with its own event receiver, so a
//! replaced session can never deliver events into its successor.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::error::{ConnectivityError, DeliveryError};

/// Lifecycle and data events as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connect,
    Message { topic: String, payload: Vec<u8> },
    Close,
    Reconnect,
    Error(String),
}

/// Everything needed to open one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Full WebSocket URL, `ws://<host>:<port>`
    pub url: String,
    pub port: u16,
    pub client_id: String,
    pub clean_session: bool,
    pub reconnect_period: Duration,
    pub keep_alive: Duration,
}

/// A single value to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub topic: String,
    pub value: String,
}

impl PublishRequest {
    pub fn new(topic: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
        }
    }
}

/// Resolves once the client has accepted or refused a request.
pub type Completion = oneshot::Receiver<Result<(), DeliveryError>>;

/// Waits for a completion, treating a dropped sender as an abandoned request.
pub async fn settle(completion: Completion, topic: &str) -> Result<(), DeliveryError> {
    match completion.await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Abandoned {
            topic: topic.to_string(),
        }),
    }
}

/// Resolves when a session has fully stopped. The sender is only ever dropped, never used.
pub type Stopped = oneshot::Receiver<()>;

pub trait Transport {
    type Session: TransportSession;

    fn connect(
        &self,
        options: &SessionOptions,
    ) -> Result<(Self::Session, mpsc::Receiver<TransportEvent>), ConnectivityError>;
}

/// An open client. Publishing and subscribing are QoS 0, not retained.
pub trait TransportSession {
    fn client_id(&self) -> &str;

    fn is_connected(&self) -> bool;

    fn subscribe(&self, topic: &str) -> Completion;

    fn publish(&self, request: PublishRequest) -> Completion;

    /// Tears the session down. `force` skips the graceful DISCONNECT.
    ///
    /// The returned receiver resolves once the session's background work has stopped, which
    /// for a graceful termination is after the DISCONNECT went out or a short grace period.
    fn terminate(self, force: bool) -> Stopped;
}
