//! # Publish Gate
//!
//! The single path from the publisher page's inputs to the broker.
//!
//! ## Why This Module Exists
//!
//! The publisher page hands arbitrary operator input to the transport. The gate makes sure
//! nothing is sent unless:
//! - the lifecycle controller has handled the session's Connect event, and
//! - the value is not blank.
//!
//! A rejected request is reported twice: as an activity log line and as a blocking
//! notification the operator has to dismiss.
//!
//! ## Check Order
//!
//! ```text
//! publish(state, session, topic, value)
//!     │
//!     ├─ state != Connected or !session.is_connected() ──► NotConnected
//!     ├─ value.trim() is empty                          ──► EmptyValue
//!     └─ session.publish(topic, value)  (QoS 0, not retained, value untrimmed)
//!            └─ completion ──► "Published to ..." / "Failed to publish to ..."
//! ```
//!
//! ## Design Rationale
//!
//! The connection check reads both the controller's [`ConnectionState`] and the session's
//! own flag. The client raises its flag on ConnAck while the matching Connect event may
//! still be queued for the page runtime, so the flag alone would let a publish through
//! while the page still shows Disconnected. Delivery failures are only logged, a QoS 0
//! publish has no acknowledgement worth retrying on.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ValidationError;
use crate::mqtt::lifecycle::ConnectionState;
use crate::mqtt::transport::{settle, PublishRequest, TransportSession};
use crate::ui::presenter::{Presenter, Severity};

/// Checks operator input before it reaches the transport.
pub struct PublishGate {
    presenter: Arc<dyn Presenter>,
}

impl PublishGate {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self { presenter }
    }

    /// Publishes `value` on `topic` at QoS 0, not retained.
    ///
    /// Rejected unless the lifecycle `state` is Connected and the session agrees, or when the
    /// value is blank. A rejection is shown to the operator and nothing is sent. The outcome of
    /// an accepted publish is logged once the client reports it.
    pub fn publish<S: TransportSession>(
        &self,
        state: ConnectionState,
        session: Option<&S>,
        topic: &str,
        value: &str,
    ) -> Result<(), ValidationError> {
        let session = session.filter(|s| state == ConnectionState::Connected && s.is_connected());
        let Some(session) = session else {
            warn!("Publish to {} rejected: not connected", topic);
            self.reject(
                "Cannot publish! Not connected to the MQTT broker.".to_string(),
                "Not connected to the MQTT broker! Make sure the broker is running.",
            );
            return Err(ValidationError::NotConnected);
        };

        if value.trim().is_empty() {
            warn!("Publish to {} rejected: empty value", topic);
            self.reject(
                format!("Failed to publish to {}: empty value!", topic),
                "Please enter a value first!",
            );
            return Err(ValidationError::EmptyValue {
                topic: topic.to_string(),
            });
        }

        let completion = session.publish(PublishRequest::new(topic, value));
        let presenter = self.presenter.clone();
        let topic = topic.to_string();
        let value = value.to_string();
        tokio::spawn(async move {
            match settle(completion, &topic).await {
                Ok(()) => {
                    info!("Published to {}: {}", topic, value);
                    presenter.append_log(
                        format!("Published to {} with value: {}", topic, value),
                        Severity::Success,
                    );
                }
                Err(e) => {
                    error!("Error publishing: {}", e);
                    presenter
                        .append_log(format!("Failed to publish to {}: {}", topic, e), Severity::Error);
                }
            }
        });
        Ok(())
    }

    fn reject(&self, log: String, notification: &str) {
        self.presenter.append_log(log, Severity::Error);
        self.presenter.notify(notification.to_string());
    }
}
