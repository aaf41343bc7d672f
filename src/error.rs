//! Error types of the lifecycle controller, the dispatcher and the publish gate.
//!
//! None of these ever terminate a page. Connectivity problems are retried by the transport,
//! validation problems are shown to the operator and delivery problems are only logged.

use thiserror::Error;

/// Transport-level failures. Non-fatal, they drive the Disconnected/Reconnecting states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    /// The broker endpoint could not be turned into a client configuration
    #[error("Invalid broker endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The client could not be created or its connection failed
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Local input rejected before anything is handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Not connected to the MQTT broker")]
    NotConnected,

    #[error("Empty value for topic {topic}")]
    EmptyValue { topic: String },
}

/// A request the client accepted but could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Client rejected request for {topic}: {reason}")]
    Rejected { topic: String, reason: String },

    /// The session went away before reporting a result
    #[error("Request for {topic} was abandoned")]
    Abandoned { topic: String },
}

impl DeliveryError {
    pub fn topic(&self) -> &str {
        match self {
            DeliveryError::Rejected { topic, .. } | DeliveryError::Abandoned { topic } => topic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_topic() {
        let err = ValidationError::EmptyValue {
            topic: "sensor/dht".to_string(),
        };
        assert_eq!(err.to_string(), "Empty value for topic sensor/dht");

        let err = ConnectivityError::InvalidEndpoint {
            endpoint: "tcp://broker".to_string(),
            reason: "expected ws://<host>:<port>".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid broker endpoint tcp://broker: expected ws://<host>:<port>"
        );
    }

    #[test]
    fn test_delivery_error_reports_topic() {
        let rejected = DeliveryError::Rejected {
            topic: "aktuator/led".to_string(),
            reason: "request channel closed".to_string(),
        };
        let abandoned = DeliveryError::Abandoned {
            topic: "aktuator/servo".to_string(),
        };

        assert_eq!(rejected.topic(), "aktuator/led");
        assert_eq!(abandoned.topic(), "aktuator/servo");
    }
}
