use chrono::{DateTime, Local};
use std::fmt;

/// A payload as it arrived on a topic, stamped with the local receipt time.
///
/// Readings are transient: the dispatcher hands them to a handler and drops them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorReading {
    topic: String,
    payload: String,
    received_at: DateTime<Local>,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.payload.chars().take(32).collect();
        write!(
            f,
            "{} - {}: {}",
            self.received_at.format("%H:%M:%S"),
            self.topic,
            preview
        )
    }
}

impl SensorReading {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::received_at(topic, payload, Local::now())
    }

    pub fn received_at(
        topic: impl Into<String>,
        payload: impl Into<String>,
        received_at: DateTime<Local>,
    ) -> Self {
        SensorReading {
            topic: topic.into(),
            payload: payload.into(),
            received_at,
        }
    }

    /// Builds a reading from raw bytes, replacing invalid UTF-8.
    pub fn from_bytes(topic: impl Into<String>, payload: &[u8]) -> Self {
        Self::new(topic, String::from_utf8_lossy(payload).into_owned())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.received_at
    }
}
