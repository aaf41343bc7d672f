//! # Topic Dispatcher
//!
//! Routes readings of the subscriber page to their sensor cards.
//!
//! ## Why This Module Exists
//!
//! The lifecycle controller delivers every incoming message without looking at its topic.
//! The dispatcher owns the mapping from topic to sensor handler and the subscriptions that
//! make those messages arrive at all.
//!
//! ## Message Flow
//!
//! ```text
//! SensorReading ──► TopicRegistry::sensor_for (exact match)
//!                      │ None ──► ignored (traced)
//!                      ▼
//!                display::interpret ──► None ──► card unchanged
//!                      │
//!                      ▼
//!                Presenter::set_sensor_value(sensor, display, received_at)
//! ```
//!
//! ## Design Rationale
//!
//! Matching is exact, `sensor/dht2` is not `sensor/dht`. Subscriptions are issued again on
//! every Connect because each session starts clean. Subscription results are settled in
//! small spawned tasks, the page runtime never waits on the broker.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::display::interpret;
use super::topics::{Sensor, TopicRegistry};
use crate::mqtt::message::SensorReading;
use crate::mqtt::transport::{settle, TransportSession};
use crate::ui::presenter::{Presenter, Severity};

/// Routes readings to the sensor cards of the subscriber page.
pub struct TopicDispatcher {
    registry: TopicRegistry,
    presenter: Arc<dyn Presenter>,
}

impl TopicDispatcher {
    pub fn new(registry: TopicRegistry, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            registry,
            presenter,
        }
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Subscribes the session to every registered topic.
    ///
    /// Results arrive asynchronously; successes are only traced.
    pub fn subscribe_all<S: TransportSession>(&self, session: &S) {
        for topic in self.registry.topics() {
            let completion = session.subscribe(topic);
            let presenter = self.presenter.clone();
            tokio::spawn(async move {
                match settle(completion, topic).await {
                    Ok(()) => debug!("Subscribed to: {}", topic),
                    Err(e) => {
                        warn!("Subscription to {} failed: {}", topic, e);
                        presenter.append_log(
                            format!("Failed to subscribe to {}: {}", topic, e),
                            Severity::Error,
                        );
                    }
                }
            });
        }
    }

    /// Hands the reading to its sensor's handler. Returns the sensor whose card changed.
    pub fn dispatch(&self, reading: &SensorReading) -> Option<Sensor> {
        let Some(sensor) = self.registry.sensor_for(reading.topic()) else {
            trace!("Ignoring message on unknown topic {}", reading.topic());
            return None;
        };

        match interpret(sensor, reading.payload()) {
            Some(shown) => {
                debug!("{} -> {}", sensor, shown.label());
                self.presenter
                    .set_sensor_value(sensor, shown, reading.timestamp());
                Some(sensor)
            }
            None => {
                debug!(
                    "Payload {:?} leaves {} unchanged",
                    reading.payload(),
                    sensor
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::display::SensorDisplay;
    use crate::mqtt::testing::{drain, presenter, MockTransport};
    use crate::mqtt::transport::{SessionOptions, Transport};
    use crate::ui::presenter::UiUpdate;
    use chrono::{Local, TimeZone};
    use std::time::Duration;

    fn dispatcher() -> (TopicDispatcher, tokio::sync::mpsc::UnboundedReceiver<UiUpdate>) {
        let (presenter, rx) = presenter();
        (TopicDispatcher::new(TopicRegistry::default(), presenter), rx)
    }

    #[test]
    fn test_temperature_reading_updates_card_with_timestamp() {
        let (dispatcher, mut rx) = dispatcher();
        let at = Local.with_ymd_and_hms(2025, 3, 1, 14, 5, 9).unwrap();

        let changed = dispatcher.dispatch(&SensorReading::received_at("sensor/dht", "23.7", at));

        assert_eq!(changed, Some(Sensor::Temperature));
        match drain(&mut rx).as_slice() {
            [UiUpdate::SensorValue {
                sensor: Sensor::Temperature,
                display,
                at: stamped,
            }] => {
                assert_eq!(display.label(), "23.7°C");
                assert_eq!(*stamped, at);
            }
            other => panic!("Unexpected updates: {:?}", other),
        }
    }

    #[test]
    fn test_similar_topics_are_not_dispatched() {
        let (dispatcher, mut rx) = dispatcher();

        for topic in ["sensor/dht2", "sensor/dht/", "Sensor/dht", "aktuator", "led"] {
            assert_eq!(dispatcher.dispatch(&SensorReading::new(topic, "23.7")), None);
        }
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_servo_case_variants_give_same_result() {
        let (dispatcher, mut rx) = dispatcher();

        for payload in ["open", "OPEN", "Open", "closed", "foo"] {
            dispatcher.dispatch(&SensorReading::new("aktuator/servo", payload));
        }

        let shown: Vec<SensorDisplay> = drain(&mut rx)
            .into_iter()
            .filter_map(|u| match u {
                UiUpdate::SensorValue { display, .. } => Some(display),
                _ => None,
            })
            .collect();
        assert_eq!(
            shown,
            vec![
                SensorDisplay::Servo { open: true },
                SensorDisplay::Servo { open: true },
                SensorDisplay::Servo { open: true },
                SensorDisplay::Servo { open: false },
                SensorDisplay::Servo { open: false },
            ]
        );
    }

    #[test]
    fn test_unknown_led_colour_sends_nothing() {
        let (dispatcher, mut rx) = dispatcher();

        assert_eq!(
            dispatcher.dispatch(&SensorReading::new("aktuator/led", "BLUE")),
            None
        );
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_all_covers_registry() {
        let (dispatcher, _rx) = dispatcher();
        let transport = MockTransport::default();
        let (session, _events) = transport
            .connect(&SessionOptions {
                url: "ws://localhost:9001".into(),
                port: 9001,
                client_id: "Dashboard-00000000".into(),
                clean_session: true,
                reconnect_period: Duration::from_secs(5),
                keep_alive: Duration::from_secs(60),
            })
            .unwrap();

        dispatcher.subscribe_all(&session);

        assert_eq!(
            transport.subscribed(),
            vec![
                "sensor/dht",
                "sensor/infrared",
                "aktuator/servo",
                "aktuator/led"
            ]
        );
    }
}
