//! # SensorPanel
//!
//! Publisher control panel and subscriber dashboard for a small MQTT sensor network, talking
//! to the broker over WebSocket.
//!
//! ```text
//! config ──► runtime ──► mqtt::lifecycle ──► mqtt::rumqtt (rumqttc)
//!               │               │
//!               │               └──► ui::presenter ──► ui (egui)
//!               ├──► dashboard (topic dispatch, subscriber page)
//!               └──► publisher (publish gate, publisher page)
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod mqtt;
pub mod publisher;
pub mod runtime;
pub mod ui;
