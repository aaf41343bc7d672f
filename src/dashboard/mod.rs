//! Subscriber side: the topic registry, the per-sensor handlers and the dispatcher between
//! them.

pub mod dispatcher;
pub mod display;
pub mod topics;

pub use dispatcher::TopicDispatcher;
pub use display::{LedColor, SensorDisplay};
pub use topics::{Sensor, TopicRegistry};
