//! # MQTT Connection Module
//!
//! Everything both pages need to hold one MQTT session over WebSocket and to follow its
//! lifecycle. The wire protocol, WebSocket framing and the timing of automatic retries belong
//! to `rumqttc`; this module only wraps it and reflects what it reports.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── transport.rs  - Capability traits and the events a session reports
//! ├── rumqtt.rs     - rumqttc implementation with a per-session event pump
//! ├── lifecycle.rs  - Connection state machine that owns the live session
//! └── message.rs    - Received payloads stamped with their receipt time
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! rumqttc EventLoop ──► pump ──► TransportEvent ──► LifecycleController ──► Presenter
//!                                                        │
//!                                                        └──► LifecycleNotice ──► page
//! ```
//!
//! The controller is driven from a single task, so none of its state is shared or locked.
//! Replacing a session drops the old event receiver, which stops the old pump from reporting
//! into the new session's state.

pub mod lifecycle;
pub mod message;
pub mod rumqtt;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
