//! The seam between the core and the pages.
//!
//! The core never renders anything. It reports through [`Presenter`]; the egui pages receive
//! the same calls as [`UiUpdate`] values over a channel and fold them into their view state.

use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::dashboard::{Sensor, SensorDisplay};
use crate::mqtt::lifecycle::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Error => "ERROR",
        }
    }
}

/// Broker details shown on both pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub reconnect_period: Duration,
}

pub trait Presenter: Send + Sync {
    fn set_status(&self, state: ConnectionState);

    /// `0` clears the reconnect info.
    fn set_reconnect_info(&self, attempt: u32);

    fn append_log(&self, message: String, severity: Severity);

    fn set_sensor_value(&self, sensor: Sensor, display: SensorDisplay, at: DateTime<Local>);

    fn set_connection_info(&self, info: ConnectionInfo);

    fn set_reconnect_enabled(&self, enabled: bool);

    /// Blocking notification, the page shows it until the operator dismisses it.
    fn notify(&self, message: String);
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Status(ConnectionState),
    ReconnectInfo(u32),
    Log {
        message: String,
        severity: Severity,
        at: DateTime<Local>,
    },
    SensorValue {
        sensor: Sensor,
        display: SensorDisplay,
        at: DateTime<Local>,
    },
    ConnectionInfo(ConnectionInfo),
    ReconnectEnabled(bool),
    Notify(String),
}

/// Forwards presenter calls to the UI thread.
///
/// The channel is unbounded: the UI may stop draining it while the window is hidden, and a
/// lost `Status` or `ReconnectEnabled` update would leave the page showing a stale state.
#[derive(Clone, Debug)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<UiUpdate>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<UiUpdate>) -> Self {
        Self { tx }
    }

    fn send(&self, update: UiUpdate) {
        // Only fails once the UI is gone
        if let Err(e) = self.tx.send(update) {
            warn!("UI closed, dropping update: {:?}", e.0);
        }
    }
}

impl Presenter for ChannelPresenter {
    fn set_status(&self, state: ConnectionState) {
        self.send(UiUpdate::Status(state));
    }

    fn set_reconnect_info(&self, attempt: u32) {
        self.send(UiUpdate::ReconnectInfo(attempt));
    }

    fn append_log(&self, message: String, severity: Severity) {
        self.send(UiUpdate::Log {
            message,
            severity,
            at: Local::now(),
        });
    }

    fn set_sensor_value(&self, sensor: Sensor, display: SensorDisplay, at: DateTime<Local>) {
        self.send(UiUpdate::SensorValue {
            sensor,
            display,
            at,
        });
    }

    fn set_connection_info(&self, info: ConnectionInfo) {
        self.send(UiUpdate::ConnectionInfo(info));
    }

    fn set_reconnect_enabled(&self, enabled: bool) {
        self.send(UiUpdate::ReconnectEnabled(enabled));
    }

    fn notify(&self, message: String) {
        self.send(UiUpdate::Notify(message));
    }
}
