//! View state folded from [`UiUpdate`]s. Rendering reads it, only updates write it.

use chrono::{DateTime, Local};
use std::collections::{HashMap, VecDeque};

use super::presenter::{ConnectionInfo, Severity, UiUpdate};
use crate::dashboard::{Sensor, SensorDisplay};
use crate::mqtt::lifecycle::ConnectionState;

pub const MAX_LOG_ENTRIES: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
    pub at: DateTime<Local>,
}

impl LogEntry {
    pub fn render(&self) -> String {
        format!(
            "[{} {}] {}",
            self.severity.label(),
            self.at.format("%H:%M:%S"),
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorCard {
    pub display: SensorDisplay,
    pub updated: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub status: ConnectionState,
    pub reconnect_attempt: u32,
    pub reconnect_enabled: bool,
    pub connection: Option<ConnectionInfo>,
    log: VecDeque<LogEntry>,
    sensors: HashMap<Sensor, SensorCard>,
    notifications: VecDeque<String>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            status: ConnectionState::Disconnected,
            reconnect_attempt: 0,
            reconnect_enabled: false,
            connection: None,
            log: VecDeque::new(),
            sensors: HashMap::new(),
            notifications: VecDeque::new(),
        }
    }
}

impl PanelState {
    pub fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Status(state) => self.status = state,
            UiUpdate::ReconnectInfo(attempt) => self.reconnect_attempt = attempt,
            UiUpdate::Log {
                message,
                severity,
                at,
            } => {
                if self.log.len() == MAX_LOG_ENTRIES {
                    self.log.pop_front();
                }
                self.log.push_back(LogEntry {
                    message,
                    severity,
                    at,
                });
            }
            UiUpdate::SensorValue {
                sensor,
                display,
                at,
            } => {
                self.sensors.insert(
                    sensor,
                    SensorCard {
                        display,
                        updated: at,
                    },
                );
            }
            UiUpdate::ConnectionInfo(info) => self.connection = Some(info),
            UiUpdate::ReconnectEnabled(enabled) => self.reconnect_enabled = enabled,
            UiUpdate::Notify(message) => self.notifications.push_back(message),
        }
    }

    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
        self.log.push_back(LogEntry {
            message: "Log cleared.".to_string(),
            severity: Severity::Info,
            at: Local::now(),
        });
    }

    pub fn card(&self, sensor: Sensor) -> Option<&SensorCard> {
        self.sensors.get(&sensor)
    }

    pub fn notification(&self) -> Option<&str> {
        self.notifications.front().map(String::as_str)
    }

    pub fn dismiss_notification(&mut self) {
        self.notifications.pop_front();
    }

    /// Status text below the badge.
    pub fn connection_text(&self) -> &'static str {
        match self.status {
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Trying to reconnect...",
            ConnectionState::Disconnected => "Disconnected",
        }
    }

    /// Hint about automatic retries, `None` while connected.
    pub fn reconnect_info(&self) -> Option<String> {
        let period = self
            .connection
            .as_ref()
            .map(|info| info.reconnect_period.as_secs())
            .unwrap_or(5);

        match self.status {
            ConnectionState::Connected => None,
            ConnectionState::Reconnecting => Some(format!(
                "Attempt {}... (automatic every {} seconds)",
                self.reconnect_attempt, period
            )),
            ConnectionState::Disconnected => Some(
                "Connection lost. Click Reconnect or wait for auto-reconnect.".to_string(),
            ),
        }
    }
}
