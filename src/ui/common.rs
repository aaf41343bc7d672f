//! # Shared Widgets
//!
//! Styling constants and the widgets both pages draw: the connection badge, the reconnect
//! button, the broker details and the activity log.
//!
//! ## Why This Module Exists
//!
//! The publisher and subscriber pages differ only in their central panel. Everything about
//! the connection looks the same on both, so it lives here:
//! - [`status_bar`]: status dot, state label, broker URL, reconnect button, retry info
//! - [`connection_details`]: server, port and client id of the current session
//! - [`activity_log`]: the bounded log, newest entry at the bottom
//!
//! ## Theme
//!
//! [`UiColors`] is the dark palette. Green marks a connected or resting value, red a
//! disconnected or attention value and amber a reconnect in progress.
//!
//! ## Design Rationale
//!
//! egui is immediate mode, the widgets are rebuilt every frame. They are stateless
//! functions over [`PanelState`] and return clicks to the caller instead of sending
//! commands themselves, so only [`PanelUi`](super::PanelUi) talks to the page runtime.

use eframe::egui::{self, Color32, Frame, RichText, ScrollArea, Stroke};

use super::presenter::Severity;
use super::state::PanelState;
use crate::mqtt::lifecycle::ConnectionState;

/// Dark theme palette.
pub struct UiColors;

impl UiColors {
    /// Background for nested components such as cards
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);

    /// Background for the log
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);

    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Connected, success, "all good" values
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Disconnected, errors, attention values
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    pub const RECONNECTING: Color32 = Color32::from_rgb(230, 170, 20);

    pub const TEXT_DIM: Color32 = Color32::from_rgb(150, 150, 150);
}

pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(4)
        .outer_margin(2)
}

pub fn status_color(state: ConnectionState) -> Color32 {
    match state {
        ConnectionState::Connected => UiColors::ACTIVE,
        ConnectionState::Reconnecting => UiColors::RECONNECTING,
        ConnectionState::Disconnected => UiColors::INACTIVE,
    }
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => UiColors::TEXT_DIM,
        Severity::Success => UiColors::ACTIVE,
        Severity::Error => UiColors::INACTIVE,
    }
}

/// Badge with status dot and label. Returns `true` if the reconnect button was clicked.
pub fn status_bar(ui: &mut egui::Ui, state: &PanelState) -> bool {
    let mut reconnect_clicked = false;
    ui.horizontal(|ui| {
        ui.colored_label(status_color(state.status), "\u{2B24}");
        ui.label(RichText::new(state.status.to_string()).strong());
        ui.separator();
        ui.label(state.connection_text());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            reconnect_clicked = ui
                .add_enabled(state.reconnect_enabled, egui::Button::new("Reconnect"))
                .clicked();
        });
    });

    if let Some(info) = state.reconnect_info() {
        ui.colored_label(status_color(state.status), info);
    }
    reconnect_clicked
}

pub fn connection_details(ui: &mut egui::Ui, state: &PanelState) {
    let Some(info) = &state.connection else {
        ui.colored_label(UiColors::TEXT_DIM, "No broker configured yet");
        return;
    };

    egui::Grid::new("connection_details")
        .num_columns(2)
        .show(ui, |ui| {
            ui.colored_label(UiColors::TEXT_DIM, "Server");
            ui.label(info.host.as_str());
            ui.end_row();

            ui.colored_label(UiColors::TEXT_DIM, "Port");
            ui.label(info.port.to_string());
            ui.end_row();

            ui.colored_label(UiColors::TEXT_DIM, "Client ID");
            ui.label(info.client_id.as_str());
            ui.end_row();
        });
}

pub fn activity_log(ui: &mut egui::Ui, state: &PanelState, height: f32) {
    create_frame(UiColors::EXTREME_BG, UiColors::BORDER).show(ui, |ui| {
        ui.set_min_width(ui.available_width());
        ScrollArea::vertical()
            .max_height(height)
            .stick_to_bottom(true)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for entry in state.log() {
                    ui.colored_label(severity_color(entry.severity), entry.render());
                }
            });
    });
}
