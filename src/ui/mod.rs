//! # Panel User Interface
//!
//! Native rendering of the two pages with eframe/egui. The UI owns no connection logic: it
//! folds [`UiUpdate`]s from the page runtime into a [`PanelState`] and sends
//! [`PageCommand`]s back when the operator clicks something.
//!
//! ## Channel Layout
//!
//! ```text
//!              UiUpdate (mpsc)
//!   runtime ─────────────────────► PanelUi
//!      ▲                              │
//!      └──────────────────────────────┘
//!              PageCommand (mpsc)
//! ```
//!
//! ## Layout
//!
//! Both pages share a top panel (title, status badge, reconnect button) and a bottom panel
//! with the broker details. The central panel holds either the sensor cards or the publish
//! form with its activity log. Blocking notifications are shown as a modal until dismissed.
//!
//! The UI requests a repaint every 33ms so channel updates show up without input events.

pub mod common;
pub mod dashboard_view;
pub mod presenter;
pub mod publisher_view;
pub mod state;

use eframe::egui::{self, CentralPanel, Context, Id, Modal, TopBottomPanel};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use self::publisher_view::PublisherAction;
use self::state::PanelState;
use crate::config::PublishTarget;
use crate::publisher::PublisherForm;
use crate::runtime::{PageCommand, PageKind};

pub use presenter::{ChannelPresenter, ConnectionInfo, Presenter, Severity, UiUpdate};

pub struct PanelUi {
    kind: PageKind,
    state: PanelState,
    form: PublisherForm,
    updates: mpsc::UnboundedReceiver<UiUpdate>,
    commands: mpsc::Sender<PageCommand>,
}

impl PanelUi {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        kind: PageKind,
        targets: &[PublishTarget],
        updates: mpsc::UnboundedReceiver<UiUpdate>,
        commands: mpsc::Sender<PageCommand>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            kind,
            state: PanelState::default(),
            form: PublisherForm::new(targets),
            updates,
            commands,
        }
    }

    fn poll_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            self.state.apply(update);
        }
    }

    fn send(&self, command: PageCommand) {
        debug!("UI command: {:?}", command);
        if let Err(e) = self.commands.try_send(command) {
            warn!("Failed to send UI command: {}", e);
        }
    }

    fn handle_publisher_action(&mut self, action: PublisherAction) {
        match action {
            PublisherAction::Publish(index) => {
                if let Some((topic, value)) = self.form.request(index) {
                    self.send(PageCommand::Publish { topic, value });
                }
            }
            PublisherAction::ClearLog => self.state.clear_log(),
        }
    }

    fn notification_modal(&mut self, ctx: &Context) {
        let Some(message) = self.state.notification().map(str::to_string) else {
            return;
        };

        let mut dismissed = false;
        let response = Modal::new(Id::new("notification")).show(ctx, |ui| {
            ui.set_width(280.0);
            ui.label(message);
            ui.separator();
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });

        if dismissed || response.should_close() {
            self.state.dismiss_notification();
        }
    }
}

impl eframe::App for PanelUi {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_updates();

        TopBottomPanel::top("status").show(ctx, |ui| {
            ui.heading(self.kind.to_string());
            if common::status_bar(ui, &self.state) {
                self.state.reconnect_enabled = false;
                self.send(PageCommand::ManualReconnect);
            }
        });

        TopBottomPanel::bottom("connection").show(ctx, |ui| {
            common::connection_details(ui, &self.state);
        });

        CentralPanel::default().show(ctx, |ui| match self.kind {
            PageKind::Subscriber => {
                dashboard_view::render(ui, &self.state);
                ui.add_space(8.0);
                common::activity_log(ui, &self.state, 120.0);
            }
            PageKind::Publisher => {
                let actions = publisher_view::render(ui, &mut self.form, &self.state);
                for action in actions {
                    self.handle_publisher_action(action);
                }
            }
        });

        self.notification_modal(ctx);
        ctx.request_repaint_after(Duration::from_millis(33));
    }
}
