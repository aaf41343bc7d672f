//! Page runtime: the one task that drives a page.
//!
//! A single `select!` loop feeds transport events, operator commands and the pending
//! manual-reconnect deadline into the lifecycle controller and the page's role (dispatcher
//! or publish gate). Nothing here runs concurrently with anything else in the core.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::BrokerConfig;
use crate::dashboard::{TopicDispatcher, TopicRegistry};
use crate::mqtt::lifecycle::{LifecycleController, LifecycleNotice};
use crate::mqtt::transport::{Transport, TransportEvent};
use crate::publisher::PublishGate;
use crate::ui::presenter::{Presenter, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PageKind {
    /// Control panel that publishes values
    Publisher,
    /// Dashboard that shows sensor and actuator state
    Subscriber,
}

impl PageKind {
    pub fn client_prefix(&self) -> &'static str {
        match self {
            PageKind::Publisher => "Publisher",
            PageKind::Subscriber => "Dashboard",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageKind::Publisher => write!(f, "MQTT Publisher"),
            PageKind::Subscriber => write!(f, "MQTT Dashboard"),
        }
    }
}

/// Operator actions sent from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    Publish { topic: String, value: String },
    ManualReconnect,
    Shutdown,
}

enum PageRole {
    Publisher(PublishGate),
    Subscriber(TopicDispatcher),
}

pub struct PageRuntime<T: Transport> {
    kind: PageKind,
    controller: LifecycleController<T>,
    role: PageRole,
    presenter: Arc<dyn Presenter>,
    commands: mpsc::Receiver<PageCommand>,
}

async fn restart_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<T: Transport> PageRuntime<T> {
    pub fn new(
        kind: PageKind,
        transport: T,
        broker: BrokerConfig,
        presenter: Arc<dyn Presenter>,
        commands: mpsc::Receiver<PageCommand>,
    ) -> Self {
        let role = match kind {
            PageKind::Publisher => PageRole::Publisher(PublishGate::new(presenter.clone())),
            PageKind::Subscriber => PageRole::Subscriber(TopicDispatcher::new(
                TopicRegistry::default(),
                presenter.clone(),
            )),
        };
        let controller =
            LifecycleController::new(transport, broker, kind.client_prefix(), presenter.clone());

        Self {
            kind,
            controller,
            role,
            presenter,
            commands,
        }
    }

    /// Runs until a [`PageCommand::Shutdown`] arrives or the UI drops its sender.
    pub async fn run(mut self) {
        info!("Starting {}...", self.kind);
        self.presenter.append_log(
            "Starting connection to the MQTT broker...".to_string(),
            Severity::Info,
        );
        self.controller.start();

        loop {
            let deadline = self.controller.restart_deadline();
            tokio::select! {
                event = self.controller.recv_event() => {
                    if let Some(event) = event {
                        self.on_event(event);
                    }
                }
                command = self.commands.recv() => match command {
                    Some(PageCommand::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                _ = restart_due(deadline) => self.controller.start(),
            }
        }

        self.controller.shutdown().await;
        info!("{} stopped", self.kind);
    }

    fn on_event(&mut self, event: TransportEvent) {
        let notice = self.controller.handle_event(event);
        match (&self.role, notice) {
            (PageRole::Subscriber(dispatcher), LifecycleNotice::Connected) => {
                if let Some(session) = self.controller.session() {
                    dispatcher.subscribe_all(session);
                }
            }
            (PageRole::Subscriber(dispatcher), LifecycleNotice::Message(reading)) => {
                dispatcher.dispatch(&reading);
            }
            (PageRole::Publisher(_), LifecycleNotice::Connected) => {
                self.presenter.append_log(
                    "Connected to the MQTT broker!".to_string(),
                    Severity::Success,
                );
            }
            (PageRole::Publisher(_), LifecycleNotice::Disconnected | LifecycleNotice::Error(_)) => {
                self.presenter.append_log(
                    "Connection to the MQTT broker lost.".to_string(),
                    Severity::Error,
                );
            }
            _ => {}
        }
    }

    fn on_command(&mut self, command: PageCommand) {
        match command {
            PageCommand::Publish { topic, value } => match &self.role {
                PageRole::Publisher(gate) => {
                    // Rejections are already reported to the operator
                    let _ = gate.publish(
                        self.controller.state(),
                        self.controller.session(),
                        &topic,
                        &value,
                    );
                }
                PageRole::Subscriber(_) => {
                    warn!("Ignoring publish to {} on the subscriber page", topic);
                }
            },
            PageCommand::ManualReconnect => {
                self.controller.manual_reconnect();
            }
            PageCommand::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Sensor;
    use crate::mqtt::testing::{drain, presenter, MockTransport};
    use crate::ui::presenter::UiUpdate;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    struct Harness {
        transport: MockTransport,
        commands: mpsc::Sender<PageCommand>,
        updates: mpsc::UnboundedReceiver<UiUpdate>,
        handle: JoinHandle<()>,
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn spawn_page(kind: PageKind) -> Harness {
        let transport = MockTransport::default();
        let (presenter, updates) = presenter();
        let (commands, commands_rx) = mpsc::channel(8);
        let runtime = PageRuntime::new(
            kind,
            transport.clone(),
            BrokerConfig::default(),
            presenter,
            commands_rx,
        );
        let handle = tokio::spawn(runtime.run());
        settle().await;
        Harness {
            transport,
            commands,
            updates,
            handle,
        }
    }

    #[tokio::test]
    async fn test_subscriber_shows_published_temperature() {
        let mut page = spawn_page(PageKind::Subscriber).await;
        let events = page.transport.events();

        events.send(TransportEvent::Connect).await.unwrap();
        settle().await;
        assert_eq!(page.transport.subscribed().len(), 4);

        events
            .send(TransportEvent::Message {
                topic: "sensor/dht".into(),
                payload: b"23.7".to_vec(),
            })
            .await
            .unwrap();
        settle().await;

        let shown = drain(&mut page.updates).into_iter().find_map(|u| match u {
            UiUpdate::SensorValue {
                sensor: Sensor::Temperature,
                display,
                ..
            } => Some(display.label()),
            _ => None,
        });
        assert_eq!(shown.as_deref(), Some("23.7°C"));

        page.commands.send(PageCommand::Shutdown).await.unwrap();
        page.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_reconnect_starts_fresh_client_after_delay() {
        let page = spawn_page(PageKind::Subscriber).await;
        let events = page.transport.events();
        events.send(TransportEvent::Close).await.unwrap();
        settle().await;
        let first = page.transport.connects()[0].client_id.clone();

        page.commands
            .send(PageCommand::ManualReconnect)
            .await
            .unwrap();
        settle().await;

        assert_eq!(page.transport.terminated(), vec![(first.clone(), true)]);
        assert_eq!(page.transport.connects().len(), 1);

        tokio::time::sleep(Duration::from_millis(499)).await;
        settle().await;
        assert_eq!(page.transport.connects().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        let connects = page.transport.connects();
        assert_eq!(connects.len(), 2);
        assert_ne!(connects[1].client_id, first);
        assert!(connects[1].client_id.starts_with("Dashboard-"));

        drop(page.commands);
        page.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_events_of_replaced_session_are_ignored() {
        let page = spawn_page(PageKind::Subscriber).await;
        let stale = page.transport.events();

        page.commands
            .send(PageCommand::ManualReconnect)
            .await
            .unwrap();
        settle().await;

        // The old session's receiver is gone
        assert!(stale.send(TransportEvent::Connect).await.is_err());

        drop(page.commands);
        page.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_publisher_publishes_only_when_connected() {
        let mut page = spawn_page(PageKind::Publisher).await;
        let publish = PageCommand::Publish {
            topic: "aktuator/led".into(),
            value: "GREEN".into(),
        };

        page.commands.send(publish.clone()).await.unwrap();
        settle().await;
        assert!(page.transport.published().is_empty());
        assert!(drain(&mut page.updates)
            .iter()
            .any(|u| matches!(u, UiUpdate::Notify(_))));

        page.transport.events().send(TransportEvent::Connect).await.unwrap();
        page.transport.set_connected(true);
        settle().await;

        page.commands.send(publish).await.unwrap();
        settle().await;
        assert_eq!(page.transport.published().len(), 1);
        assert!(drain(&mut page.updates).iter().any(|u| matches!(
            u,
            UiUpdate::Log { message, severity: Severity::Success, .. }
                if message == "Published to aktuator/led with value: GREEN"
        )));

        page.commands.send(PageCommand::Shutdown).await.unwrap();
        page.handle.await.unwrap();
        assert_eq!(page.transport.terminated().last().map(|t| t.1), Some(false));
    }

    #[tokio::test]
    async fn test_publish_waits_for_handled_connect_event() {
        let mut page = spawn_page(PageKind::Publisher).await;
        // The client already saw its ConnAck but the Connect event is still queued
        page.transport.set_connected(true);

        page.commands
            .send(PageCommand::Publish {
                topic: "aktuator/servo".into(),
                value: "OPEN".into(),
            })
            .await
            .unwrap();
        settle().await;

        assert!(page.transport.published().is_empty());
        assert!(drain(&mut page.updates)
            .iter()
            .any(|u| matches!(u, UiUpdate::Notify(_))));

        page.commands.send(PageCommand::Shutdown).await.unwrap();
        page.handle.await.unwrap();
    }
}
