//! In-memory transport for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use super::transport::{
    Completion, PublishRequest, SessionOptions, Stopped, Transport, TransportEvent,
    TransportSession,
};
use crate::error::{ConnectivityError, DeliveryError};
use crate::ui::presenter::{ChannelPresenter, UiUpdate};

#[derive(Default)]
struct MockState {
    connects: Vec<SessionOptions>,
    published: Vec<PublishRequest>,
    subscribed: Vec<String>,
    terminated: Vec<(String, bool)>,
    event_senders: Vec<mpsc::Sender<TransportEvent>>,
    connected_flags: Vec<Arc<AtomicBool>>,
    fail_next_connect: bool,
    reject_publishes: bool,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn connects(&self) -> Vec<SessionOptions> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.state.lock().unwrap().subscribed.clone()
    }

    pub fn terminated(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().terminated.clone()
    }

    /// Event sender of the most recent session.
    pub fn events(&self) -> mpsc::Sender<TransportEvent> {
        self.state
            .lock()
            .unwrap()
            .event_senders
            .last()
            .cloned()
            .expect("no session was started")
    }

    /// Sets what the most recent session reports from `is_connected`.
    pub fn set_connected(&self, connected: bool) {
        if let Some(flag) = self.state.lock().unwrap().connected_flags.last() {
            flag.store(connected, Ordering::SeqCst);
        }
    }

    pub fn fail_next_connect(&self) {
        self.state.lock().unwrap().fail_next_connect = true;
    }

    pub fn reject_publishes(&self) {
        self.state.lock().unwrap().reject_publishes = true;
    }
}

pub struct MockSession {
    client_id: String,
    connected: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
}

impl Transport for MockTransport {
    type Session = MockSession;

    fn connect(
        &self,
        options: &SessionOptions,
    ) -> Result<(MockSession, mpsc::Receiver<TransportEvent>), ConnectivityError> {
        let mut state = self.state.lock().unwrap();
        state.connects.push(options.clone());
        if std::mem::take(&mut state.fail_next_connect) {
            return Err(ConnectivityError::Transport("broker unreachable".into()));
        }

        let (tx, rx) = mpsc::channel(64);
        let connected = Arc::new(AtomicBool::new(false));
        state.event_senders.push(tx);
        state.connected_flags.push(connected.clone());

        let session = MockSession {
            client_id: options.client_id.clone(),
            connected,
            state: self.state.clone(),
        };
        Ok((session, rx))
    }
}

impl TransportSession for MockSession {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self, topic: &str) -> Completion {
        self.state.lock().unwrap().subscribed.push(topic.to_string());
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(()));
        rx
    }

    fn publish(&self, request: PublishRequest) -> Completion {
        let mut state = self.state.lock().unwrap();
        let result = if state.reject_publishes {
            Err(DeliveryError::Rejected {
                topic: request.topic.clone(),
                reason: "request channel closed".into(),
            })
        } else {
            Ok(())
        };
        state.published.push(request);

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        rx
    }

    fn terminate(self, force: bool) -> Stopped {
        self.connected.store(false, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .terminated
            .push((self.client_id.clone(), force));

        // Nothing runs in the background, the dropped sender resolves the receiver
        let (_stopped, rx) = oneshot::channel();
        rx
    }
}

pub fn presenter() -> (Arc<ChannelPresenter>, mpsc::UnboundedReceiver<UiUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelPresenter::new(tx)), rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<UiUpdate>) -> Vec<UiUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}
