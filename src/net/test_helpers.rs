//! Scripted transport and a wired-up dispatcher for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use super::dispatcher::Dispatcher;
use super::transport::Transport;
use super::types::{ApiError, OutboundRequest, TransportResponse};
use crate::session::{PageKind, RecordingNavigator, SessionController};
use crate::store::{CredentialStore, MemoryStorage};

pub const TEST_BASE: &str = "http://backend.test/api";

type Outcome = Result<TransportResponse, ApiError>;

enum Scripted {
    Ready(Outcome),
    Deferred(oneshot::Receiver<Outcome>),
}

/// Replays scripted responses per path and records every request.
#[derive(Default)]
pub struct StubTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.push(path, Scripted::Ready(Ok(TransportResponse { status, body: body.to_owned() })));
    }

    pub fn respond_json(&self, path: &str, status: u16, body: serde_json::Value) {
        self.respond(path, status, &body.to_string());
    }

    pub fn fail(&self, path: &str, error: ApiError) {
        self.push(path, Scripted::Ready(Err(error)));
    }

    /// Hold the next response for `path` until the returned sender fires.
    pub fn defer(&self, path: &str) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.push(path, Scripted::Deferred(rx));
        tx
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(format!("{TEST_BASE}{path}"))
            .or_default()
            .push_back(scripted);
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Ready(outcome)) => outcome,
            Some(Scripted::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Network("deferred response dropped".into()))),
            None => Err(ApiError::Network(format!("no scripted response for {}", request.url))),
        }
    }
}

/// Everything a dispatcher needs, with handles kept for assertions.
pub struct Harness {
    pub transport: Arc<StubTransport>,
    pub navigator: Arc<RecordingNavigator>,
    pub store: CredentialStore,
    pub session: SessionController,
    pub dispatcher: Dispatcher,
}

pub fn harness(page: PageKind) -> Harness {
    let transport = Arc::new(StubTransport::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
    let session = SessionController::new(page, navigator.clone());
    let dispatcher = Dispatcher::new(TEST_BASE, transport.clone(), store.clone(), session.clone());
    Harness { transport, navigator, store, session, dispatcher }
}
