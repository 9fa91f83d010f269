//! The dispatch engine.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::thread;

use crate::auth::AuthProvider;
use crate::body::build_body;
use crate::client::{AsyncClient, ClientState, SlotId, SlotRequest};
use crate::config::{FirestoreConfig, DEFAULT_SERVICE_URL};
use crate::error::{FirebaseError, Result};
use crate::locator::ResourceLocator;
use crate::operation::OperationDescriptor;
use crate::query::build_target;
use crate::result::{AsyncResult, OwnedResult, ResultSink, SharedResult};

/// Every REST path starts with this.
pub const API_PREFIX: &str = "/v1/projects/";

/// Turns operation descriptors into slots on transport clients and drives
/// those clients until their requests complete.
pub struct Firestore {
    config: FirestoreConfig,
    origin: String,
    host: String,
    app: Option<Rc<dyn AuthProvider>>,
    clients: RefCell<Vec<Weak<RefCell<ClientState>>>>,
}

impl Default for Firestore {
    fn default() -> Self {
        Self::new()
    }
}

impl Firestore {
    /// Engine for the public endpoint with no app bound.
    pub fn new() -> Self {
        Self {
            config: FirestoreConfig::default(),
            origin: DEFAULT_SERVICE_URL.to_string(),
            host: DEFAULT_SERVICE_URL.trim_start_matches("https://").to_string(),
            app: None,
            clients: RefCell::new(Vec::new()),
        }
    }

    pub fn with_config(config: FirestoreConfig) -> Result<Self> {
        let url = config.service_url()?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        Ok(Self {
            origin: url.origin().ascii_serialization(),
            host,
            app: None,
            clients: RefCell::new(Vec::new()),
            config,
        })
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    pub fn set_app(&mut self, app: impl AuthProvider + 'static) {
        self.app = Some(Rc::new(app));
    }

    pub fn clear_app(&mut self) {
        self.app = None;
    }

    pub fn is_app_ready(&self) -> bool {
        self.app.as_ref().and_then(|app| app.app_token()).is_some()
    }

    /// Number of live clients known to the engine.
    pub fn client_count(&self) -> usize {
        self.clients
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Dispatch `descriptor` on `client`, delivering the outcome to `sink`.
    ///
    /// Returns the slot id, or `None` when an error was delivered instead.
    pub fn dispatch(
        &self,
        client: &AsyncClient,
        descriptor: &OperationDescriptor,
        sink: ResultSink,
        is_async: bool,
    ) -> Option<SlotId> {
        let kind = descriptor.kind();

        let Some(token) = self.app.as_ref().and_then(|app| app.app_token()) else {
            tracing::warn!(%kind, "no app bound");
            sink.deliver_error(FirebaseError::AppNotAssigned);
            return None;
        };

        let locator = match ResourceLocator::resolve(&descriptor.parent, &token.project_id) {
            Ok(locator) => locator,
            Err(error) => {
                tracing::warn!(%kind, "no project to address");
                sink.deliver_error(error);
                return None;
            }
        };

        let target = build_target(&locator, &descriptor.operation);
        let body = build_body(&locator, &descriptor.operation);
        let request = SlotRequest {
            origin: self.origin.clone(),
            host: self.host.clone(),
            path: format!("{API_PREFIX}{}", target.path),
            method: descriptor.operation.method(),
            query: target.query,
            body,
            token: token.token,
            uid: sink.uid().to_string(),
            is_async,
        };
        tracing::debug!(%kind, app = token.app_id, target = %locator, "dispatching");

        let id = match client.new_slot(request, sink) {
            Ok(id) => id,
            Err(sink) => {
                tracing::warn!(%kind, max_slots = client.max_slots(), "no slot available");
                sink.deliver_error(FirebaseError::OperationCancelled);
                return None;
            }
        };

        self.register(client);
        client.process();
        client.handle_remove();
        Some(id)
    }

    /// Blocking call reporting only success.
    pub fn execute(&self, client: &AsyncClient, descriptor: &OperationDescriptor) -> bool {
        self.execute_blocking(client, descriptor).is_ok()
    }

    /// Dispatch and tick the scheduler until the outcome arrives.
    pub fn execute_blocking(
        &self,
        client: &AsyncClient,
        descriptor: &OperationDescriptor,
    ) -> AsyncResult {
        let owned = OwnedResult::new();
        self.dispatch(client, descriptor, ResultSink::owned(&owned), false);

        while !owned.is_ready() {
            self.run_loop();
            if owned.is_ready() {
                break;
            }
            thread::sleep(self.config.poll_interval());
        }

        owned
            .take()
            .unwrap_or_else(|| AsyncResult::from_error("", FirebaseError::OperationCancelled))
    }

    /// Dispatch and write the outcome into `result` when it arrives.
    pub fn execute_with_result(
        &self,
        client: &AsyncClient,
        descriptor: &OperationDescriptor,
        result: &SharedResult,
    ) -> Option<SlotId> {
        self.dispatch(client, descriptor, ResultSink::external(result), true)
    }

    /// Dispatch and call `callback` with the outcome, tagged with `uid`.
    pub fn execute_with_callback(
        &self,
        client: &AsyncClient,
        descriptor: &OperationDescriptor,
        uid: impl Into<String>,
        callback: impl FnOnce(&AsyncResult) + 'static,
    ) -> Option<SlotId> {
        self.dispatch(client, descriptor, ResultSink::callback(uid, callback), true)
    }

    /// One scheduler tick over every registered client.
    ///
    /// Dropped clients are forgotten.
    pub fn run_loop(&self) {
        let live: Vec<AsyncClient> = {
            let mut clients = self.clients.borrow_mut();
            clients.retain(|weak| weak.strong_count() > 0);
            clients.iter().filter_map(AsyncClient::from_weak).collect()
        };

        for client in live {
            client.process();
            client.handle_remove();
        }
    }

    fn register(&self, client: &AsyncClient) {
        let mut clients = self.clients.borrow_mut();
        if !clients.iter().any(|weak| client.refers_to(weak)) {
            clients.push(client.downgrade());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AppBinding, AppToken};
    use crate::locator::ParentResource;
    use crate::mask::DocumentMask;
    use crate::operation::Operation;
    use firelink_http::MockExecutor;
    use std::cell::Cell;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new(
            ParentResource::new("p", ""),
            Operation::get_index("users", "i1"),
        )
    }

    #[test]
    fn engine_host_from_config() {
        let engine = Firestore::with_config(
            FirestoreConfig::default().with_service_url("http://localhost:8080"),
        )
        .unwrap();
        assert_eq!(engine.origin, "http://localhost:8080");
        assert_eq!(engine.host, "localhost:8080");

        let default = Firestore::new();
        assert_eq!(default.origin, "https://firestore.googleapis.com");
        assert_eq!(default.host, "firestore.googleapis.com");
    }

    #[test]
    fn no_app_delivers_app_not_assigned_without_slot() {
        let engine = Firestore::new();
        let client = AsyncClient::new(MockExecutor::new());
        let calls = Rc::new(Cell::new(0));
        let code = Rc::new(Cell::new(0));

        let (c, k) = (Rc::clone(&calls), Rc::clone(&code));
        let slot = engine.execute_with_callback(&client, &descriptor(), "u1", move |result| {
            c.set(c.get() + 1);
            k.set(result.error().map_or(0, FirebaseError::code));
        });

        assert_eq!(slot, None);
        assert_eq!(calls.get(), 1);
        assert_eq!(code.get(), -104);
        assert_eq!(client.slot_count(), 0);
        assert_eq!(engine.client_count(), 0);
    }

    #[test]
    fn deinit_app_is_unassigned() {
        let mut engine = Firestore::new();
        let binding = AppBinding::new(AppToken::new(1, "t", "p"));
        engine.set_app(binding.clone());
        assert!(engine.is_app_ready());

        binding.deinit();
        assert!(!engine.is_app_ready());
        let result = engine.execute_blocking(&AsyncClient::new(MockExecutor::new()), &descriptor());
        assert_eq!(result.error(), Some(&FirebaseError::AppNotAssigned));
    }

    #[test]
    fn missing_project_is_unassigned() {
        let mut engine = Firestore::new();
        engine.set_app(AppToken::new(1, "t", ""));
        let shared: SharedResult = Rc::default();
        let client = AsyncClient::new(MockExecutor::new());
        let op = OperationDescriptor::new(
            ParentResource::app_default(),
            Operation::get_document("c/d", DocumentMask::default(), Default::default()),
        );

        assert_eq!(engine.execute_with_result(&client, &op, &shared), None);
        assert_eq!(shared.borrow().error(), Some(&FirebaseError::AppNotAssigned));
    }

    #[test]
    fn clients_register_once_and_are_pruned() {
        let mut engine = Firestore::new();
        engine.set_app(AppToken::new(1, "t", "p"));
        let mock = MockExecutor::new().with_pending_polls(10);
        {
            let client = AsyncClient::new(mock);
            let shared: SharedResult = Rc::default();
            engine.execute_with_result(&client, &descriptor(), &shared);
            engine.execute_with_result(&client, &descriptor(), &shared);
            assert_eq!(engine.client_count(), 1);
        }
        assert_eq!(engine.client_count(), 0);
        engine.run_loop();
        assert!(engine.clients.borrow().is_empty());
    }
}
