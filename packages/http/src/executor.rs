//! Non-blocking HTTP execution.
//!
//! An executor accepts a request under a caller-chosen id and is then polled
//! for the outcome. Neither call may block on network I/O, so a single thread
//! can drive many requests by polling each of them in turn.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::error::Error;
use crate::handle::{Outstanding, RequestId, RequestStatus};
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests without blocking the caller.
///
/// Implementations can use real HTTP clients or scripted responses for testing.
pub trait HttpExecutor {
    /// Begin executing `request` under `id`.
    fn start(&mut self, id: RequestId, request: HttpRequest) -> Result<(), Error>;

    /// Check on request `id`.
    ///
    /// Returns `None` while it is still in flight. Once an outcome is
    /// returned the id is forgotten.
    fn poll(&mut self, id: RequestId) -> Option<Result<HttpResponse, Error>>;

    /// Forget request `id`; a late outcome is discarded.
    fn cancel(&mut self, id: RequestId) {
        let _ = id;
    }
}

type HandleTable = Arc<Mutex<HashMap<RequestId, Outstanding>>>;

/// Production executor using reqwest.
///
/// Every started request runs on its own background thread; `poll` only
/// inspects the shared handle table.
pub struct ReqwestExecutor {
    client: Client,
    handles: HandleTable,
}

impl ReqwestExecutor {
    /// Create a new executor with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            handles: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30))
    }

    /// Number of requests started but not yet polled to completion.
    pub fn outstanding(&self) -> usize {
        self.handles.lock().map(|h| h.len()).unwrap_or(0)
    }

    fn execute_request(client: &Client, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method: http::Method = request.method.into();

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str())?;
            let header_value = HeaderValue::try_from(value.as_str())?;
            headers.insert(header_name, header_value);
        }

        let mut req_builder = client.request(method, &request.url).headers(headers);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if let Some(body) = request.body {
            if !request.headers.contains_key(CONTENT_TYPE.as_str()) {
                req_builder = req_builder.header(CONTENT_TYPE, "application/json");
            }
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send()?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let mut resp_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response.text()?;
        let mut result = HttpResponse::from_text(status, status_text, body_text);
        result.headers = resp_headers;
        Ok(result)
    }

    fn lock_error<T>(e: std::sync::PoisonError<T>) -> Error {
        Error::Lock {
            message: e.to_string(),
        }
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn start(&mut self, id: RequestId, request: HttpRequest) -> Result<(), Error> {
        {
            let mut handles = self.handles.lock().map_err(Self::lock_error)?;
            if handles.contains_key(&id) {
                return Err(Error::DuplicateRequest { id });
            }
            handles.insert(id, Outstanding::pending(id));
        }

        let handles = Arc::clone(&self.handles);
        let client = self.client.clone();
        thread::spawn(move || {
            let result = Self::execute_request(&client, request);

            if let Ok(mut handles) = handles.lock() {
                // Cancelled requests were removed from the table; drop their outcome.
                if let Some(handle) = handles.get_mut(&id) {
                    match result {
                        Ok(response) => {
                            handle.status = RequestStatus::complete(id);
                            handle.response = Some(response);
                        }
                        Err(error) => {
                            tracing::debug!(id, %error, "request failed");
                            handle.status =
                                RequestStatus::failed(id, error.code(), error.to_string());
                        }
                    }
                }
            }
        });

        Ok(())
    }

    fn poll(&mut self, id: RequestId) -> Option<Result<HttpResponse, Error>> {
        let mut handles = match self.handles.lock() {
            Ok(handles) => handles,
            Err(e) => return Some(Err(Self::lock_error(e))),
        };

        if handles.get(&id)?.status.is_pending() {
            return None;
        }
        handles.remove(&id)?.into_outcome()
    }

    fn cancel(&mut self, id: RequestId) {
        if let Ok(mut handles) = self.handles.lock() {
            handles.remove(&id);
        }
    }
}

/// Scripted HTTP executor for tests.
///
/// Returns predefined responses keyed by URL path, optionally after a number
/// of pending polls.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;

    #[derive(Default)]
    struct MockState {
        responses: HashMap<String, HttpResponse>,
        default_response: Option<HttpResponse>,
        recorded_requests: Vec<HttpRequest>,
        in_flight: HashMap<RequestId, (usize, HttpRequest)>,
        pending_polls: usize,
        fail_message: Option<String>,
        reject_start: bool,
        cancelled: Vec<RequestId>,
    }

    /// A mock HTTP executor that returns predefined responses.
    ///
    /// Clones share state, so a test can keep one clone for inspection after
    /// handing the other to a client.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        state: Arc<Mutex<MockState>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a specific URL path (query excluded).
        pub fn with_response(self, path: impl Into<String>, response: HttpResponse) -> Self {
            self.state
                .lock()
                .unwrap()
                .responses
                .insert(path.into(), response);
            self
        }

        /// Set a default response when no path matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            self.state.lock().unwrap().default_response = Some(response);
            self
        }

        /// Number of polls that report "still in flight" before completing.
        pub fn with_pending_polls(self, polls: usize) -> Self {
            self.state.lock().unwrap().pending_polls = polls;
            self
        }

        /// Complete every request with a transport error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            self.state.lock().unwrap().fail_message = Some(message.into());
            self
        }

        /// Refuse to start any request.
        pub fn reject_start(self) -> Self {
            self.state.lock().unwrap().reject_start = true;
            self
        }

        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.state.lock().unwrap().recorded_requests.clone()
        }

        pub fn cancelled(&self) -> Vec<RequestId> {
            self.state.lock().unwrap().cancelled.clone()
        }

        pub fn in_flight(&self) -> usize {
            self.state.lock().unwrap().in_flight.len()
        }

        pub fn success_response(body: serde_json::Value) -> HttpResponse {
            HttpResponse::from_text(200, "OK", body.to_string())
        }

        pub fn error_response(status: u16, message: &str) -> HttpResponse {
            let body = serde_json::json!({"error": {"code": status, "message": message}});
            HttpResponse::from_text(status, message, body.to_string())
        }

        pub fn not_found() -> HttpResponse {
            Self::error_response(404, "Not Found")
        }

        fn path_of(url: &str) -> String {
            url::Url::parse(url)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| url.to_string())
        }
    }

    impl HttpExecutor for MockExecutor {
        fn start(&mut self, id: RequestId, request: HttpRequest) -> Result<(), Error> {
            let mut state = self.state.lock().unwrap();
            state.recorded_requests.push(request.clone());
            if state.reject_start {
                return Err(Error::Transport {
                    code: crate::error::code::CONNECTION_REFUSED,
                    message: "connection refused".to_string(),
                });
            }
            if state.in_flight.contains_key(&id) {
                return Err(Error::DuplicateRequest { id });
            }
            let polls = state.pending_polls;
            state.in_flight.insert(id, (polls, request));
            Ok(())
        }

        fn poll(&mut self, id: RequestId) -> Option<Result<HttpResponse, Error>> {
            let mut state = self.state.lock().unwrap();
            let (remaining, _) = state.in_flight.get_mut(&id)?;
            if *remaining > 0 {
                *remaining -= 1;
                return None;
            }
            let (_, request) = state.in_flight.remove(&id)?;

            if let Some(message) = &state.fail_message {
                return Some(Err(Error::Transport {
                    code: crate::error::code::SEND_FAILED,
                    message: message.clone(),
                }));
            }

            let path = Self::path_of(&request.url);
            let response = state
                .responses
                .get(&path)
                .or(state.default_response.as_ref())
                .cloned()
                .unwrap_or_else(Self::not_found);
            Some(Ok(response))
        }

        fn cancel(&mut self, id: RequestId) {
            let mut state = self.state.lock().unwrap();
            if state.in_flight.remove(&id).is_some() {
                state.cancelled.push(id);
            }
        }
    }
}
