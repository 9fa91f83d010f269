//! Request outcomes and the sinks they are delivered through.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use firelink_http::HttpResponse;
use serde_json::Value;

use crate::error::FirebaseError;

/// Outcome of one dispatched request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsyncResult {
    uid: String,
    payload: String,
    http_status: Option<u16>,
    error: Option<FirebaseError>,
    available: bool,
}

impl AsyncResult {
    pub fn from_error(uid: impl Into<String>, error: FirebaseError) -> Self {
        Self {
            uid: uid.into(),
            error: Some(error),
            available: true,
            ..Default::default()
        }
    }

    /// A non-2xx status becomes [`FirebaseError::Remote`] carrying the body.
    pub fn from_response(uid: impl Into<String>, response: &HttpResponse) -> Self {
        let payload = response.text().to_string();
        let error = (!response.is_success()).then(|| FirebaseError::Remote {
            status: response.status,
            body: payload.clone(),
        });
        Self {
            uid: uid.into(),
            payload,
            http_status: Some(response.status),
            error,
            available: true,
        }
    }

    pub fn from_outcome(
        uid: impl Into<String>,
        outcome: Result<HttpResponse, firelink_http::Error>,
    ) -> Self {
        match outcome {
            Ok(response) => Self::from_response(uid, &response),
            Err(error) => Self::from_error(uid, error.into()),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Raw response body.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn error(&self) -> Option<&FirebaseError> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// True once an outcome has been written.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn is_ok(&self) -> bool {
        self.available && self.error.is_none()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

/// Caller-owned result slot, updated in place on delivery.
pub type SharedResult = Rc<RefCell<AsyncResult>>;

pub type AsyncResultCallback = Box<dyn FnOnce(&AsyncResult)>;

/// Result storage owned by the engine for blocking calls.
#[derive(Debug, Clone)]
pub struct OwnedResult {
    cell: Rc<OnceCell<AsyncResult>>,
}

impl OwnedResult {
    pub(crate) fn new() -> Self {
        Self {
            cell: Rc::new(OnceCell::new()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Take the result, freeing the storage when this is the last handle.
    pub fn take(self) -> Option<AsyncResult> {
        match Rc::try_unwrap(self.cell) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.get().cloned(),
        }
    }
}

/// Where a request's outcome goes. Consumed by [`ResultSink::deliver`], so
/// every sink receives at most one result.
pub enum ResultSink {
    Callback {
        uid: String,
        callback: AsyncResultCallback,
    },
    External(SharedResult),
    Owned(OwnedResult),
}

impl ResultSink {
    pub fn callback(uid: impl Into<String>, callback: impl FnOnce(&AsyncResult) + 'static) -> Self {
        ResultSink::Callback {
            uid: uid.into(),
            callback: Box::new(callback),
        }
    }

    pub fn external(result: &SharedResult) -> Self {
        ResultSink::External(Rc::clone(result))
    }

    pub(crate) fn owned(result: &OwnedResult) -> Self {
        ResultSink::Owned(result.clone())
    }

    /// uid attached to callback deliveries.
    pub fn uid(&self) -> &str {
        match self {
            ResultSink::Callback { uid, .. } => uid,
            _ => "",
        }
    }

    pub fn deliver(self, mut result: AsyncResult) {
        match self {
            ResultSink::Callback { uid, callback } => {
                if result.uid.is_empty() {
                    result.uid = uid;
                }
                callback(&result);
            }
            ResultSink::External(shared) => {
                *shared.borrow_mut() = result;
            }
            ResultSink::Owned(owned) => {
                // A set cell means a second delivery; the first outcome stands.
                let _ = owned.cell.set(result);
            }
        }
    }

    pub(crate) fn deliver_error(self, error: FirebaseError) {
        let uid = self.uid().to_string();
        self.deliver(AsyncResult::from_error(uid, error));
    }
}

impl fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSink::Callback { uid, .. } => {
                f.debug_struct("Callback").field("uid", uid).finish_non_exhaustive()
            }
            ResultSink::External(shared) => f.debug_tuple("External").field(shared).finish(),
            ResultSink::Owned(owned) => f.debug_tuple("Owned").field(owned).finish(),
        }
    }
}
