use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::HttpResponse;

/// Identifier of a request handed to an executor.
pub type RequestId = u64;

/// The state of an outstanding HTTP request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Request is in progress
    Pending,
    /// Request completed with a response (any status)
    Complete,
    /// Request failed before a response was read
    Failed,
}

/// Status of an outstanding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStatus {
    pub id: RequestId,

    pub state: RequestState,

    /// Transport code if state is Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,

    /// Error message if state is Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestStatus {
    pub fn pending(id: RequestId) -> Self {
        Self {
            id,
            state: RequestState::Pending,
            code: None,
            error: None,
        }
    }

    pub fn complete(id: RequestId) -> Self {
        Self {
            id,
            state: RequestState::Complete,
            code: None,
            error: None,
        }
    }

    pub fn failed(id: RequestId, code: i32, error: String) -> Self {
        Self {
            id,
            state: RequestState::Failed,
            code: Some(code),
            error: Some(error),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    pub fn is_complete(&self) -> bool {
        self.state == RequestState::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.state == RequestState::Failed
    }
}

/// Executor-side record of one request: its status plus the response once read.
#[derive(Debug)]
pub(crate) struct Outstanding {
    pub status: RequestStatus,
    pub response: Option<HttpResponse>,
}

impl Outstanding {
    pub fn pending(id: RequestId) -> Self {
        Self {
            status: RequestStatus::pending(id),
            response: None,
        }
    }

    /// Convert a finished record into the executor's poll outcome.
    ///
    /// Returns `None` while the request is still pending.
    pub fn into_outcome(self) -> Option<Result<HttpResponse, Error>> {
        match self.status.state {
            RequestState::Pending => None,
            RequestState::Complete => Some(self.response.ok_or_else(|| Error::Transport {
                code: crate::error::code::RESPONSE_FAILED,
                message: "response missing".to_string(),
            })),
            RequestState::Failed => Some(Err(Error::Transport {
                code: self.status.code.unwrap_or(crate::error::code::UNKNOWN),
                message: self.status.error.unwrap_or_default(),
            })),
        }
    }
}
