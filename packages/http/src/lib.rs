//! # firelink-http
//!
//! Transport layer for firelink.
//!
//! Requests are described as plain [`HttpRequest`] values and handed to an
//! [`HttpExecutor`], which runs them without blocking the caller. The caller
//! polls each request id until an outcome is available:
//!
//! ```ignore
//! use firelink_http::{HttpExecutor, HttpRequest, ReqwestExecutor};
//!
//! let mut executor = ReqwestExecutor::with_default_timeout()?;
//! executor.start(0, HttpRequest::get("https://example.com/items").with_query("pageSize", "10"))?;
//!
//! let response = loop {
//!     if let Some(outcome) = executor.poll(0) {
//!         break outcome?;
//!     }
//!     // do other work
//! };
//! ```
//!
//! Query parameters are kept as an ordered list; the order they were added
//! in is the order they appear on the wire.

pub mod error;
pub mod executor;
pub mod handle;
pub mod types;

pub use error::Error;
#[cfg(any(test, feature = "test-utils"))]
pub use executor::mock::MockExecutor;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use handle::{RequestId, RequestState, RequestStatus};
pub use types::{encode_query, HttpRequest, HttpResponse, Method};
