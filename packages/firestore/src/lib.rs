//! # firelink-firestore
//!
//! Non-blocking dispatch engine for the Firestore REST API.
//!
//! An [`Operation`] describes one call (create, get, list, query, commit,
//! index management...). [`Firestore`] resolves it against the bound app and
//! target database into a method, path, ordered query and JSON body, then
//! places it in a slot on an [`AsyncClient`]. Slots are driven by ticking
//! [`Firestore::run_loop`]; each delivers exactly one [`AsyncResult`] to the
//! sink chosen at dispatch time.
//!
//! ```ignore
//! use firelink_firestore::{AppToken, AsyncClient, DocumentMask, Firestore, Operation,
//!     OperationDescriptor, ParentResource};
//! use firelink_http::ReqwestExecutor;
//!
//! let mut engine = Firestore::new();
//! engine.set_app(AppToken::new(1, token, "my-project"));
//! let client = AsyncClient::new(ReqwestExecutor::with_default_timeout()?);
//!
//! let op = OperationDescriptor::new(
//!     ParentResource::app_default(),
//!     Operation::get_document("users/alice", DocumentMask::new("name"), Default::default()),
//! );
//! engine.execute_with_callback(&client, &op, "lookup", |result| {
//!     println!("{} {}", result.uid(), result.payload());
//! });
//! loop {
//!     engine.run_loop();
//!     // other work
//! }
//! ```

pub mod auth;
pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod firestore;
pub mod locator;
pub mod mask;
pub mod operation;
pub mod payload;
pub mod query;
pub mod result;
pub mod write;

pub use auth::{AppBinding, AppToken, AuthProvider};
pub use client::{AsyncClient, SlotId, SlotRequest};
pub use config::{ClientConfig, FirestoreConfig};
pub use error::{Error, FirebaseError, Result};
pub use firestore::{Firestore, API_PREFIX};
pub use locator::{ParentResource, ResourceLocator, DEFAULT_DATABASE_ID};
pub use mask::DocumentMask;
pub use operation::{
    split_document_path, Consistency, ConsistencyMode, Index, IndexField, IndexFieldMode,
    ListDocumentsOptions, Operation, OperationDescriptor, OperationKind, Precondition,
    ReadConsistency, StorageTransfer, TransactionOptions,
};
pub use payload::Payload;
pub use query::{build_target, QueryParams, RequestTarget};
pub use result::{AsyncResult, AsyncResultCallback, OwnedResult, ResultSink, SharedResult};
pub use write::{FieldTransform, Transform, Write, WriteKind};
