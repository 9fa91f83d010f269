//! Declarative description of one database operation.
//!
//! Every [`Operation`] variant carries exactly the fields its REST call
//! needs. Options that the service treats as a oneof (consistency selectors,
//! preconditions) are enums, so conflicting selectors cannot be expressed.

use std::fmt;

use firelink_http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::locator::ParentResource;
use crate::mask::DocumentMask;
use crate::payload::Payload;
use crate::query::QueryParams;
use crate::write::Write;

/// Field-less tag naming an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ExportDocuments,
    ImportDocuments,
    BeginTransaction,
    Rollback,
    BatchGet,
    BatchWrite,
    Commit,
    CreateDocument,
    GetDocument,
    PatchDocument,
    DeleteDocument,
    RunQuery,
    ListDocuments,
    ListCollectionIds,
    CreateIndex,
    DeleteIndex,
    GetIndex,
    ListIndexes,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ExportDocuments => "exportDocuments",
            OperationKind::ImportDocuments => "importDocuments",
            OperationKind::BeginTransaction => "beginTransaction",
            OperationKind::Rollback => "rollback",
            OperationKind::BatchGet => "batchGet",
            OperationKind::BatchWrite => "batchWrite",
            OperationKind::Commit => "commit",
            OperationKind::CreateDocument => "createDocument",
            OperationKind::GetDocument => "getDocument",
            OperationKind::PatchDocument => "patchDocument",
            OperationKind::DeleteDocument => "deleteDocument",
            OperationKind::RunQuery => "runQuery",
            OperationKind::ListDocuments => "listDocuments",
            OperationKind::ListCollectionIds => "listCollectionIds",
            OperationKind::CreateIndex => "createIndex",
            OperationKind::DeleteIndex => "deleteIndex",
            OperationKind::GetIndex => "getIndex",
            OperationKind::ListIndexes => "listIndexes",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOptions {
    #[serde(rename = "readOnly")]
    ReadOnly {
        #[serde(rename = "readTime", default, skip_serializing_if = "Option::is_none")]
        read_time: Option<String>,
    },
    #[serde(rename = "readWrite")]
    ReadWrite {
        #[serde(
            rename = "retryTransaction",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        retry_transaction: Option<String>,
    },
}

impl TransactionOptions {
    pub fn read_only() -> Self {
        TransactionOptions::ReadOnly { read_time: None }
    }

    pub fn read_only_at(read_time: impl Into<String>) -> Self {
        TransactionOptions::ReadOnly {
            read_time: Some(read_time.into()),
        }
    }

    pub fn read_write() -> Self {
        TransactionOptions::ReadWrite {
            retry_transaction: None,
        }
    }

    pub fn retry(transaction: impl Into<String>) -> Self {
        TransactionOptions::ReadWrite {
            retry_transaction: Some(transaction.into()),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Which selector a [`Consistency`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyMode {
    #[default]
    Undefined,
    Transaction,
    NewTransaction,
    ReadTime,
}

/// Read consistency for queries and batch reads. At most one selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Consistency {
    #[default]
    Default,
    /// Read within an existing transaction (opaque base64 token).
    Transaction(String),
    /// Start a new transaction and read within it.
    NewTransaction(TransactionOptions),
    /// Read as of a timestamp (RFC 3339).
    ReadTime(String),
}

impl Consistency {
    /// Build from a mode plus its textual value.
    ///
    /// For `NewTransaction` the value is the JSON form of
    /// [`TransactionOptions`]; an empty value means a read-write transaction.
    pub fn from_parts(mode: ConsistencyMode, value: &str) -> Result<Self, serde_json::Error> {
        Ok(match mode {
            ConsistencyMode::Undefined => Consistency::Default,
            ConsistencyMode::Transaction => Consistency::Transaction(value.to_string()),
            ConsistencyMode::ReadTime => Consistency::ReadTime(value.to_string()),
            ConsistencyMode::NewTransaction if value.trim().is_empty() => {
                Consistency::NewTransaction(TransactionOptions::read_write())
            }
            ConsistencyMode::NewTransaction => {
                Consistency::NewTransaction(serde_json::from_str(value)?)
            }
        })
    }

    pub fn mode(&self) -> ConsistencyMode {
        match self {
            Consistency::Default => ConsistencyMode::Undefined,
            Consistency::Transaction(_) => ConsistencyMode::Transaction,
            Consistency::NewTransaction(_) => ConsistencyMode::NewTransaction,
            Consistency::ReadTime(_) => ConsistencyMode::ReadTime,
        }
    }

    /// Add the selector to a request body object.
    pub fn write_json(&self, body: &mut Map<String, Value>) {
        match self {
            Consistency::Default => {}
            Consistency::Transaction(token) => {
                body.insert("transaction".into(), Value::String(token.clone()));
            }
            Consistency::NewTransaction(options) => {
                body.insert("newTransaction".into(), options.to_json());
            }
            Consistency::ReadTime(time) => {
                body.insert("readTime".into(), Value::String(time.clone()));
            }
        }
    }
}

/// Consistency for a single-document GET, which cannot open a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadConsistency {
    #[default]
    Default,
    Transaction(String),
    ReadTime(String),
}

impl From<ReadConsistency> for Consistency {
    fn from(read: ReadConsistency) -> Self {
        match read {
            ReadConsistency::Default => Consistency::Default,
            ReadConsistency::Transaction(token) => Consistency::Transaction(token),
            ReadConsistency::ReadTime(time) => Consistency::ReadTime(time),
        }
    }
}

/// Condition the target document must meet for a write to apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Precondition {
    #[default]
    None,
    Exists(bool),
    /// Last update time (RFC 3339) the document must have.
    UpdateTime(String),
}

impl Precondition {
    pub fn append_query(&self, query: &mut QueryParams) {
        match self {
            Precondition::None => {}
            Precondition::Exists(exists) => {
                query.push("currentDocument.exists", exists.to_string());
            }
            Precondition::UpdateTime(time) => {
                query.push_non_empty("currentDocument.updateTime", time);
            }
        }
    }

    pub fn to_json(&self) -> Option<Value> {
        match self {
            Precondition::None => None,
            Precondition::Exists(exists) => Some(serde_json::json!({ "exists": exists })),
            Precondition::UpdateTime(time) => Some(serde_json::json!({ "updateTime": time })),
        }
    }
}

/// Cloud Storage location and collections for export/import.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageTransfer {
    pub bucket_id: String,
    pub storage_path: String,
    /// Empty means all collections.
    pub collection_ids: Vec<String>,
}

impl StorageTransfer {
    /// `collection_ids` is a comma-separated list.
    pub fn new(
        bucket_id: impl Into<String>,
        storage_path: impl Into<String>,
        collection_ids: &str,
    ) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            storage_path: storage_path.into(),
            collection_ids: split_list(collection_ids),
        }
    }

    /// `gs://<bucket>[/<path>]`
    pub fn uri_prefix(&self) -> String {
        let bucket = self.bucket_id.trim_start_matches("gs://").trim_end_matches('/');
        let path = self.storage_path.trim_matches('/');
        if path.is_empty() {
            format!("gs://{bucket}")
        } else {
            format!("gs://{bucket}/{path}")
        }
    }
}

/// How one indexed field is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFieldMode {
    Ascending,
    Descending,
    ArrayContains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub field_path: String,
    pub mode: IndexFieldMode,
}

impl IndexField {
    pub fn new(field_path: impl Into<String>, mode: IndexFieldMode) -> Self {
        Self {
            field_path: field_path.into(),
            mode,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut field = Map::new();
        field.insert("fieldPath".into(), Value::String(self.field_path.clone()));
        let (key, value) = match self.mode {
            IndexFieldMode::Ascending => ("order", "ASCENDING"),
            IndexFieldMode::Descending => ("order", "DESCENDING"),
            IndexFieldMode::ArrayContains => ("arrayConfig", "CONTAINS"),
        };
        field.insert(key.into(), Value::String(value.into()));
        Value::Object(field)
    }
}

/// Composite index definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Index {
    /// `ANY_API` or `DATASTORE_MODE_API`; empty leaves the service default.
    pub api_scope: String,
    /// `COLLECTION` or `COLLECTION_GROUP`.
    pub query_scope: String,
    pub fields: Vec<IndexField>,
}

impl Index {
    pub fn new(query_scope: impl Into<String>, fields: Vec<IndexField>) -> Self {
        Self {
            api_scope: String::new(),
            query_scope: query_scope.into(),
            fields,
        }
    }

    pub fn with_api_scope(mut self, api_scope: impl Into<String>) -> Self {
        self.api_scope = api_scope.into();
        self
    }
}

/// Paging and ordering for [`Operation::list_documents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDocumentsOptions {
    /// -1 leaves the page size to the service.
    pub page_size: i32,
    pub page_token: String,
    pub order_by: String,
    pub mask: DocumentMask,
    pub show_missing: bool,
}

impl Default for ListDocumentsOptions {
    fn default() -> Self {
        Self {
            page_size: -1,
            page_token: String::new(),
            order_by: String::new(),
            mask: DocumentMask::default(),
            show_missing: false,
        }
    }
}

/// One database operation and the fields it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ExportDocuments(StorageTransfer),
    ImportDocuments(StorageTransfer),
    BeginTransaction {
        options: Option<TransactionOptions>,
    },
    Rollback {
        transaction: String,
    },
    BatchGet {
        /// Document paths relative to the database's `documents` root.
        documents: Vec<String>,
        mask: DocumentMask,
        consistency: Consistency,
    },
    BatchWrite {
        writes: Vec<Write>,
        labels: Map<String, Value>,
    },
    Commit {
        writes: Vec<Write>,
        transaction: Option<String>,
    },
    CreateDocument {
        collection_id: String,
        /// Empty lets the service assign an id.
        document_id: String,
        mask: DocumentMask,
        document: String,
    },
    GetDocument {
        document_path: String,
        mask: DocumentMask,
        consistency: ReadConsistency,
    },
    PatchDocument {
        document_path: String,
        update_mask: DocumentMask,
        mask: DocumentMask,
        precondition: Precondition,
        document: String,
    },
    DeleteDocument {
        document_path: String,
        mask: DocumentMask,
        precondition: Precondition,
    },
    RunQuery {
        /// Parent document path; empty queries the database root.
        document_path: String,
        structured_query: Value,
        consistency: Consistency,
    },
    ListDocuments {
        collection_id: String,
        page_size: i32,
        page_token: String,
        order_by: String,
        mask: DocumentMask,
        show_missing: bool,
    },
    ListCollectionIds {
        document_path: String,
        page_size: i32,
        page_token: String,
    },
    CreateIndex {
        collection_id: String,
        index: Index,
    },
    DeleteIndex {
        collection_id: String,
        index_id: String,
    },
    GetIndex {
        collection_id: String,
        index_id: String,
    },
    ListIndexes {
        collection_id: String,
        filter: String,
        page_size: i32,
        page_token: String,
    },
}

impl Operation {
    pub fn export_documents(
        collection_ids: &str,
        bucket_id: impl Into<String>,
        storage_path: impl Into<String>,
    ) -> Self {
        Operation::ExportDocuments(StorageTransfer::new(bucket_id, storage_path, collection_ids))
    }

    pub fn import_documents(
        collection_ids: &str,
        bucket_id: impl Into<String>,
        storage_path: impl Into<String>,
    ) -> Self {
        Operation::ImportDocuments(StorageTransfer::new(bucket_id, storage_path, collection_ids))
    }

    pub fn begin_transaction(options: Option<TransactionOptions>) -> Self {
        Operation::BeginTransaction { options }
    }

    pub fn rollback(transaction: impl Into<String>) -> Self {
        Operation::Rollback {
            transaction: transaction.into(),
        }
    }

    pub fn batch_get<I, S>(documents: I, mask: DocumentMask, consistency: Consistency) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operation::BatchGet {
            documents: documents.into_iter().map(Into::into).collect(),
            mask,
            consistency,
        }
    }

    pub fn batch_write(writes: Vec<Write>, labels: Map<String, Value>) -> Self {
        Operation::BatchWrite { writes, labels }
    }

    pub fn commit(writes: Vec<Write>, transaction: Option<String>) -> Self {
        Operation::Commit {
            writes,
            transaction,
        }
    }

    pub fn create_document(
        collection_id: impl Into<String>,
        document_id: impl Into<String>,
        mask: DocumentMask,
        document: &impl Payload,
    ) -> Self {
        Operation::CreateDocument {
            collection_id: collection_id.into(),
            document_id: document_id.into(),
            mask,
            document: document.to_body(),
        }
    }

    /// Create from a combined path, see [`split_document_path`].
    pub fn create_document_at(
        document_path: &str,
        mask: DocumentMask,
        document: &impl Payload,
    ) -> Self {
        let (collection_id, document_id) = split_document_path(document_path);
        Self::create_document(collection_id, document_id, mask, document)
    }

    pub fn get_document(
        document_path: impl Into<String>,
        mask: DocumentMask,
        consistency: ReadConsistency,
    ) -> Self {
        Operation::GetDocument {
            document_path: document_path.into(),
            mask,
            consistency,
        }
    }

    pub fn patch_document(
        document_path: impl Into<String>,
        update_mask: DocumentMask,
        mask: DocumentMask,
        precondition: Precondition,
        document: &impl Payload,
    ) -> Self {
        Operation::PatchDocument {
            document_path: document_path.into(),
            update_mask,
            mask,
            precondition,
            document: document.to_body(),
        }
    }

    pub fn delete_document(document_path: impl Into<String>, precondition: Precondition) -> Self {
        Operation::DeleteDocument {
            document_path: document_path.into(),
            mask: DocumentMask::default(),
            precondition,
        }
    }

    pub fn run_query(
        document_path: impl Into<String>,
        structured_query: Value,
        consistency: Consistency,
    ) -> Self {
        Operation::RunQuery {
            document_path: document_path.into(),
            structured_query,
            consistency,
        }
    }

    pub fn list_documents(collection_id: impl Into<String>, options: ListDocumentsOptions) -> Self {
        Operation::ListDocuments {
            collection_id: collection_id.into(),
            page_size: options.page_size,
            page_token: options.page_token,
            order_by: options.order_by,
            mask: options.mask,
            show_missing: options.show_missing,
        }
    }

    pub fn list_collection_ids(
        document_path: impl Into<String>,
        page_size: i32,
        page_token: impl Into<String>,
    ) -> Self {
        Operation::ListCollectionIds {
            document_path: document_path.into(),
            page_size,
            page_token: page_token.into(),
        }
    }

    pub fn create_index(collection_id: impl Into<String>, index: Index) -> Self {
        Operation::CreateIndex {
            collection_id: collection_id.into(),
            index,
        }
    }

    pub fn delete_index(collection_id: impl Into<String>, index_id: impl Into<String>) -> Self {
        Operation::DeleteIndex {
            collection_id: collection_id.into(),
            index_id: index_id.into(),
        }
    }

    pub fn get_index(collection_id: impl Into<String>, index_id: impl Into<String>) -> Self {
        Operation::GetIndex {
            collection_id: collection_id.into(),
            index_id: index_id.into(),
        }
    }

    pub fn list_indexes(
        collection_id: impl Into<String>,
        filter: impl Into<String>,
        page_size: i32,
        page_token: impl Into<String>,
    ) -> Self {
        Operation::ListIndexes {
            collection_id: collection_id.into(),
            filter: filter.into(),
            page_size,
            page_token: page_token.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::ExportDocuments(_) => OperationKind::ExportDocuments,
            Operation::ImportDocuments(_) => OperationKind::ImportDocuments,
            Operation::BeginTransaction { .. } => OperationKind::BeginTransaction,
            Operation::Rollback { .. } => OperationKind::Rollback,
            Operation::BatchGet { .. } => OperationKind::BatchGet,
            Operation::BatchWrite { .. } => OperationKind::BatchWrite,
            Operation::Commit { .. } => OperationKind::Commit,
            Operation::CreateDocument { .. } => OperationKind::CreateDocument,
            Operation::GetDocument { .. } => OperationKind::GetDocument,
            Operation::PatchDocument { .. } => OperationKind::PatchDocument,
            Operation::DeleteDocument { .. } => OperationKind::DeleteDocument,
            Operation::RunQuery { .. } => OperationKind::RunQuery,
            Operation::ListDocuments { .. } => OperationKind::ListDocuments,
            Operation::ListCollectionIds { .. } => OperationKind::ListCollectionIds,
            Operation::CreateIndex { .. } => OperationKind::CreateIndex,
            Operation::DeleteIndex { .. } => OperationKind::DeleteIndex,
            Operation::GetIndex { .. } => OperationKind::GetIndex,
            Operation::ListIndexes { .. } => OperationKind::ListIndexes,
        }
    }

    /// HTTP method of the REST call.
    pub fn method(&self) -> Method {
        match self.kind() {
            OperationKind::GetDocument
            | OperationKind::ListDocuments
            | OperationKind::GetIndex
            | OperationKind::ListIndexes => Method::GET,
            OperationKind::PatchDocument => Method::PATCH,
            OperationKind::DeleteDocument | OperationKind::DeleteIndex => Method::DELETE,
            _ => Method::POST,
        }
    }
}

/// An operation bound to the project/database it targets.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub parent: ParentResource,
    pub operation: Operation,
}

impl OperationDescriptor {
    pub fn new(parent: ParentResource, operation: Operation) -> Self {
        Self { parent, operation }
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }
}

/// Split a combined document path into `(collection_id, document_id)`.
///
/// Paths alternate collection and document segments, so the trailing segment
/// is a document id only when the path has an odd number of `/` separators.
/// Otherwise the whole path names a collection and the id is empty.
pub fn split_document_path(document_path: &str) -> (String, String) {
    let separators = document_path.matches('/').count();
    match document_path.rfind('/') {
        Some(pos) if separators % 2 == 1 => (
            document_path[..pos].to_string(),
            document_path[pos + 1..].to_string(),
        ),
        _ => (document_path.to_string(), String::new()),
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
