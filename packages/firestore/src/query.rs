//! Request path and query construction.

use std::fmt;

use crate::locator::ResourceLocator;
use crate::operation::{Operation, ReadConsistency};

/// Query parameters in insertion order. Repeated names are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Push only when `value` is non-empty.
    pub fn push_non_empty(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.push(name, value);
        }
    }

    /// Push only when `size` is not negative. Zero is a real value.
    pub fn push_page_size(&mut self, size: i32) {
        if size >= 0 {
            self.push("pageSize", size.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    pub fn to_query_string(&self) -> String {
        firelink_http::encode_query(&self.pairs)
    }
}

/// Path (relative to `/v1/projects/`) plus query of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTarget {
    pub path: String,
    pub query: QueryParams,
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query.to_query_string())?;
        }
        Ok(())
    }
}

fn push_segment(path: &mut String, segment: &str) {
    let segment = segment.trim_start_matches('/');
    if !segment.is_empty() {
        path.push('/');
        path.push_str(segment);
    }
}

/// Build the path and query for `operation` under `locator`.
pub fn build_target(locator: &ResourceLocator, operation: &Operation) -> RequestTarget {
    let mut path = locator.base_path();
    let mut query = QueryParams::default();

    match operation {
        Operation::ExportDocuments(_) => path.push_str(":exportDocuments"),
        Operation::ImportDocuments(_) => path.push_str(":importDocuments"),
        Operation::BeginTransaction { .. } => path.push_str("/documents:beginTransaction"),
        Operation::Rollback { .. } => path.push_str("/documents:rollback"),
        Operation::BatchGet { .. } => path.push_str("/documents:batchGet"),
        Operation::BatchWrite { .. } => path.push_str("/documents:batchWrite"),
        Operation::Commit { .. } => path.push_str("/documents:commit"),
        Operation::CreateDocument {
            collection_id,
            document_id,
            mask,
            ..
        } => {
            path.push_str("/documents");
            push_segment(&mut path, collection_id);
            query.push_non_empty("documentId", document_id);
            mask.append_query("mask", &mut query);
        }
        Operation::GetDocument {
            document_path,
            mask,
            consistency,
        } => {
            path.push_str("/documents");
            push_segment(&mut path, document_path);
            mask.append_query("mask", &mut query);
            match consistency {
                ReadConsistency::Default => {}
                ReadConsistency::Transaction(token) => {
                    query.push_non_empty("transaction", token)
                }
                ReadConsistency::ReadTime(time) => query.push_non_empty("readTime", time),
            }
        }
        Operation::PatchDocument {
            document_path,
            update_mask,
            mask,
            precondition,
            ..
        } => {
            path.push_str("/documents");
            push_segment(&mut path, document_path);
            update_mask.append_query("updateMask", &mut query);
            mask.append_query("mask", &mut query);
            precondition.append_query(&mut query);
        }
        Operation::DeleteDocument {
            document_path,
            mask,
            precondition,
        } => {
            path.push_str("/documents");
            push_segment(&mut path, document_path);
            mask.append_query("mask", &mut query);
            precondition.append_query(&mut query);
        }
        Operation::RunQuery { document_path, .. } => {
            path.push_str("/documents");
            push_segment(&mut path, document_path);
            path.push_str(":runQuery");
        }
        Operation::ListDocuments {
            collection_id,
            page_size,
            page_token,
            order_by,
            mask,
            show_missing,
        } => {
            path.push_str("/documents");
            push_segment(&mut path, collection_id);
            query.push_page_size(*page_size);
            query.push_non_empty("pageToken", page_token);
            query.push_non_empty("orderBy", order_by);
            query.push("showMissing", show_missing.to_string());
            mask.append_query("mask", &mut query);
        }
        Operation::ListCollectionIds { document_path, .. } => {
            path.push_str("/documents");
            push_segment(&mut path, document_path);
            path.push_str(":listCollectionIds");
        }
        Operation::CreateIndex { collection_id, .. } => {
            path.push_str("/collectionGroups");
            push_segment(&mut path, collection_id);
            path.push_str("/indexes");
        }
        Operation::ListIndexes {
            collection_id,
            filter,
            page_size,
            page_token,
        } => {
            path.push_str("/collectionGroups");
            push_segment(&mut path, collection_id);
            path.push_str("/indexes");
            query.push_page_size(*page_size);
            query.push_non_empty("pageToken", page_token);
            query.push_non_empty("filter", filter);
        }
        Operation::GetIndex {
            collection_id,
            index_id,
        }
        | Operation::DeleteIndex {
            collection_id,
            index_id,
        } => {
            path.push_str("/collectionGroups");
            push_segment(&mut path, collection_id);
            path.push_str("/indexes");
            push_segment(&mut path, index_id);
        }
    }

    RequestTarget { path, query }
}
