use serde_json::{Map, Value};

use crate::locator::ResourceLocator;
use crate::operation::{Index, Operation, StorageTransfer};
use crate::write::Write;

/// Build the JSON body for `operation`, or `None` for body-less calls.
pub fn build_body(locator: &ResourceLocator, operation: &Operation) -> Option<String> {
    let mut body = Map::new();
    match operation {
        Operation::ExportDocuments(transfer) => {
            storage_body(&mut body, "outputUriPrefix", transfer);
        }
        Operation::ImportDocuments(transfer) => {
            storage_body(&mut body, "inputUriPrefix", transfer);
        }
        Operation::BeginTransaction { options } => {
            if let Some(options) = options {
                body.insert("options".into(), options.to_json());
            }
        }
        Operation::Rollback { transaction } => {
            body.insert("transaction".into(), Value::String(transaction.clone()));
        }
        Operation::BatchGet {
            documents,
            mask,
            consistency,
        } => {
            let names = documents
                .iter()
                .map(|path| Value::String(locator.document_name(path)))
                .collect();
            body.insert("documents".into(), Value::Array(names));
            if !mask.is_empty() {
                body.insert("mask".into(), mask.to_json());
            }
            consistency.write_json(&mut body);
        }
        Operation::BatchWrite { writes, labels } => {
            body.insert("writes".into(), writes_json(locator, writes));
            if !labels.is_empty() {
                body.insert("labels".into(), Value::Object(labels.clone()));
            }
        }
        Operation::Commit {
            writes,
            transaction,
        } => {
            body.insert("writes".into(), writes_json(locator, writes));
            if let Some(transaction) = transaction.as_deref().filter(|t| !t.is_empty()) {
                body.insert("transaction".into(), Value::String(transaction.to_string()));
            }
        }
        Operation::CreateDocument { document, .. } | Operation::PatchDocument { document, .. } => {
            return Some(document.clone());
        }
        Operation::RunQuery {
            structured_query,
            consistency,
            ..
        } => {
            body.insert("structuredQuery".into(), structured_query.clone());
            consistency.write_json(&mut body);
        }
        Operation::ListCollectionIds {
            page_size,
            page_token,
            ..
        } => {
            if *page_size >= 0 {
                body.insert("pageSize".into(), Value::from(*page_size));
            }
            if !page_token.is_empty() {
                body.insert("pageToken".into(), Value::String(page_token.clone()));
            }
        }
        Operation::CreateIndex { index, .. } => index_body(&mut body, index),
        Operation::GetDocument { .. }
        | Operation::DeleteDocument { .. }
        | Operation::ListDocuments { .. }
        | Operation::DeleteIndex { .. }
        | Operation::GetIndex { .. }
        | Operation::ListIndexes { .. } => return None,
    }
    Some(Value::Object(body).to_string())
}

fn storage_body(body: &mut Map<String, Value>, key: &str, transfer: &StorageTransfer) {
    body.insert(key.into(), Value::String(transfer.uri_prefix()));
    if !transfer.collection_ids.is_empty() {
        body.insert(
            "collectionIds".into(),
            Value::Array(
                transfer
                    .collection_ids
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
    }
}

fn writes_json(locator: &ResourceLocator, writes: &[Write]) -> Value {
    Value::Array(writes.iter().map(|w| w.to_json(locator)).collect())
}

fn index_body(body: &mut Map<String, Value>, index: &Index) {
    if !index.api_scope.is_empty() {
        body.insert("apiScope".into(), Value::String(index.api_scope.clone()));
    }
    if !index.query_scope.is_empty() {
        body.insert("queryScope".into(), Value::String(index.query_scope.clone()));
    }
    body.insert(
        "fields".into(),
        Value::Array(index.fields.iter().map(|f| f.to_json()).collect()),
    );
}
