//! Dispatch through the engine against a scripted executor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use firelink_firestore::{
    AppToken, AsyncClient, AsyncResult, ClientConfig, Consistency, DocumentMask, FirebaseError,
    Firestore, ListDocumentsOptions, Operation, OperationDescriptor, ParentResource, Precondition,
    SharedResult, Write,
};
use firelink_http::{HttpRequest, MockExecutor, Method};
use serde_json::json;

fn engine() -> Firestore {
    let mut engine = Firestore::new();
    engine.set_app(AppToken::new(7, "secret", "app-project"));
    engine
}

fn only_request(mock: &MockExecutor) -> HttpRequest {
    let mut sent = mock.recorded_requests();
    assert_eq!(sent.len(), 1, "expected exactly one request");
    sent.remove(0)
}

#[test]
fn create_document_request_shape() {
    let mock = MockExecutor::new().with_default_response(MockExecutor::success_response(
        json!({"name": "projects/p/databases/(default)/documents/c/d"}),
    ));
    let client = AsyncClient::new(mock.clone());
    let op = OperationDescriptor::new(
        ParentResource::new("p", ""),
        Operation::create_document("c", "d", DocumentMask::new("a"), &json!({"fields": {}})),
    );

    let result = engine().execute_blocking(&client, &op);
    assert!(result.is_ok(), "{:?}", result.error());

    let request = only_request(&mock);
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.full_url(),
        "https://firestore.googleapis.com/v1/projects/p/databases/(default)/documents/c?documentId=d&mask.fieldPaths=a"
    );
    assert_eq!(request.body.as_deref(), Some(r#"{"fields":{}}"#));
    assert_eq!(
        request.headers.get("Authorization").map(String::as_str),
        Some("Bearer secret")
    );
}

#[test]
fn list_documents_uses_app_project() {
    let mock = MockExecutor::new()
        .with_default_response(MockExecutor::success_response(json!({"documents": []})));
    let client = AsyncClient::new(mock.clone());
    let op = OperationDescriptor::new(
        ParentResource::app_default(),
        Operation::list_documents(
            "users",
            ListDocumentsOptions {
                page_size: 10,
                order_by: "name".to_string(),
                show_missing: true,
                ..Default::default()
            },
        ),
    );

    assert!(engine().execute(&client, &op));

    let request = only_request(&mock);
    assert_eq!(request.method, Method::GET);
    assert_eq!(
        request.url,
        "https://firestore.googleapis.com/v1/projects/app-project/databases/(default)/documents/users"
    );
    assert_eq!(
        request.query,
        vec![
            ("pageSize".to_string(), "10".to_string()),
            ("orderBy".to_string(), "name".to_string()),
            ("showMissing".to_string(), "true".to_string()),
        ]
    );
    assert_eq!(request.body, None);
}

#[test]
fn remote_error_is_delivered_with_status() {
    let mock = MockExecutor::new().with_default_response(MockExecutor::not_found());
    let client = AsyncClient::new(mock);
    let op = OperationDescriptor::new(
        ParentResource::new("p", "db"),
        Operation::delete_document("users/ghost", Precondition::Exists(true)),
    );

    let engine = engine();
    assert!(!engine.execute(&client, &op));

    let result = engine.execute_blocking(&client, &op);
    assert_eq!(result.http_status(), Some(404));
    match result.error() {
        Some(FirebaseError::Remote { status, body }) => {
            assert_eq!(*status, 404);
            assert!(body.contains("Not Found"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn transport_failure_is_delivered() {
    let client = AsyncClient::new(MockExecutor::new().fail_with("connection reset"));
    let op = OperationDescriptor::new(
        ParentResource::new("p", ""),
        Operation::rollback("dHg="),
    );

    let result = engine().execute_blocking(&client, &op);
    assert_eq!(
        result.error(),
        Some(&FirebaseError::Transport {
            code: -2,
            message: "connection reset".to_string()
        })
    );
}

#[test]
fn callback_sink_runs_once_with_uid() {
    let mock = MockExecutor::new()
        .with_pending_polls(3)
        .with_default_response(MockExecutor::success_response(json!({"transaction": "dHg="})));
    let client = AsyncClient::new(mock);
    let engine = engine();
    let seen: Rc<RefCell<Vec<AsyncResult>>> = Rc::default();

    let sink_seen = Rc::clone(&seen);
    let slot = engine.execute_with_callback(
        &client,
        &OperationDescriptor::new(
            ParentResource::new("p", ""),
            Operation::begin_transaction(None),
        ),
        "begin-1",
        move |result| sink_seen.borrow_mut().push(result.clone()),
    );
    let slot = slot.expect("slot allocated");
    assert!(client.is_pending(slot));

    for _ in 0..10 {
        engine.run_loop();
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uid(), "begin-1");
    assert_eq!(seen[0].json().unwrap()["transaction"], "dHg=");
    assert!(!client.is_pending(slot));
}

#[test]
fn external_result_is_filled_in_place() {
    let mock = MockExecutor::new().with_pending_polls(1).with_default_response(
        MockExecutor::success_response(json!({"writeResults": [{}]})),
    );
    let client = AsyncClient::new(mock.clone());
    let engine = engine();
    let shared: SharedResult = Rc::default();

    let op = OperationDescriptor::new(
        ParentResource::new("p", ""),
        Operation::commit(vec![Write::delete("users/a")], Some("tx".to_string())),
    );
    engine.execute_with_result(&client, &op, &shared);
    assert!(!shared.borrow().available());

    while !shared.borrow().available() {
        engine.run_loop();
    }
    assert!(shared.borrow().is_ok());

    let request = only_request(&mock);
    assert!(request
        .url
        .ends_with("/v1/projects/p/databases/(default)/documents:commit"));
    let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["transaction"], "tx");
}

#[test]
fn full_client_delivers_operation_cancelled() {
    let client = AsyncClient::with_config(
        MockExecutor::new().with_pending_polls(100),
        ClientConfig { max_slots: 1 },
    );
    let engine = engine();
    let op = OperationDescriptor::new(
        ParentResource::new("p", ""),
        Operation::run_query("", json!({"from": [{"collectionId": "c"}]}), Consistency::Default),
    );

    let first: SharedResult = Rc::default();
    assert!(engine.execute_with_result(&client, &op, &first).is_some());

    let calls = Rc::new(Cell::new(0));
    let codes = Rc::new(Cell::new(0));
    let (c, k) = (Rc::clone(&calls), Rc::clone(&codes));
    let rejected = engine.execute_with_callback(&client, &op, "second", move |result| {
        c.set(c.get() + 1);
        k.set(result.error().map_or(0, FirebaseError::code));
    });

    assert_eq!(rejected, None);
    assert_eq!(calls.get(), 1);
    assert_eq!(codes.get(), -113);
    assert_eq!(client.slot_count(), 1);
    assert!(!first.borrow().available());
}

#[test]
fn stopped_client_rejects_and_cancels() {
    let client = AsyncClient::new(MockExecutor::new().with_pending_polls(100));
    let engine = engine();
    let op = OperationDescriptor::new(ParentResource::new("p", ""), Operation::get_index("c", "i"));

    let pending: SharedResult = Rc::default();
    engine.execute_with_result(&client, &op, &pending);
    client.stop();
    assert_eq!(
        pending.borrow().error(),
        Some(&FirebaseError::OperationCancelled)
    );

    let result = engine.execute_blocking(&client, &op);
    assert_eq!(result.error().map(FirebaseError::code), Some(-113));
}

#[test]
fn slots_on_several_clients_progress_together() {
    let engine = engine();
    let slow = MockExecutor::new()
        .with_pending_polls(5)
        .with_default_response(MockExecutor::success_response(json!({"slow": true})));
    let fast = MockExecutor::new()
        .with_default_response(MockExecutor::success_response(json!({"fast": true})));
    let slow_client = AsyncClient::new(slow);
    let fast_client = AsyncClient::new(fast);

    let op = OperationDescriptor::new(ParentResource::new("p", ""), Operation::get_index("c", "i"));
    let background: SharedResult = Rc::default();
    engine.execute_with_result(&slow_client, &op, &background);

    let result = engine.execute_blocking(&fast_client, &op);
    assert!(result.is_ok());
    assert_eq!(engine.client_count(), 2);

    while !background.borrow().available() {
        engine.run_loop();
    }
    assert_eq!(background.borrow().json().unwrap()["slow"], true);
}
