use super::*;
use crate::net::test_helpers::{StubTransport, TEST_BASE, harness};
use crate::session::{Navigator, PageKind, SessionController, SessionState};
use crate::store::{MemoryStorage, User};
use std::sync::Mutex;
use serde_json::json;

fn response(status: u16, body: &str) -> TransportResponse {
    TransportResponse { status, body: body.to_owned() }
}

// =============================================================================
// classify_response
// =============================================================================

#[test]
fn classify_success_returns_json() {
    let value = classify_response("/x", &response(200, r#"{"token":"t1"}"#)).unwrap();
    assert_eq!(value, json!({"token": "t1"}));
}

#[test]
fn classify_success_wraps_non_json() {
    let value = classify_response("/x", &response(201, "created")).unwrap();
    assert_eq!(value, json!({"message": "created"}));
    let value = classify_response("/x", &response(204, "")).unwrap();
    assert_eq!(value, json!({"message": ""}));
}

#[test]
fn classify_401_is_expired() {
    let err = classify_response("/auth/me", &response(401, r#"{"message":"jwt expired"}"#)).unwrap_err();
    assert_eq!(err, ApiError::AuthenticationExpired);
}

#[test]
fn classify_404_carries_path() {
    let err = classify_response("/auth/missing", &response(404, "<html>")).unwrap_err();
    assert_eq!(err, ApiError::EndpointNotFound { path: "/auth/missing".into() });
}

#[test]
fn classify_other_status_uses_server_message() {
    let err = classify_response("/x", &response(409, r#"{"message":"Phone already registered"}"#)).unwrap_err();
    assert_eq!(err, ApiError::RequestFailed { status: 409, message: "Phone already registered".into() });
}

#[test]
fn classify_other_status_falls_back_to_generic_message() {
    for body in ["<html>oops</html>", r#"{"error":"x"}"#, r#"{"message":""}"#, r#"{"message":42}"#] {
        let err = classify_response("/x", &response(500, body)).unwrap_err();
        assert_eq!(err, ApiError::RequestFailed { status: 500, message: GENERIC_FAILURE_MESSAGE.into() });
    }
}

// =============================================================================
// dispatch
// =============================================================================

#[tokio::test]
async fn sends_json_content_type_and_body() {
    let h = harness(PageKind::Login);
    h.transport.respond_json("/auth/login", 200, json!({"ok": true}));

    let body = json!({"phone": "0244123456", "password": "Abcd1234"});
    let value = h
        .dispatcher
        .send(HttpMethod::Post, "/auth/login", Some(body.clone()), false)
        .await
        .unwrap();
    assert_eq!(value, json!({"ok": true}));

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, format!("{TEST_BASE}/auth/login"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Authorization"), None);
    let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
    assert_eq!(sent, body);
}

#[tokio::test]
async fn get_never_sends_a_body() {
    let h = harness(PageKind::Protected);
    h.transport.respond_json("/auth/me", 200, json!({}));
    h.dispatcher
        .send(HttpMethod::Get, "/auth/me", Some(json!({"ignored": true})), false)
        .await
        .unwrap();
    assert_eq!(h.transport.requests()[0].body, None);
    assert_eq!(h.transport.requests()[0].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn attaches_bearer_token_when_required() {
    let h = harness(PageKind::Protected);
    h.store.save(Some("t1"), None);
    h.transport.respond_json("/auth/me", 200, json!({"user": {}}));

    h.dispatcher.dispatch(PendingRequest::get("/auth/me").authenticated()).await.unwrap();
    assert_eq!(h.transport.requests()[0].header("Authorization"), Some("Bearer t1"));
}

#[tokio::test]
async fn does_not_attach_token_when_not_required() {
    let h = harness(PageKind::Protected);
    h.store.save(Some("t1"), None);
    h.transport.respond_json("/public", 200, json!({}));

    h.dispatcher.send(HttpMethod::Get, "/public", None, false).await.unwrap();
    assert_eq!(h.transport.requests()[0].header("Authorization"), None);
}

#[tokio::test]
async fn missing_token_still_sends_authenticated_call() {
    let h = harness(PageKind::Protected);
    h.transport.respond_json("/auth/me", 200, json!({"user": {"id": 3}}));

    let value = h.dispatcher.send(HttpMethod::Get, "/auth/me", None, true).await.unwrap();
    assert_eq!(value["user"]["id"], 3);
    assert_eq!(h.transport.call_count(), 1);
    assert_eq!(h.transport.requests()[0].header("Authorization"), None);
}

#[tokio::test]
async fn unauthorized_clears_store_and_redirects_once() {
    let h = harness(PageKind::Protected);
    h.store.save(Some("t1"), Some(&User::default()));
    h.session.check(&h.store);
    h.transport.respond("/auth/me", 401, r#"{"message":"Unauthorized"}"#);
    h.transport.respond("/wallet", 401, "");

    let err = h.dispatcher.send(HttpMethod::Get, "/auth/me", None, true).await.unwrap_err();
    assert_eq!(err, ApiError::AuthenticationExpired);
    assert_eq!(h.store.load_token(), None);
    assert_eq!(h.store.load_user(), None);
    assert_eq!(h.session.state(), SessionState::Anonymous);

    let err = h.dispatcher.send(HttpMethod::Get, "/wallet", None, true).await.unwrap_err();
    assert_eq!(err, ApiError::AuthenticationExpired);
    assert_eq!(h.navigator.redirects(), vec!["login.html".to_owned()]);
}

/// Notes whether the store still held a credential when asked to navigate.
struct StoreWitness {
    store: CredentialStore,
    seen: Mutex<Vec<bool>>,
}

impl Navigator for StoreWitness {
    fn redirect(&self, _target: &str) {
        self.seen.lock().unwrap().push(self.store.is_authenticated());
    }
}

#[tokio::test]
async fn unauthorized_clears_store_before_redirecting() {
    let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
    store.save(Some("t1"), Some(&User::default()));
    let witness = Arc::new(StoreWitness { store: store.clone(), seen: Mutex::new(Vec::new()) });
    let session = SessionController::new(PageKind::Protected, witness.clone());
    let transport = Arc::new(StubTransport::new());
    transport.respond("/auth/me", 401, "");
    let dispatcher = Dispatcher::new(TEST_BASE, transport, store, session);

    let _ = dispatcher.send(HttpMethod::Get, "/auth/me", None, true).await;

    assert_eq!(*witness.seen.lock().unwrap(), vec![false]);
}

#[tokio::test]
async fn unauthorized_after_credential_change_is_ignored() {
    let h = harness(PageKind::Protected);
    h.store.save(Some("old"), None);
    let release = h.transport.defer("/wallet");

    let pending = tokio::spawn({
        let dispatcher = h.dispatcher.clone();
        async move { dispatcher.send(HttpMethod::Get, "/wallet", None, true).await }
    });
    while h.transport.call_count() == 0 {
        tokio::task::yield_now().await;
    }
    h.store.save(Some("new"), None);
    release.send(Ok(response(401, ""))).unwrap();

    assert_eq!(pending.await.unwrap(), Err(ApiError::AuthenticationExpired));
    assert_eq!(h.store.load_token().as_deref(), Some("new"));
    assert_eq!(h.navigator.count(), 0);
}

#[tokio::test]
async fn unauthorized_on_login_page_clears_without_redirect() {
    let h = harness(PageKind::Login);
    h.store.save(Some("stale"), None);
    h.transport.respond("/auth/login", 401, r#"{"message":"Invalid credentials"}"#);

    let err = h
        .dispatcher
        .send(HttpMethod::Post, "/auth/login", Some(json!({})), false)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::AuthenticationExpired);
    assert_eq!(h.store.load_token(), None);
    assert_eq!(h.navigator.count(), 0);
}

#[tokio::test]
async fn not_found_and_failures_leave_store_alone() {
    let h = harness(PageKind::Protected);
    h.store.save(Some("t1"), None);
    h.transport.respond("/gone", 404, "");
    h.transport.respond("/boom", 500, r#"{"message":"Internal server error"}"#);
    h.transport.fail("/down", ApiError::Network("connection refused".into()));

    let err = h.dispatcher.send(HttpMethod::Get, "/gone", None, true).await.unwrap_err();
    assert_eq!(err, ApiError::EndpointNotFound { path: "/gone".into() });

    let err = h.dispatcher.send(HttpMethod::Get, "/boom", None, true).await.unwrap_err();
    assert_eq!(err, ApiError::RequestFailed { status: 500, message: "Internal server error".into() });

    let err = h.dispatcher.send(HttpMethod::Get, "/down", None, true).await.unwrap_err();
    assert_eq!(err, ApiError::Network("connection refused".into()));

    assert_eq!(h.store.load_token().as_deref(), Some("t1"));
    assert_eq!(h.navigator.count(), 0);
}

#[tokio::test]
async fn no_internal_retry() {
    let h = harness(PageKind::Protected);
    h.transport.respond("/flaky", 503, "");
    let _ = h.dispatcher.send(HttpMethod::Get, "/flaky", None, false).await;
    assert_eq!(h.transport.call_count(), 1);
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let h = harness(PageKind::Public);
    let dispatcher = Dispatcher::new(
        "http://backend.test/api/",
        h.transport.clone(),
        h.store.clone(),
        h.session.clone(),
    );
    let outbound = dispatcher.resolve(&PendingRequest::get("/auth/me"));
    assert_eq!(outbound.url, "http://backend.test/api/auth/me");
}
