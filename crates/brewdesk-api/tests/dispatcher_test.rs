#![allow(clippy::unwrap_used)]
// Integration tests for `Dispatcher` and the refresh flow using wiremock.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brewdesk_api::{
    AuthEndpoints, Dispatcher, Error, Notice, RequestDescriptor, SessionState, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(session: SessionState) -> (MockServer, Dispatcher) {
    let server = MockServer::start().await;
    let dispatcher = dispatcher_for(&server, session, Duration::from_secs(5));
    (server, dispatcher)
}

fn dispatcher_for(server: &MockServer, session: SessionState, timeout: Duration) -> Dispatcher {
    let base_url = Url::parse(&server.uri()).unwrap();
    let transport = TransportConfig {
        timeout,
        ..TransportConfig::default()
    };
    Dispatcher::new(
        base_url,
        &transport,
        AuthEndpoints::default(),
        Arc::new(session),
    )
    .unwrap()
}

fn logged_in(token: &str) -> SessionState {
    SessionState::restore(SecretString::from(token.to_owned()))
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// ── Credential attachment ───────────────────────────────────────────

#[tokio::test]
async fn test_attaches_bearer_credential() {
    let (server, dispatcher) = setup(logged_in("tok-1")).await;

    Mock::given(method("GET"))
        .and(path("/admin/user/get-users"))
        .and(query_param("page", "1"))
        .and(header("authorization", bearer("tok-1").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [], "total": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    let body = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/user/get-users").query("page", 1))
        .await
        .unwrap();

    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_public_request_sends_no_credential() {
    let (server, dispatcher) = setup(logged_in("tok-1")).await;

    Mock::given(method("GET"))
        .and(path("/public/plans"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "basic" }])))
        .expect(1)
        .mount(&server)
        .await;

    let body = dispatcher
        .dispatch(&RequestDescriptor::get("/public/plans").public())
        .await
        .unwrap();
    assert_eq!(body[0]["id"], "basic");
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let (server, dispatcher) = setup(logged_in("tok-1")).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/audit-logs/7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = dispatcher
        .dispatch(&RequestDescriptor::delete("/admin/audit-logs/7"))
        .await
        .unwrap();
    assert!(body.is_null());
}

// ── Classification ──────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_raises_notice() {
    let (server, dispatcher) = setup(logged_in("tok-1")).await;
    let mut notices = dispatcher.notices();

    Mock::given(method("GET"))
        .and(path("/admin/user/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "User not found" })))
        .mount(&server)
        .await;

    let result = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/user/99"))
        .await;

    match result {
        Err(Error::NotFound { status, ref message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "User not found");
        }
        other => panic!("expected NotFound, got: {other:?}"),
    }

    assert_eq!(
        notices.try_recv().unwrap(),
        Notice::NotFound {
            path: "/admin/user/99".into(),
            message: "User not found".into(),
        }
    );
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let (server, dispatcher) = setup(logged_in("tok-1")).await;

    Mock::given(method("POST"))
        .and(path("/admin/plans"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let result = dispatcher
        .dispatch(&RequestDescriptor::post("/admin/plans").json(json!({ "name": "Pro" })))
        .await;

    match result {
        Err(Error::RequestFailed {
            status: Some(500),
            ref message,
        }) => assert_eq!(message, "database unavailable"),
        other => panic!("expected RequestFailed(500), got: {other:?}"),
    }
    assert!(dispatcher.session().is_authenticated());
}

#[tokio::test]
async fn test_timeout_is_request_failed() {
    let server = MockServer::start().await;
    let dispatcher = dispatcher_for(&server, logged_in("tok-1"), Duration::from_millis(100));

    Mock::given(method("GET"))
        .and(path("/admin/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/dashboard/stats"))
        .await;

    assert!(
        matches!(result, Err(Error::RequestFailed { status: None, .. })),
        "expected RequestFailed without status, got: {result:?}"
    );
}

// ── Refresh & retry ─────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_credential_is_refreshed_and_retried_once() {
    let (server, dispatcher) = setup(logged_in("stale")).await;

    Mock::given(method("GET"))
        .and(path("/admin/notes"))
        .and(header("authorization", bearer("stale").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/notes"))
        .and(header("authorization", bearer("fresh").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let body = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/notes"))
        .await
        .unwrap();
    assert_eq!(body[0]["id"], 1);

    let session = dispatcher.session().snapshot();
    assert_eq!(session.credential().unwrap().expose_secret(), "fresh");
    assert_eq!(session.epoch(), 1);
}

#[tokio::test]
async fn test_refresh_failure_clears_session() {
    let (server, dispatcher) = setup(logged_in("stale")).await;
    let mut changes = dispatcher.session().subscribe();

    Mock::given(method("GET"))
        .and(path("/admin/bans"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "refresh token revoked" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/bans"))
        .await;

    match result {
        Err(Error::SessionExpired { ref message }) => {
            assert!(message.contains("refresh token revoked"), "got: {message}");
        }
        other => panic!("expected SessionExpired, got: {other:?}"),
    }

    assert!(!dispatcher.session().is_authenticated());
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().credential().is_none());
}

#[tokio::test]
async fn test_logged_out_dispatch_makes_no_network_call() {
    let (server, dispatcher) = setup(SessionState::new()).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/user/get-users"))
        .await;

    assert!(
        matches!(result, Err(Error::SessionExpired { .. })),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_second_unauthorized_is_not_retried_again() {
    let (server, dispatcher) = setup(logged_in("stale")).await;

    Mock::given(method("GET"))
        .and(path("/admin/admins"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "role revoked" })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = dispatcher
        .dispatch(&RequestDescriptor::get("/admin/admins"))
        .await;

    match result {
        Err(Error::SessionExpired { ref message }) => {
            assert!(message.contains("role revoked"), "got: {message}");
        }
        other => panic!("expected SessionExpired, got: {other:?}"),
    }
    // Bounded retry leaves the refreshed session in place.
    assert_eq!(dispatcher.session().snapshot().epoch(), 1);
}

#[tokio::test]
async fn test_concurrent_expiry_refreshes_once() {
    let (server, dispatcher) = setup(logged_in("stale")).await;
    let callers = 5;

    Mock::given(method("GET"))
        .and(header("authorization", bearer("stale").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "fresh" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("authorization", bearer("fresh").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(5)
        .mount(&server)
        .await;

    let requests: Vec<_> = (0..callers)
        .map(|i| RequestDescriptor::get(format!("/admin/cafes/{i}")))
        .collect();
    let results = join_all(requests.iter().map(|r| dispatcher.dispatch(r))).await;

    for result in results {
        assert_eq!(result.unwrap()["ok"], true);
    }
    // One refresh, one commit.
    assert_eq!(dispatcher.session().snapshot().epoch(), 1);
    assert!(!dispatcher.refresh_coordinator().is_refreshing().await);
}

#[tokio::test]
async fn test_logout_during_refresh_is_not_undone() {
    let (server, dispatcher) = setup(logged_in("stale")).await;

    Mock::given(method("GET"))
        .and(path("/admin/plans"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "fresh" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let request = RequestDescriptor::get("/admin/plans");
    let (result, ()) = tokio::join!(dispatcher.dispatch(&request), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        dispatcher.logout().await;
    });

    assert!(
        matches!(result, Err(Error::SessionExpired { .. })),
        "expected SessionExpired, got: {result:?}"
    );
    assert!(!dispatcher.session().is_authenticated());
    assert!(!dispatcher.refresh_coordinator().is_refreshing().await);
}

#[tokio::test]
async fn test_login_during_refresh_keeps_new_credential() {
    let (server, dispatcher) = setup(logged_in("stale")).await;

    Mock::given(method("GET"))
        .and(path("/admin/plans"))
        .and(header("authorization", bearer("stale").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "from-refresh" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "from-login" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/plans"))
        .and(header("authorization", bearer("from-login").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let request = RequestDescriptor::get("/admin/plans");
    let password = SecretString::from("hunter2".to_owned());
    let (result, login) = tokio::join!(dispatcher.dispatch(&request), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        dispatcher.login("owner@brewdesk.app", &password).await
    });

    login.unwrap();
    assert_eq!(result.unwrap(), json!([]));
    let session = dispatcher.session().snapshot();
    assert_eq!(session.credential().unwrap().expose_secret(), "from-login");
}

// ── Login / logout ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, dispatcher) = setup(SessionState::new()).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "owner@brewdesk.app", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh=abc; Path=/auth; HttpOnly")
                .set_body_json(json!({ "accessToken": "tok-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let password = SecretString::from("hunter2".to_owned());
    let session = dispatcher
        .login("owner@brewdesk.app", &password)
        .await
        .unwrap();

    assert_eq!(session.credential().unwrap().expose_secret(), "tok-1");
    assert!(dispatcher.session().is_authenticated());
}

#[tokio::test]
async fn test_refresh_presents_login_cookie() {
    let (server, dispatcher) = setup(SessionState::new()).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh=abc; Path=/; HttpOnly")
                .set_body_json(json!({ "accessToken": "tok-1" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "refresh=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "tok-2" })))
        .expect(1)
        .mount(&server)
        .await;

    let password = SecretString::from("hunter2".to_owned());
    dispatcher.login("owner@brewdesk.app", &password).await.unwrap();
    dispatcher.refresh_session().await.unwrap();

    let session = dispatcher.session().snapshot();
    assert_eq!(session.credential().unwrap().expose_secret(), "tok-2");
    assert_eq!(session.epoch(), 2);
}

#[tokio::test]
async fn test_login_failure() {
    let (server, dispatcher) = setup(SessionState::new()).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })))
        .mount(&server)
        .await;

    let password = SecretString::from("wrong".to_owned());
    let result = dispatcher.login("owner@brewdesk.app", &password).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!dispatcher.session().is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session_even_if_server_fails() {
    let (server, dispatcher) = setup(logged_in("tok-1")).await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", bearer("tok-1").as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    dispatcher.logout().await;

    assert!(!dispatcher.session().is_authenticated());
}
