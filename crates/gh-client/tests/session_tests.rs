//! Session lifecycle integration tests
//!
//! Exercises hydration, the login/register/logout transactions, staleness
//! discarding and re-verification against a stubbed platform API.

use std::sync::Arc;
use std::time::Duration;

use gh_client::{
    ApiGateway, CredentialStore, MemoryCredentialStore, Registration, SessionController,
    SessionPhase,
};
use gh_common::{Role, User};
use gh_config::ApiConfig;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_api_config(server: &MockServer, retry_attempts: u32) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        retry_attempts,
        retry_delay_ms: 1,
        user_agent: "gh-client-tests".to_string(),
    }
}

fn controller_with(
    server: &MockServer,
    store: Arc<MemoryCredentialStore>,
) -> Arc<SessionController> {
    let gateway = ApiGateway::new(&test_api_config(server, 1), store.clone()).unwrap();
    Arc::new(SessionController::new(gateway, store))
}

fn stored_user() -> User {
    User::new("42", "Jane Donor", "jane@example.com", Role::Donor)
}

fn user_json(name: &str) -> serde_json::Value {
    json!({"id": 42, "name": name, "email": "jane@example.com", "role": "donor"})
}

// ----------------------------------------------------------------------
// Hydration
// ----------------------------------------------------------------------

#[tokio::test]
async fn hydration_with_empty_store_is_anonymous() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store);

    controller.hydrate().await;

    let state = controller.current();
    assert_eq!(state.phase, SessionPhase::Anonymous);
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn hydration_publishes_stored_identity_before_fetch_resolves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "user": user_json("Jane Fresh")}))
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.save("tok-1", &stored_user());
    let controller = controller_with(&server, store);

    let mut rx = controller.subscribe();
    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.hydrate().await })
    };

    // Optimistic state: last-known identity, usable UI, fetch still pending.
    let state = rx
        .wait_for(|s| s.phase == SessionPhase::Hydrating)
        .await
        .unwrap()
        .clone();
    assert!(state.is_authenticated);
    assert_eq!(state.user.as_ref().unwrap().name, "Jane Donor");
    assert!(state.loading);

    task.await.unwrap();

    let state = controller.current();
    assert_eq!(state.phase, SessionPhase::Authenticated);
    assert_eq!(state.user.unwrap().name, "Jane Fresh");
    assert!(!state.loading);
}

#[tokio::test]
async fn hydration_refresh_replaces_user_and_resaves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"success": true, "user": user_json("Jane Renamed")}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.save("tok-1", &stored_user());
    let controller = controller_with(&server, store.clone());

    controller.hydrate().await;
    // Second call is a no-op; the profile mock expects exactly one request.
    controller.hydrate().await;

    let saved = store.load().unwrap();
    assert_eq!(saved.token, "tok-1");
    assert_eq!(saved.user.name, "Jane Renamed");
}

#[tokio::test]
async fn failed_profile_fetch_keeps_stored_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.save("tok-1", &stored_user());
    let controller = controller_with(&server, store.clone());

    controller.hydrate().await;

    let state = controller.current();
    assert!(state.is_authenticated);
    assert_eq!(state.user.unwrap(), stored_user());
    assert!(!state.loading);
    assert_eq!(store.load().unwrap().token, "tok-1");
}

#[tokio::test]
async fn unauthorized_profile_fetch_does_not_clear_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "error": "Token has expired"})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.save("tok-stale", &stored_user());
    let controller = controller_with(&server, store.clone());

    controller.hydrate().await;

    // The gateway surfaced the 401 as a failed result; only an explicit
    // logout may end the session.
    assert!(controller.current().is_authenticated);
    assert!(store.load().is_some());
}

// ----------------------------------------------------------------------
// Login / register
// ----------------------------------------------------------------------

#[tokio::test]
async fn login_success_persists_pair_and_publishes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-login",
            "user": user_json("Jane Donor"),
            "message": "Login successful"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());

    let user = controller.login("jane@example.com", "pw").await.unwrap();
    assert_eq!(user.name, "Jane Donor");

    let state = controller.current();
    assert!(state.is_authenticated);
    assert!(!state.loading);

    let saved = store.load().unwrap();
    assert_eq!(saved.token, "tok-login");
    assert_eq!(saved.role, Role::Donor);
}

#[tokio::test]
async fn login_failure_returns_message_and_stays_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());

    let err = controller.login("jane@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");

    let state = controller.current();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(!state.loading);
    assert!(store.load().is_none());
}

#[tokio::test]
async fn registration_is_an_implicit_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "token": "tok-new",
            "user": {"id": 7, "name": "Clean Water", "email": "cw@org.com", "role": "charity"},
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());

    let registration = Registration::charity("Clean Water", "cw@org.com", "pw");
    let user = controller.register(&registration).await.unwrap();
    assert_eq!(user.role, Role::Charity);

    assert!(controller.current().is_authenticated);
    assert_eq!(store.load().unwrap().token, "tok-new");
}

// ----------------------------------------------------------------------
// Logout and races
// ----------------------------------------------------------------------

#[tokio::test]
async fn logout_clears_store_and_state() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    store.save("tok-1", &stored_user());
    let controller = controller_with(&server, store.clone());

    controller.logout();

    let state = controller.current();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(store.load().is_none());
}

#[tokio::test]
async fn logout_during_login_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "success": true,
                    "token": "tok-late",
                    "user": user_json("Jane Donor"),
                }))
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());

    let mut rx = controller.subscribe();
    let task = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.login("jane@example.com", "pw").await })
    };
    rx.wait_for(|s| s.phase == SessionPhase::Authenticating)
        .await
        .unwrap();

    controller.logout();
    let _ = task.await.unwrap();

    // The login settled after the logout; its completion is stale and the
    // store must stay empty.
    assert!(store.load().is_none());
    let state = controller.current();
    assert!(!state.is_authenticated);
    assert!(!state.loading);
}

#[tokio::test]
async fn update_user_repersists_with_existing_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-1",
            "user": user_json("Jane Donor"),
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());
    controller.login("jane@example.com", "pw").await.unwrap();

    let mut edited = stored_user();
    edited.name = "Jane Edited".to_string();
    controller.update_user(edited);

    let saved = store.load().unwrap();
    assert_eq!(saved.token, "tok-1");
    assert_eq!(saved.user.name, "Jane Edited");
    assert_eq!(controller.current().user.unwrap().name, "Jane Edited");
}

#[tokio::test]
async fn update_user_is_ignored_while_anonymous() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());
    controller.hydrate().await;

    controller.update_user(stored_user());

    // A user record must never exist without a token.
    assert!(store.load().is_none());
    assert!(controller.current().user.is_none());
}

// ----------------------------------------------------------------------
// Re-verification
// ----------------------------------------------------------------------

#[tokio::test]
async fn reverify_within_interval_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-1",
            "user": user_json("Jane Donor"),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"success": true, "user": user_json("Jane Fresh")}),
        ))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store);
    controller.login("jane@example.com", "pw").await.unwrap();

    let issued = controller.reverify(Duration::from_secs(300)).await;
    assert!(!issued);
}

#[tokio::test]
async fn reverify_past_interval_refreshes_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-1",
            "user": user_json("Jane Donor"),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"success": true, "user": user_json("Jane Fresh")}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());
    controller.login("jane@example.com", "pw").await.unwrap();

    let issued = controller.reverify(Duration::ZERO).await;
    assert!(issued);
    assert_eq!(controller.current().user.unwrap().name, "Jane Fresh");
    assert_eq!(store.load().unwrap().user.name, "Jane Fresh");
}

#[tokio::test]
async fn reverify_failure_changes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-1",
            "user": user_json("Jane Donor"),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let controller = controller_with(&server, store.clone());
    controller.login("jane@example.com", "pw").await.unwrap();

    controller.reverify(Duration::ZERO).await;

    assert!(controller.current().is_authenticated);
    assert_eq!(controller.current().user.unwrap().name, "Jane Donor");
    assert_eq!(store.load().unwrap().token, "tok-1");
}

// ----------------------------------------------------------------------
// Gateway behavior
// ----------------------------------------------------------------------

#[tokio::test]
async fn gateway_reads_token_at_call_time() {
    let server = MockServer::start().await;
    // Only matches when the stored token is attached.
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .and(header("authorization", "Bearer tok-live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"success": true, "user": user_json("Jane Donor")}),
        ))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.save("tok-live", &stored_user());
    let gateway = ApiGateway::new(&test_api_config(&server, 1), store.clone()).unwrap();

    assert!(gateway.get_profile().await.is_ok());

    // After a clear, the very next call goes out unauthenticated and no
    // longer matches the token-bound stub.
    store.clear();
    assert!(gateway.get_profile().await.is_err());
}

#[tokio::test]
async fn retryable_failures_are_retried_then_surface() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/charities/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let gateway = ApiGateway::new(&test_api_config(&server, 3), store).unwrap();

    assert!(gateway.list_charities().await.is_err());
}

#[tokio::test]
async fn validation_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/donations/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid amount"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let gateway = ApiGateway::new(&test_api_config(&server, 3), store).unwrap();

    let donation = gh_client::NewDonation {
        charity_id: 1,
        amount: -5.0,
        recurring: false,
        is_anonymous: false,
        payment_method: "mpesa".to_string(),
        transaction_id: "TX123".to_string(),
    };
    let err = gateway.make_donation(&donation).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid amount");
}

#[tokio::test]
async fn transient_error_recovers_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "stories": [
                {"id": 1, "charity_id": 3, "title": "Wells", "content": "Ten new wells."}
            ],
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let gateway = ApiGateway::new(&test_api_config(&server, 3), store).unwrap();

    let stories = gateway.list_stories().await.unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].title, "Wells");
}
