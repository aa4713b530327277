//! End-to-end API tests.
//!
//! Each test boots the full router on an ephemeral port with a throwaway
//! database and drives it through the typed client, so these exercise the
//! same wiring the binary runs.

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use storehub_backend::app::{build_router, AppState};
use storehub_backend::auth::TokenService;
use storehub_backend::client::{live::LiveList, ApiClient, ClientError};
use storehub_backend::models::{CreateUserPayload, ProductPayload, Role, UpdateUserPayload};
use storehub_backend::realtime::{ChangeNotifier, ResourceKind};
use storehub_backend::store::{ProductStore, UserStore};
use tempfile::NamedTempFile;
use tokio_tungstenite::{connect_async, tungstenite::Message};

struct TestServer {
    base_url: String,
    _db: NamedTempFile,
}

async fn spawn_server() -> TestServer {
    let db = NamedTempFile::new().unwrap();
    let db_path = db.path().to_str().unwrap();

    let state = AppState {
        users: Arc::new(UserStore::new(db_path, "admin123").unwrap()),
        products: Arc::new(ProductStore::new(db_path).unwrap()),
        tokens: Arc::new(TokenService::new(
            "integration-test-secret",
            Duration::from_secs(3600),
        )),
        notifier: ChangeNotifier::new(256),
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        _db: db,
    }
}

fn client_for(server: &TestServer) -> ApiClient {
    ApiClient::new(&server.base_url).unwrap()
}

async fn admin_client(server: &TestServer) -> ApiClient {
    let client = client_for(server);
    client.login("admin", "admin123").await.unwrap();
    client
}

fn sample_product() -> ProductPayload {
    ProductPayload {
        name: "X".to_string(),
        description: "d".to_string(),
        price: 9.99,
        category: "c".to_string(),
        stock: 5,
    }
}

fn sample_user(username: &str) -> CreateUserPayload {
    CreateUserPayload {
        username: username.to_string(),
        password: "pw123456".to_string(),
        role: None,
        address: "1 Main St".to_string(),
        phonenumber: "555-0100".to_string(),
        email: format!("{username}@example.com"),
    }
}

#[tokio::test]
async fn login_and_me_round_trip() {
    let server = spawn_server().await;
    let client = client_for(&server);

    let token = client.login("admin", "admin123").await.unwrap();
    assert!(!token.is_empty());

    let me = client.me().await.unwrap();
    assert_eq!(me.username, "admin");
    assert_eq!(me.role, Role::Admin);
}

#[tokio::test]
async fn login_failures_share_one_shape() {
    let server = spawn_server().await;
    let client = client_for(&server);

    let wrong_password = client.login("admin", "wrong").await.unwrap_err();
    let unknown_user = client.login("nobody", "whatever").await.unwrap_err();

    match (&wrong_password, &unknown_user) {
        (
            ClientError::Api { status: a, message: ma },
            ClientError::Api { status: b, message: mb },
        ) => {
            assert_eq!(*a, 401);
            assert_eq!(*b, 401);
            assert_eq!(ma, "Invalid credentials");
            assert_eq!(ma, mb);
        }
        other => panic!("expected API errors, got {other:?}"),
    }
}

#[tokio::test]
async fn login_requires_both_fields() {
    let server = spawn_server().await;
    let client = client_for(&server);

    let err = client.login("admin", "").await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let err = client.login("   ", "password").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn auth_gate_rejection_shapes() {
    let server = spawn_server().await;
    let raw = reqwest::Client::new();

    // Missing header entirely.
    let resp = raw
        .get(format!("{}/api/auth/me", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No token provided");
    assert_eq!(body["success"], false);

    // Header present but not Bearer-prefixed.
    let resp = raw
        .get(format!("{}/api/auth/me", server.base_url))
        .header("Authorization", "Token abc123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid token format");

    // Bearer-prefixed garbage.
    let resp = raw
        .get(format!("{}/api/auth/me", server.base_url))
        .header("Authorization", "Bearer not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn non_admin_is_denied_mutations() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    admin.create_user(&sample_user("plain")).await.unwrap();

    let user = client_for(&server);
    user.login("plain", "pw123456").await.unwrap();

    // A regular user can read products but not mutate them.
    user.products().await.unwrap();
    let err = user.create_product(&sample_product()).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    match err {
        ClientError::Api { message, .. } => assert_eq!(message, "Access denied"),
        other => panic!("expected API error, got {other:?}"),
    }

    // Users listing is admin-only outright.
    let err = user.users().await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn valid_token_for_deleted_account_is_not_enough() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    let id = admin.create_user(&sample_user("ghost")).await.unwrap();

    let ghost = client_for(&server);
    ghost.login("ghost", "pw123456").await.unwrap();
    assert_eq!(ghost.me().await.unwrap().username, "ghost");

    admin.delete_user(&id).await.unwrap();

    let err = ghost.me().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ClientError::Api { message, .. } => assert_eq!(message, "User not found"),
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn product_create_broadcasts_change_event() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    // A second client listening on the change channel before the mutation.
    let ws_url = client_for(&server).ws_url();
    let (mut stream, _) = connect_async(&ws_url).await.unwrap();
    // Let the server-side subscription register before mutating.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let id = admin.create_product(&sample_product()).await.unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("no change event within 5s")
        .unwrap()
        .unwrap();
    match frame {
        Message::Text(text) => {
            let event: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(event["event"], "server:products_updated");
        }
        other => panic!("expected text frame, got {other:?}"),
    }

    // And the listener's refetched list reflects the new product.
    let viewer = client_for(&server);
    let products = viewer.products().await.unwrap();
    assert!(products.iter().any(|p| p.id == id));
}

#[tokio::test]
async fn live_list_refreshes_on_change_event() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    let viewer = client_for(&server);
    let mut list: LiveList<storehub_backend::api::products::ProductListResponse> =
        LiveList::new(viewer, "/api/products");
    list.refetch().await;
    assert_eq!(list.state().data.unwrap().products.len(), 0);

    list.watch(ResourceKind::Products);
    // Give the subscription a moment to connect before mutating.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let id = admin.create_product(&sample_product()).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(data) = list.state().data {
            if data.products.iter().any(|p| p.id == id) {
                break;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "live list never picked up the new product"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    list.unwatch();
}

#[tokio::test]
async fn user_delete_then_get_is_404() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    // Deleting a nonexistent id.
    let err = admin.delete_user(&uuid::Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ClientError::Api { message, .. } => assert_eq!(message, "User not found"),
        other => panic!("expected API error, got {other:?}"),
    }

    // Deleting a real one, then fetching it.
    let id = admin.create_user(&sample_user("shortlived")).await.unwrap();
    admin.delete_user(&id).await.unwrap();
    let err = admin.user(&id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn identical_update_twice_is_idempotent() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    let id = admin.create_product(&sample_product()).await.unwrap();
    let patch = ProductPayload {
        price: 19.99,
        ..sample_product()
    };

    admin.update_product(&id, &patch).await.unwrap();
    admin.update_product(&id, &patch).await.unwrap();

    let product = admin.product(&id).await.unwrap();
    assert_eq!(product.price, 19.99);
    assert_eq!(admin.products().await.unwrap().len(), 1);
}

#[tokio::test]
async fn user_update_round_trip() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    let id = admin.create_user(&sample_user("mover")).await.unwrap();
    let patch = UpdateUserPayload {
        username: "mover".to_string(),
        address: "9 New Rd".to_string(),
        phonenumber: "555-0199".to_string(),
        email: "mover@example.com".to_string(),
    };
    admin.update_user(&id, &patch).await.unwrap();

    let user = admin.user(&id).await.unwrap();
    assert_eq!(user.address, "9 New Rd");
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    admin.create_user(&sample_user("taken")).await.unwrap();
    let err = admin.create_user(&sample_user("taken")).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn product_validation_rejects_bad_payloads() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    let err = admin
        .create_product(&ProductPayload {
            price: -1.0,
            ..sample_product()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let err = admin
        .create_product(&ProductPayload {
            name: String::new(),
            ..sample_product()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn session_restore_validates_persisted_token() {
    let server = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");

    // First run: log in, which persists the token.
    let client = client_for(&server);
    let mut session = storehub_backend::client::session::Session::new(&token_path);
    session.login(&client, "admin", "admin123").await.unwrap();
    assert!(session.is_authenticated());
    assert!(session.is_admin());

    // Second run: a fresh client restores from disk and revalidates.
    let fresh = client_for(&server);
    let mut restored = storehub_backend::client::session::Session::new(&token_path);
    assert!(restored.restore(&fresh).await);
    assert_eq!(restored.user().unwrap().username, "admin");

    // A corrupted token fails validation and clears the session.
    std::fs::write(&token_path, "tampered").unwrap();
    let broken = client_for(&server);
    let mut rejected = storehub_backend::client::session::Session::new(&token_path);
    assert!(!rejected.restore(&broken).await);
    assert!(!rejected.is_authenticated());
    assert!(!token_path.exists());
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let server = spawn_server().await;
    let raw = reqwest::Client::new();

    let resp = raw
        .get(format!("{}/api/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "Server is running");
    assert!(body["timestamp"].is_string());

    let resp = raw
        .get(format!("{}/api/nope", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn incomplete_bodies_get_the_standard_error_shape() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;
    let token = admin.token().unwrap();
    let raw = reqwest::Client::new();

    // Login with the password field absent entirely.
    let resp = raw
        .post(format!("{}/api/auth", server.base_url))
        .json(&serde_json::json!({ "username": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Username and password are required");

    // Product create with no price field.
    let resp = raw
        .post(format!("{}/api/products", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "X", "description": "d", "category": "c", "stock": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request body");

    // User create with no password field.
    let resp = raw
        .post(format!("{}/api/users", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "username": "frank",
            "address": "1 Main St",
            "phonenumber": "555-0100",
            "email": "frank@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Password must be at least 6 characters");

    // Syntactically broken JSON.
    let resp = raw
        .post(format!("{}/api/auth", server.base_url))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request body");
}
