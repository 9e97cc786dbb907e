//! Integration tests for the chat message REST endpoints.

use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use bookbuddy_server::config::WsConfig;
use bookbuddy_server::db::models::{NewUser, ROLE_USER};
use bookbuddy_server::db::{init_db, users, DbPool};
use bookbuddy_server::ws::events::MessageView;

struct TestServer {
    base_url: String,
    db: DbPool,
    secret: Vec<u8>,
}

async fn start_test_server() -> TestServer {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = init_db(&data_dir).expect("Failed to init DB");
    let secret = bookbuddy_server::auth::jwt::load_or_generate_jwt_secret(&data_dir)
        .expect("Failed to generate JWT secret");
    let state = bookbuddy_server::state::AppState::new(
        db.clone(),
        secret.clone(),
        "token".to_string(),
        WsConfig::default(),
    );

    let app = bookbuddy_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    TestServer {
        base_url: format!("http://{}", addr),
        db,
        secret,
    }
}

fn create_user(server: &TestServer, name: &str) -> (String, String) {
    let conn = server.db.lock().unwrap();
    let id = users::insert_user(
        &conn,
        &NewUser {
            display_name: name,
            email: &format!("{}@example.com", name.to_lowercase()),
            password_hash: "not-used-here",
            role: ROLE_USER,
        },
    )
    .unwrap();
    let token =
        bookbuddy_server::auth::jwt::issue_session_token(&server.secret, &id, ROLE_USER).unwrap();
    (id, token)
}

#[tokio::test]
async fn test_health_check() {
    let server = start_test_server().await;
    let resp = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_send_requires_authentication() {
    let server = start_test_server().await;
    let (bob_id, _) = create_user(&server, "Bob");

    let resp = reqwest::Client::new()
        .post(format!("{}/api/messages", server.base_url))
        .json(&json!({ "receiver_id": bob_id, "text": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = reqwest::Client::new()
        .post(format!("{}/api/messages", server.base_url))
        .bearer_auth("forged")
        .json(&json!({ "receiver_id": bob_id, "text": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_send_rejects_blank_text_and_unknown_receiver() {
    let server = start_test_server().await;
    let (_alice_id, alice_token) = create_user(&server, "Alice");
    let (bob_id, _) = create_user(&server, "Bob");
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/messages", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "receiver_id": bob_id, "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/api/messages", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "receiver_id": "nobody", "text": "hello?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_send_to_offline_receiver_succeeds_and_trims() {
    let server = start_test_server().await;
    let (alice_id, alice_token) = create_user(&server, "Alice");
    let (bob_id, _) = create_user(&server, "Bob");

    let resp = reqwest::Client::new()
        .post(format!("{}/api/messages", server.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "receiver_id": bob_id, "text": "  is the book still free?  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let view: MessageView = resp.json().await.unwrap();
    assert_eq!(view.text, "is the book still free?");
    assert_eq!(view.sender_id, alice_id);
    assert_eq!(view.receiver_id, bob_id);
    assert_eq!(view.sender.id, alice_id);
    assert_eq!(view.sender.display_name, "Alice");
}

#[tokio::test]
async fn test_history_is_ascending_across_both_directions() {
    let server = start_test_server().await;
    let (alice_id, alice_token) = create_user(&server, "Alice");
    let (bob_id, bob_token) = create_user(&server, "Bob");
    let (carol_id, carol_token) = create_user(&server, "Carol");
    let client = reqwest::Client::new();

    let send = |token: String, receiver: String, text: &'static str| {
        let client = client.clone();
        let url = format!("{}/api/messages", server.base_url);
        async move {
            let resp = client
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "receiver_id": receiver, "text": text }))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 201);
        }
    };

    send(alice_token.clone(), bob_id.clone(), "one").await;
    send(bob_token.clone(), alice_id.clone(), "two").await;
    send(carol_token.clone(), alice_id.clone(), "not in this thread").await;
    send(alice_token.clone(), bob_id.clone(), "three").await;

    // Session cookie works for REST as well as the socket
    let history: Vec<MessageView> = client
        .get(format!("{}/api/messages/{}", server.base_url, bob_id))
        .header("Cookie", format!("token={}", alice_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
    assert!(history.iter().all(|m| m.sender_id != carol_id));
}
