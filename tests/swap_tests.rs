// tests/swap_tests.rs

use rewear_backend::engine::SwapEngine;
use rewear_backend::utils::upload::ImageStore;
use rewear_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

/// Spawns the app on a random port and returns its base URL.
/// Returns None when DATABASE_URL is not set, so these tests no-op on
/// machines without a running Postgres.
async fn spawn_app() -> Option<String> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let upload_dir = std::env::temp_dir()
        .join(format!("rewear-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .expect("Failed to create test upload dir");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "swap_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        upload_dir: upload_dir.clone(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        engine: SwapEngine::new(pool.clone()),
        images: ImageStore::new(&upload_dir),
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(address)
}

async fn test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

/// Registers a fresh user through the API and returns (user_id, token).
async fn register_and_login(address: &str, client: &reqwest::Client) -> (i64, String) {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let email = format!("{}@example.com", username);
    let password = "password123";

    let resp = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "name": "Test User",
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    let token = login["access_token"]
        .as_str()
        .expect("Token not found")
        .to_string();
    let user_id = login["user"]["id"].as_i64().expect("User id not found");
    (user_id, token)
}

async fn seed_item(pool: &PgPool, uploader_id: i64, title: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO items (title, category, type, condition, uploader_id, approved) \
         VALUES ($1, 'Tops', 'Jacket', 'Good', $2, TRUE) RETURNING id",
    )
    .bind(title)
    .bind(uploader_id)
    .fetch_one(pool)
    .await
    .expect("Failed to seed item")
}

async fn set_points(pool: &PgPool, user_id: i64, points: i64) {
    sqlx::query("UPDATE users SET points_balance = $1 WHERE id = $2")
        .bind(points)
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to set points");
}

async fn points_of(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT points_balance FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read points balance")
}

async fn item_status(pool: &PgPool, item_id: i64) -> String {
    sqlx::query_scalar::<_, String>("SELECT status::TEXT FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read item status")
}

async fn swap_status(pool: &PgPool, swap_id: i64) -> String {
    sqlx::query_scalar::<_, String>("SELECT status::TEXT FROM swaps WHERE id = $1")
        .bind(swap_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read swap status")
}

#[tokio::test]
async fn points_request_reserves_the_balance_immediately() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, _) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Wool coat").await;
    set_points(&pool, requester_id, 100).await;

    // Act
    let response = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 40,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: the hold is taken before the owner has said anything.
    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(points_of(&pool, requester_id).await, 60);

    let (points_used, redemption) = sqlx::query_as::<_, (i64, String)>(
        "SELECT points_used, status::TEXT FROM redemptions WHERE user_id = $1 AND item_id = $2",
    )
    .bind(requester_id)
    .bind(item_id)
    .fetch_one(&pool)
    .await
    .expect("Redemption row not found");
    assert_eq!(points_used, 40);
    assert_eq!(redemption, "pending");

    // The item itself stays available until the owner accepts.
    assert_eq!(item_status(&pool, item_id).await, "available");
}

#[tokio::test]
async fn rejecting_a_points_request_refunds_the_hold() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Denim jacket").await;
    set_points(&pool, requester_id, 100).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 40,
        }))
        .send()
        .await
        .expect("Failed to create swap")
        .json()
        .await
        .expect("Failed to parse create response");
    let swap_id = created["swap_id"].as_i64().expect("swap_id not found");
    assert_eq!(points_of(&pool, requester_id).await, 60);

    // Act
    let response = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "reject" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert: refund in full, hold cancelled, nothing consumed.
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(points_of(&pool, requester_id).await, 100);
    assert_eq!(swap_status(&pool, swap_id).await, "rejected");
    assert_eq!(item_status(&pool, item_id).await, "available");

    let redemption = sqlx::query_scalar::<_, String>(
        "SELECT status::TEXT FROM redemptions WHERE user_id = $1 AND item_id = $2",
    )
    .bind(requester_id)
    .bind(item_id)
    .fetch_one(&pool)
    .await
    .expect("Redemption row not found");
    assert_eq!(redemption, "cancelled");
}

#[tokio::test]
async fn accepting_a_points_request_completes_the_hold() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Linen shirt").await;
    set_points(&pool, requester_id, 100).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 55,
        }))
        .send()
        .await
        .expect("Failed to create swap")
        .json()
        .await
        .expect("Failed to parse create response");
    let swap_id = created["swap_id"].as_i64().expect("swap_id not found");

    // Act
    let response = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "accept" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert: the reserved points are spent, never refunded.
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(points_of(&pool, requester_id).await, 45);
    assert_eq!(swap_status(&pool, swap_id).await, "accepted");
    assert_eq!(item_status(&pool, item_id).await, "swapped");

    let redemption = sqlx::query_scalar::<_, String>(
        "SELECT status::TEXT FROM redemptions WHERE user_id = $1 AND item_id = $2",
    )
    .bind(requester_id)
    .bind(item_id)
    .fetch_one(&pool)
    .await
    .expect("Redemption row not found");
    assert_eq!(redemption, "completed");
}

#[tokio::test]
async fn accepting_a_direct_swap_consumes_both_items() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let wanted = seed_item(&pool, owner_id, "Leather boots").await;
    let offered = seed_item(&pool, requester_id, "Canvas sneakers").await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "direct",
            "requested_item_id": wanted,
            "offered_item_id": offered,
        }))
        .send()
        .await
        .expect("Failed to create swap")
        .json()
        .await
        .expect("Failed to parse create response");
    let swap_id = created["swap_id"].as_i64().expect("swap_id not found");

    // Act
    let response = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "accept" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(swap_status(&pool, swap_id).await, "accepted");
    assert_eq!(item_status(&pool, wanted).await, "swapped");
    assert_eq!(item_status(&pool, offered).await, "swapped");
}

#[tokio::test]
async fn rejecting_a_direct_swap_leaves_both_items_available() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let wanted = seed_item(&pool, owner_id, "Corduroy blazer").await;
    let offered = seed_item(&pool, requester_id, "Knit sweater").await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "direct",
            "requested_item_id": wanted,
            "offered_item_id": offered,
        }))
        .send()
        .await
        .expect("Failed to create swap")
        .json()
        .await
        .expect("Failed to parse create response");
    let swap_id = created["swap_id"].as_i64().expect("swap_id not found");

    // Act
    let response = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "reject" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(swap_status(&pool, swap_id).await, "rejected");
    assert_eq!(item_status(&pool, wanted).await, "available");
    assert_eq!(item_status(&pool, offered).await, "available");
}

#[tokio::test]
async fn requesting_your_own_item_is_refused() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (user_id, token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, user_id, "Plaid scarf").await;
    set_points(&pool, user_id, 100).await;

    // Act
    let response = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 10,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: refused, and the balance is untouched.
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(points_of(&pool, user_id).await, 100);
}

#[tokio::test]
async fn offering_someone_elses_item_is_refused() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, _) = register_and_login(&address, &client).await;
    let (bystander_id, _) = register_and_login(&address, &client).await;
    let (_, requester_token) = register_and_login(&address, &client).await;
    let wanted = seed_item(&pool, owner_id, "Wool beanie").await;
    let not_mine = seed_item(&pool, bystander_id, "Silk tie").await;

    // Act
    let response = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "direct",
            "requested_item_id": wanted,
            "offered_item_id": not_mine,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(item_status(&pool, not_mine).await, "available");
}

#[tokio::test]
async fn insufficient_points_leaves_no_trace() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, _) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Trench coat").await;
    set_points(&pool, requester_id, 30).await;

    // Act
    let response = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 40,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: no deduction, no redemption, no swap.
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(points_of(&pool, requester_id).await, 30);

    let redemptions = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM redemptions WHERE user_id = $1 AND item_id = $2",
    )
    .bind(requester_id)
    .bind(item_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(redemptions, 0);

    let swaps = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM swaps WHERE requester_id = $1 AND requested_item_id = $2",
    )
    .bind(requester_id)
    .bind(item_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(swaps, 0);
}

#[tokio::test]
async fn duplicate_pending_points_requests_conflict() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, _) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Puffer vest").await;
    set_points(&pool, requester_id, 100).await;

    let first = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 40,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(first.status().as_u16(), 201);

    // Act: same user, same item, while the first hold is still open.
    let second = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 10,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert: 409, and the failed attempt's deduction rolled back.
    assert_eq!(second.status().as_u16(), 409);
    assert_eq!(points_of(&pool, requester_id).await, 60);
}

#[tokio::test]
async fn a_processed_swap_cannot_be_responded_to_again() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Cargo pants").await;
    set_points(&pool, requester_id, 100).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 25,
        }))
        .send()
        .await
        .expect("Failed to create swap")
        .json()
        .await
        .expect("Failed to parse create response");
    let swap_id = created["swap_id"].as_i64().expect("swap_id not found");

    let reject = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "reject" }))
        .send()
        .await
        .expect("Failed to respond");
    assert_eq!(reject.status().as_u16(), 200);

    // Act: try to flip the decision afterwards.
    let accept = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "accept" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert: refused, and the refund was not disturbed.
    assert_eq!(accept.status().as_u16(), 400);
    assert_eq!(swap_status(&pool, swap_id).await, "rejected");
    assert_eq!(points_of(&pool, requester_id).await, 100);
}

#[tokio::test]
async fn only_the_requested_items_owner_may_respond() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, _) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Rain parka").await;
    set_points(&pool, requester_id, 100).await;

    let created: serde_json::Value = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "points",
            "requested_item_id": item_id,
            "points_used": 20,
        }))
        .send()
        .await
        .expect("Failed to create swap")
        .json()
        .await
        .expect("Failed to parse create response");
    let swap_id = created["swap_id"].as_i64().expect("swap_id not found");

    // Act: the requester tries to accept their own request.
    let response = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({ "action": "accept" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(swap_status(&pool, swap_id).await, "pending");
}

#[tokio::test]
async fn concurrent_points_requests_cannot_overdraw() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, _) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let item_one = seed_item(&pool, owner_id, "Flannel shirt").await;
    let item_two = seed_item(&pool, owner_id, "Suede loafers").await;
    set_points(&pool, requester_id, 100).await;

    // Act: two 60-point requests race for a 100-point balance.
    let (first, second) = tokio::join!(
        client
            .post(&format!("{}/api/swap/request", address))
            .header("Authorization", format!("Bearer {}", requester_token))
            .json(&serde_json::json!({
                "swap_type": "points",
                "requested_item_id": item_one,
                "points_used": 60,
            }))
            .send(),
        client
            .post(&format!("{}/api/swap/request", address))
            .header("Authorization", format!("Bearer {}", requester_token))
            .json(&serde_json::json!({
                "swap_type": "points",
                "requested_item_id": item_two,
                "points_used": 60,
            }))
            .send(),
    );

    // Assert: exactly one wins, and the loser left no partial state behind.
    let statuses = [
        first.expect("first request failed").status().as_u16(),
        second.expect("second request failed").status().as_u16(),
    ];
    let created = statuses.iter().filter(|s| **s == 201).count();
    assert_eq!(created, 1, "exactly one request may take the hold: {:?}", statuses);
    assert_eq!(points_of(&pool, requester_id).await, 40);

    let open_holds = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM redemptions WHERE user_id = $1 AND status = 'pending'",
    )
    .bind(requester_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(open_holds, 1);
}

#[tokio::test]
async fn accepting_a_second_swap_for_the_same_item_fails() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (first_id, first_token) = register_and_login(&address, &client).await;
    let (second_id, second_token) = register_and_login(&address, &client).await;
    let item_id = seed_item(&pool, owner_id, "Velvet dress").await;
    set_points(&pool, first_id, 100).await;
    set_points(&pool, second_id, 100).await;

    let mut swap_ids = Vec::new();
    for token in [&first_token, &second_token] {
        let created: serde_json::Value = client
            .post(&format!("{}/api/swap/request", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "swap_type": "points",
                "requested_item_id": item_id,
                "points_used": 30,
            }))
            .send()
            .await
            .expect("Failed to create swap")
            .json()
            .await
            .expect("Failed to parse create response");
        swap_ids.push(created["swap_id"].as_i64().expect("swap_id not found"));
    }

    let accept_first = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_ids[0]))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "accept" }))
        .send()
        .await
        .expect("Failed to respond");
    assert_eq!(accept_first.status().as_u16(), 200);

    // Act: the item is already gone; accepting the second must fail.
    let accept_second = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_ids[1]))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "accept" }))
        .send()
        .await
        .expect("Failed to respond");

    // Assert: the second swap stays pending and its hold stays reserved,
    // so the owner can still reject it to release the points.
    assert_eq!(accept_second.status().as_u16(), 400);
    assert_eq!(swap_status(&pool, swap_ids[1]).await, "pending");
    assert_eq!(points_of(&pool, second_id).await, 70);

    let reject_second = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_ids[1]))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "reject" }))
        .send()
        .await
        .expect("Failed to respond");
    assert_eq!(reject_second.status().as_u16(), 200);
    assert_eq!(points_of(&pool, second_id).await, 100);
}

#[tokio::test]
async fn swap_listings_show_both_sides_of_a_request() {
    // Arrange
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (owner_id, owner_token) = register_and_login(&address, &client).await;
    let (requester_id, requester_token) = register_and_login(&address, &client).await;
    let wanted = seed_item(&pool, owner_id, "Houndstooth coat").await;
    let offered = seed_item(&pool, requester_id, "Striped cardigan").await;

    let owner_username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
        .bind(owner_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let requester_username =
        sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
            .bind(requester_id)
            .fetch_one(&pool)
            .await
            .unwrap();

    let created = client
        .post(&format!("{}/api/swap/request", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .json(&serde_json::json!({
            "swap_type": "direct",
            "requested_item_id": wanted,
            "offered_item_id": offered,
        }))
        .send()
        .await
        .expect("Failed to create swap");
    assert_eq!(created.status().as_u16(), 201);

    // Act / Assert: the requester's view names the other side's uploader.
    let mine: serde_json::Value = client
        .get(&format!("{}/api/swap/my-requests", address))
        .header("Authorization", format!("Bearer {}", requester_token))
        .send()
        .await
        .expect("Failed to list my requests")
        .json()
        .await
        .expect("Failed to parse my requests");

    let swaps = mine["swaps"].as_array().expect("swaps not an array");
    assert_eq!(swaps.len(), 1);
    assert_eq!(swaps[0]["status"], "pending");
    assert_eq!(swaps[0]["requested_item"]["title"], "Houndstooth coat");
    assert_eq!(swaps[0]["requested_item"]["uploader"], owner_username);
    assert_eq!(swaps[0]["offered_item"]["title"], "Striped cardigan");
    assert!(swaps[0]["requester"].is_null());

    // The owner's view names the requester instead.
    let received: serde_json::Value = client
        .get(&format!("{}/api/swap/received-requests", address))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .expect("Failed to list received requests")
        .json()
        .await
        .expect("Failed to parse received requests");

    let swaps = received["swaps"].as_array().expect("swaps not an array");
    assert_eq!(swaps.len(), 1);
    assert_eq!(swaps[0]["requester"]["username"], requester_username);
    assert_eq!(swaps[0]["requested_item"]["title"], "Houndstooth coat");
    let swap_id = swaps[0]["id"].as_i64().unwrap();

    // Once processed, the request leaves the owner's pending list.
    let rejected = client
        .post(&format!("{}/api/swap/{}/respond", address, swap_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "action": "reject" }))
        .send()
        .await
        .expect("Failed to respond");
    assert_eq!(rejected.status().as_u16(), 200);

    let received: serde_json::Value = client
        .get(&format!("{}/api/swap/received-requests", address))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .expect("Failed to list received requests")
        .json()
        .await
        .expect("Failed to parse received requests");
    assert_eq!(received["swaps"].as_array().unwrap().len(), 0);
}
