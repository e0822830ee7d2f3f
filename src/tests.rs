// Handler tests for the CarSell backend API
// Exercises the authentication lifecycle (registration, login, refresh
// rotation) and the catalog CRUD endpoints end to end.
//
// These tests need a running Postgres (DATABASE_URL) and are ignored by
// default; run them with `cargo test -- --ignored`.

use super::*;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "test_secret_key_for_integration_tests";

// ============================================================================
// Test Helpers
// ============================================================================

/// Connect to the test database and run migrations
async fn create_test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://carsell_user:carsell_pass@db:5432/carsell_db".to_string());

    let pool = crate::db::create_pool(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Build a TestServer over the full application router
async fn create_test_app(pool: PgPool) -> TestServer {
    let token_service = TokenService::new(TEST_JWT_SECRET.to_string());

    let uploads = std::env::temp_dir().join(format!("carsell-test-{}", Uuid::new_v4()));
    let image_store = LocalImageStore::new(&uploads)
        .await
        .expect("Failed to create test image store");

    let app = create_router(pool, token_service, image_store);
    TestServer::new(app).unwrap()
}

/// A username that cannot collide across parallel test runs
fn unique_username(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Register a user and log them in, returning (access_token, refresh_token)
async fn register_and_login(server: &TestServer, username: &str, password: &str) -> (String, String) {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": password }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// A valid listing payload for catalog tests
fn valid_product_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Single owner, serviced on schedule",
        "price": 15200.0,
        "cash_price": 14500.0,
        "discount_percentage": 4.5,
        "city": "Algiers",
        "mileage": 68000,
        "brand": "Toyota",
        "category": "Sedan",
        "thumbnail": "uploads/thumb.jpg"
    })
}

// ============================================================================
// Registration Tests (POST /api/auth/register)
// ============================================================================

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_register_success() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("alice");

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "password-one" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["username"], username.as_str());
    // No tokens on registration; login is a separate step.
    assert!(body.get("access_token").is_none());
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_register_duplicate_username_conflict() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool.clone()).await;
    let username = unique_username("alice");

    let first = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "password-one" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let second = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "password-two" }))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);

    // Exactly one account exists for the name.
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&username)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_register_rejects_short_password() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": unique_username("bob"), "password": "short" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login Tests (POST /api/auth/login)
// ============================================================================

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_login_returns_well_formed_token_pair() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("carol");

    let (access, refresh) = register_and_login(&server, &username, "carol-password").await;

    // The access token must validate against the signing secret and carry
    // the account identity.
    let claims = TokenService::new(TEST_JWT_SECRET.to_string())
        .validate_access_token(&access)
        .unwrap();
    assert_eq!(claims.username, username);
    assert!(claims.sub > 0);

    assert_eq!(refresh.len(), 64);
    assert!(refresh.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_login_failures_are_indistinguishable() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("dave");

    server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "dave-password" }))
        .await;

    let wrong_password = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": "not-the-password" }))
        .await;
    let unknown_user = server
        .post("/api/auth/login")
        .json(&json!({ "username": unique_username("nobody"), "password": "whatever-pw" }))
        .await;

    assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status_code(), StatusCode::UNAUTHORIZED);
    // Same body for both, so responses cannot enumerate usernames.
    assert_eq!(wrong_password.text(), unknown_user.text());
}

// ============================================================================
// Refresh Rotation Tests (POST /api/auth/refresh)
// ============================================================================

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_refresh_rotates_and_rejects_reuse() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("erin");

    let (_, r1) = register_and_login(&server, &username, "erin-password").await;

    // First exchange succeeds and yields a different token.
    let response = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": r1 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let r2 = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(r1, r2);

    // The rotated-out token is permanently dead.
    let replay = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": r1 }))
        .await;
    assert_eq!(replay.status_code(), StatusCode::UNAUTHORIZED);

    // The fresh one works exactly once.
    let response = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": r2 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let replay = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": r2 }))
        .await;
    assert_eq!(replay.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_refresh_with_unknown_token_unauthorized() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": "A".repeat(64) }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_concurrent_refresh_exactly_one_succeeds() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("frank");

    let (_, refresh) = register_and_login(&server, &username, "frank-password").await;

    // Two simultaneous exchanges with the same still-valid token: the
    // conditional rotation lets exactly one through.
    let (first, second) = tokio::join!(
        async {
            server
                .post("/api/auth/refresh")
                .json(&json!({ "refresh_token": refresh }))
                .await
        },
        async {
            server
                .post("/api/auth/refresh")
                .json(&json!({ "refresh_token": refresh }))
                .await
        }
    );

    let statuses = [first.status_code(), second.status_code()];
    assert!(statuses.contains(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::UNAUTHORIZED));
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_full_auth_lifecycle() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("alice");

    // register alice/pw1 -> 200
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "password-one" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // register alice/pw2 -> 409
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "password-two" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    // login alice/pw2 -> 401
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": "password-two" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // login alice/pw1 -> 200 with tokens A1/R1
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": "password-one" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let r1 = body["refresh_token"].as_str().unwrap().to_string();

    // refresh R1 -> 200 with A2/R2, R1 != R2
    let response = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": r1 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_ne!(body["refresh_token"].as_str().unwrap(), r1);

    // refresh R1 again -> 401
    let response = server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": r1 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Protected Route Tests (GET /api/auth/me)
// ============================================================================

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_me_returns_profile_for_valid_token() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("grace");

    let (access, _) = register_and_login(&server, &username, "grace-password").await;

    let response = server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&access))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["username"], username.as_str());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_me_without_token_unauthorized() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server.get("/api/auth/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Catalog Tests (/api/products)
// ============================================================================

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_create_product_requires_auth() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;

    let response = server
        .post("/api/products")
        .json(&valid_product_payload("Unauthenticated listing"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_product_crud_flow() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("seller");

    let (access, _) = register_and_login(&server, &username, "seller-password").await;

    // Create
    let response = server
        .post("/api/products")
        .add_header(header::AUTHORIZATION, bearer(&access))
        .json(&valid_product_payload("2018 Toyota Corolla"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "2018 Toyota Corolla");
    assert_eq!(created["images"].as_array().unwrap().len(), 0);

    // Get
    let response = server.get(&format!("/api/products/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Partial update keeps omitted fields
    let response = server
        .put(&format!("/api/products/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&access))
        .json(&json!({ "price": 14900.0 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_eq!(updated["title"], "2018 Toyota Corolla");
    assert_eq!(updated["price"], 14900.0);

    // Delete
    let response = server
        .delete(&format!("/api/products/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&access))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server.get(&format!("/api/products/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_product_validation_rejects_bad_payloads() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("seller");

    let (access, _) = register_and_login(&server, &username, "seller-password").await;

    let mut negative_price = valid_product_payload("Bad price");
    negative_price["price"] = json!(-1.0);
    let response = server
        .post("/api/products")
        .add_header(header::AUTHORIZATION, bearer(&access))
        .json(&negative_price)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let mut big_discount = valid_product_payload("Bad discount");
    big_discount["discount_percentage"] = json!(150.0);
    let response = server
        .post("/api/products")
        .add_header(header::AUTHORIZATION, bearer(&access))
        .json(&big_discount)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_list_products_paging_envelope() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("seller");

    let (access, _) = register_and_login(&server, &username, "seller-password").await;

    for i in 0..3 {
        let response = server
            .post("/api/products")
            .add_header(header::AUTHORIZATION, bearer(&access))
            .json(&valid_product_payload(&format!("Paging fixture {}", i)))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let response = server.get("/api/products?skip=1&limit=2").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["skip"], 1);
    assert_eq!(body["limit"], 2);
    assert!(body["total"].as_i64().unwrap() >= 3);
    assert!(body["products"].as_array().unwrap().len() <= 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_update_nonexistent_product_not_found() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool).await;
    let username = unique_username("seller");

    let (access, _) = register_and_login(&server, &username, "seller-password").await;

    let response = server
        .put("/api/products/2147483646")
        .add_header(header::AUTHORIZATION, bearer(&access))
        .json(&json!({ "price": 1000.0 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_delete_image_detaches_and_404s_for_strangers() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool.clone()).await;
    let username = unique_username("seller");

    let (access, _) = register_and_login(&server, &username, "seller-password").await;

    let response = server
        .post("/api/products")
        .add_header(header::AUTHORIZATION, bearer(&access))
        .json(&valid_product_payload("With image"))
        .await;
    let id = response.json::<Value>()["id"].as_i64().unwrap() as i32;

    // Attach an image row directly; upload transport is covered elsewhere.
    let image_id: (i32,) = sqlx::query_as(
        "INSERT INTO product_images (product_id, path) VALUES ($1, $2) RETURNING id",
    )
    .bind(id)
    .bind("uploads/fixture.jpg")
    .fetch_one(&pool)
    .await
    .unwrap();

    let response = server.get(&format!("/api/products/{}", id)).await;
    assert_eq!(response.json::<Value>()["images"].as_array().unwrap().len(), 1);

    // Wrong product id -> 404, row untouched
    let response = server
        .delete(&format!("/api/products/{}/images/{}", id + 1, image_id.0))
        .add_header(header::AUTHORIZATION, bearer(&access))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .delete(&format!("/api/products/{}/images/{}", id, image_id.0))
        .add_header(header::AUTHORIZATION, bearer(&access))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server.get(&format!("/api/products/{}", id)).await;
    assert_eq!(response.json::<Value>()["images"].as_array().unwrap().len(), 0);
}
