mod auth;
mod db;
mod products;
mod storage;
mod validation;

use axum::{
    extract::FromRef,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthService, TokenService, UserRepository};
use products::{ImagesRepository, ProductsRepository};
use storage::LocalImageStore;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        products::handlers::list_products_handler,
        products::handlers::get_product_handler,
        products::handlers::create_product_handler,
        products::handlers::update_product_handler,
        products::handlers::delete_product_handler,
        products::handlers::upload_images_handler,
        products::handlers::delete_image_handler,
    ),
    components(
        schemas(
            products::CreateProduct,
            products::UpdateProduct,
            products::ProductResponse,
            products::ProductListResponse,
            products::ProductImageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "products", description = "Vehicle listing management endpoints")
    ),
    info(
        title = "CarSell API",
        version = "1.0.0",
        description = "RESTful API for a vehicle-listing marketplace"
    )
)]
struct ApiDoc;

/// Registers the bearer scheme referenced by the protected catalog paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    token_service: TokenService,
    auth_service: AuthService,
    products_repo: ProductsRepository,
    images_repo: ImagesRepository,
    image_store: LocalImageStore,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.token_service.clone()
    }
}

/// Creates and configures the application router.
/// Maps all API endpoints to their handlers and adds CORS middleware.
fn create_router(db: PgPool, token_service: TokenService, image_store: LocalImageStore) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let user_repo = UserRepository::new(db.clone());
    let auth_service = AuthService::new(user_repo, token_service.clone());
    let products_repo = ProductsRepository::new(db.clone());
    let images_repo = ImagesRepository::new(db);

    let state = AppState {
        token_service,
        auth_service,
        products_repo,
        images_repo,
        image_store,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Authentication routes
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/me", get(auth::me_handler))
        // Catalog routes (mutations require a valid access token)
        .route("/api/products", get(products::list_products_handler))
        .route("/api/products", post(products::create_product_handler))
        .route("/api/products/:id", get(products::get_product_handler))
        .route("/api/products/:id", put(products::update_product_handler))
        .route("/api/products/:id", delete(products::delete_product_handler))
        .route("/api/products/:id/images", post(products::upload_images_handler))
        .route(
            "/api/products/:id/images/:image_id",
            delete(products::delete_image_handler),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("CarSell API - Starting...");

    // Get configuration from environment variables. The signing secret is
    // loaded exactly once here; a missing secret aborts startup rather
    // than failing requests later.
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let jwt_secret = std::env::var("JWT_SECRET")
        .expect("JWT_SECRET must be set in environment");
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());
    let uploads_dir = std::env::var("UPLOADS_DIR")
        .unwrap_or_else(|_| "uploads".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let image_store = LocalImageStore::new(&uploads_dir)
        .await
        .expect("Failed to initialize image store");

    let token_service = TokenService::new(jwt_secret);

    // Create the application router
    let app = create_router(db_pool, token_service, image_store);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("CarSell API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
