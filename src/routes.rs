// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{delete, get, post},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::MAX_UPLOAD_BYTES,
    handlers::{admin, auth, items, swap},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, items, swap, admin).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Serves uploaded images as static files under /uploads.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
        "http://localhost:5173".parse().unwrap(),
        "http://127.0.0.1:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Per-IP limiter on the credential routes. Generous enough for normal
    // use, tight enough to blunt brute-force runs.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(100)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        .merge(
            Router::new().route("/me", get(auth::me)).layer(
                middleware::from_fn_with_state(state.config.clone(), auth_middleware),
            ),
        );

    let item_routes = Router::new()
        .route("/", get(items::list_items))
        .route("/{id}", get(items::get_item))
        // Protected item routes
        .merge(
            Router::new()
                .route("/upload", post(items::upload_item))
                .route("/mine", get(items::my_items))
                .route("/{id}", delete(items::delete_item))
                .layer(middleware::from_fn_with_state(
                    state.config.clone(),
                    auth_middleware,
                ))
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    let swap_routes = Router::new()
        .route("/request", post(swap::create_swap_request))
        .route("/{id}/respond", post(swap::respond_to_swap))
        .route("/my-requests", get(swap::my_requests))
        .route("/received-requests", get(swap::received_requests))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/items/pending", get(admin::pending_items))
        .route("/items/{id}/moderate", post(admin::moderate_item))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/toggle-admin", post(admin::toggle_admin))
        .route("/users/{id}/add-points", post(admin::add_points))
        .route("/reports", get(admin::reports))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn_with_state(
            state.pool.clone(),
            admin_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    // Serve images from the same directory the store writes into.
    let upload_dir = state.images.root().to_path_buf();

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/items", item_routes)
        .nest("/api/swap", swap_routes)
        .nest("/api/admin", admin_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
