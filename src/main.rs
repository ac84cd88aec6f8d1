//! Fireside Bookgroup Backend
//!
//! REST backend for a community book group: a meeting list stored as JSON in a
//! GitHub repository, member management, broadcast email, and a calendar feed.

mod api;
mod auth;
mod calendar;
mod config;
mod covers;
mod dates;
mod errors;
mod mailer;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use covers::CoverResolver;
use mailer::Mailer;
use store::GithubStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GithubStore>,
    pub covers: Arc<CoverResolver>,
    pub mailer: Arc<Mailer>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration; missing credentials fail fast here
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fireside Bookgroup Backend");
    tracing::info!(
        "Data repository: {} (branch {})",
        config.github_repo,
        config.github_branch
    );
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (FIRESIDE_API_PSK). Admin API authentication is disabled!");
    }

    // One HTTP client shared by the store, cover resolver, and mailer.
    // GitHub rejects requests without a user agent.
    let client = reqwest::Client::builder()
        .user_agent(concat!("fireside-backend/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let state = AppState {
        store: Arc::new(GithubStore::new(client.clone(), &config)),
        covers: Arc::new(CoverResolver::with_default_sources(client.clone())),
        mailer: Arc::new(Mailer::new(client, &config)),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Books
        .route("/books", get(api::list_books))
        .route("/books", post(api::create_book))
        .route("/books/refresh-covers", post(api::refresh_covers))
        .route("/books/{id}", put(api::update_book))
        .route("/books/{id}", delete(api::delete_book))
        // Members
        .route("/members", get(api::list_members))
        .route("/members", post(api::create_member))
        .route("/members/{id}", put(api::update_member))
        .route("/members/{id}", delete(api::delete_member))
        // Messaging
        .route("/message-data", get(api::message_data))
        .route("/send-message", post(api::send_message))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/events.ics", get(api::events_feed));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
