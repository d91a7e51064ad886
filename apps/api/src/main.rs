use axum::{
    http::{header, Method},
    routing::get,
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod middleware;
mod models;
mod realtime;
mod repositories;
mod routes;
mod services;

pub use error::{ApiError, ApiResult, ErrorResponse};

use raindrops_storage_client::StorageClient;
use realtime::{realtime_router, RealtimeState, SettingsPubSub};
use repositories::{
    ProfileRepository, SessionRepository, SettingsRepository, TrackRepository, VoteRepository,
};
use routes::{
    auth_router, health_router, settings_router, tracks_router, uploads_router, users_router,
    votes_router, webhooks_router, AuthRoutesState, HealthState, SettingsRoutesState, TracksState,
    UploadsState, UsersState, VotesState, WebhooksState,
};
use services::{AuthConfig, AuthService, CatalogService, HealthService};

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ORIGINS` is not set, CORS requests are rejected (no origins allowed)
///
/// In development mode:
/// - If `CORS_ORIGINS` is set, those origins are used
/// - If `CORS_ORIGINS` is not set, permissive CORS is used for convenience
fn build_cors_layer(config: &config::Config) -> CorsLayer {
    let is_production = config.is_production();

    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::PATCH,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([
                        header::AUTHORIZATION,
                        header::CONTENT_TYPE,
                        header::ACCEPT,
                        header::ORIGIN,
                    ])
                    .allow_credentials(true)
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if is_production => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected. Set CORS_ORIGINS to allow cross-origin requests."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "raindrops_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting Immortal Raindrops API server on port {}", config.port);

    // Initialize database pool
    let database = config.database();
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            database.connect_timeout_secs,
        ))
        .connect(&database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations completed successfully");

    // Object storage client (credentials via the standard provider chain)
    let storage = StorageClient::connect(config.storage()).await;
    tracing::info!(bucket = storage.bucket(), "Object storage client initialized");

    // Repositories
    let track_repo = TrackRepository::new(pool.clone());
    let profile_repo = ProfileRepository::new(pool.clone());
    let vote_repo = VoteRepository::new(pool.clone());
    let settings_repo = SettingsRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    tracing::info!("Repositories initialized");

    // Auth service
    let auth_config = AuthConfig::with_expiry_strings(
        config.jwt_secret.clone(),
        &config.jwt_access_expiry,
        &config.jwt_refresh_expiry,
    );
    let auth_service = AuthService::new(pool.clone(), auth_config);
    tracing::info!("AuthService initialized");

    // Realtime settings fan-out (Redis if reachable, in-memory otherwise)
    let pubsub = SettingsPubSub::try_with_redis(&config.redis().connection_url()).await;
    if pubsub.is_redis_backed() {
        tracing::info!("Settings realtime sync is Redis-backed");
    }

    // Catalog and health services
    let catalog = CatalogService::new(track_repo.clone(), vote_repo.clone());
    let health_service = HealthService::new(
        pool.clone(),
        Some(config.redis().connection_url()),
        storage.clone(),
    );

    // Route states
    let health_state = HealthState::new(health_service);
    let auth_state = AuthRoutesState::new(auth_service.clone());
    let tracks_state = TracksState {
        catalog,
        tracks: track_repo.clone(),
        votes: vote_repo.clone(),
        storage: storage.clone(),
    };
    let votes_state = VotesState {
        votes: vote_repo,
        tracks: track_repo.clone(),
    };
    let uploads_state = UploadsState {
        tracks: track_repo,
        storage: storage.clone(),
    };
    let settings_state = SettingsRoutesState {
        settings: settings_repo.clone(),
        pubsub: pubsub.clone(),
    };
    let webhooks_state = WebhooksState {
        settings: settings_repo.clone(),
        pubsub: pubsub.clone(),
        webhook_token: config.webhook_token.clone(),
    };
    let users_state = UsersState {
        profiles: profile_repo.clone(),
    };
    let realtime_state = RealtimeState::new(pubsub, settings_repo);

    // Build the CORS layer from configuration
    let cors_layer = build_cors_layer(&config);

    // Build the router
    let app = Router::new()
        .route("/", get(root))
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router(health_state))
        // Auth REST routes: /auth/register, /auth/login, /auth/refresh, /auth/logout, /auth/me
        .nest("/auth", auth_router(auth_state))
        // Grid, per-track operations, and votes
        .nest(
            "/tracks",
            tracks_router(tracks_state).merge(votes_router(votes_state)),
        )
        // Presigned upload flow
        .nest("/uploads", uploads_router(uploads_state))
        // Site/system settings
        .nest("/settings", settings_router(settings_state))
        // Streaming-server webhook
        .nest("/webhooks", webhooks_router(webhooks_state))
        // Profile administration
        .nest("/users", users_router(users_state))
        // Realtime subscription: /ws/settings
        .nest("/ws", realtime_router(realtime_state))
        // Add services as extensions for middleware extractors
        .layer(Extension(auth_service))
        .layer(Extension(session_repo))
        .layer(Extension(profile_repo))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Immortal Raindrops - media archive API"
}
