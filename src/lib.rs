use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Forum core: rules, state machine and the services that apply them.
pub mod error;
pub mod models;
pub mod policy;
pub mod services;
pub mod voting;

// Infrastructure: persistence, identity and configuration.
pub mod auth;
pub mod config;
pub mod credentials;
pub mod repository;

// HTTP surface.
pub mod handlers;
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::Credentials;
pub use error::{AppError, AppResult};
pub use repository::{InMemoryRepository, PostgresRepository, Repository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document built from the `#[utoipa::path]` handlers and `ToSchema` models.
/// Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login, handlers::get_user_profile,
        handlers::create_thread, handlers::get_threads, handlers::get_thread,
        handlers::search_threads, handlers::update_thread, handlers::delete_thread,
        handlers::post_message, handlers::get_thread_messages, handlers::update_message,
        handlers::delete_message, handlers::submit_vote, handlers::get_vote_counts,
        handlers::get_pending_users, handlers::verify_user, handlers::get_all_users
    ),
    components(
        schemas(
            models::Role, models::VoteType, models::Thread, models::Message, models::VoteCounts,
            models::RegisterUserRequest, models::LoginRequest, models::AuthResponse,
            models::UserResponse, models::CreateThreadRequest, models::UpdateThreadRequest,
            models::CreateMessageRequest, models::UpdateMessageRequest, models::VoteRequest,
            models::VoteOutcome, models::VoteResponse, models::VerificationOutcome,
            models::VerificationResponse,
        )
    ),
    tags(
        (name = "devchat", description = "DevChat discussion forum API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cloneable container for everything a request may need.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in deployments, in-memory for local runs and tests.
    pub repo: RepositoryState,
    /// Password hashing and token issuance.
    pub credentials: Credentials,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            credentials: Credentials::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for Credentials {
    fn from_ref(app_state: &AppState) -> Credentials {
        app_state.credentials.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless `AuthUser` can be extracted.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles public, authenticated and admin routes, then wraps them in the
/// request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Role checks for these happen in the services, after authentication.
        .nest(
            "/api/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line carries the request id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
