use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Anyone may read threads, messages and vote
/// tallies; writing anything requires the authenticated router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe.
        .route("/health", get(|| async { "ok" }))
        // --- Identity ---
        .route("/api/auth/register", post(handlers::register_user))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/users/{username}", get(handlers::get_user_profile))
        // --- Browsing ---
        // GET /api/threads
        // Newest first.
        .route("/api/threads", get(handlers::get_threads))
        // GET /api/threads/search?keyword=...
        // The static segment wins over `{id}` below.
        .route("/api/threads/search", get(handlers::search_threads))
        .route("/api/threads/{id}", get(handlers::get_thread))
        // GET /api/messages/thread/{thread_id}
        // Oldest first. Unknown threads yield an empty list.
        .route("/api/messages/thread/{thread_id}", get(handlers::get_thread_messages))
        .route("/api/votes/message/{id}", get(handlers::get_vote_counts))
}
