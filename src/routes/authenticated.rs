use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Every write in the forum. The router is layered with `auth_middleware` in
/// `create_router`, and each handler also takes `AuthUser` so services receive the
/// caller explicitly. Ownership and role rules are enforced in the services.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Threads ---
        // POST /api/threads
        // Any authenticated role may open a thread.
        .route("/api/threads", post(handlers::create_thread))
        // PUT/DELETE /api/threads/{id}
        // Author only. Deleting removes the thread's messages and their votes.
        .route(
            "/api/threads/{id}",
            put(handlers::update_thread).delete(handlers::delete_thread),
        )
        // --- Messages ---
        // POST /api/messages
        // DEV accounts only.
        .route("/api/messages", post(handlers::post_message))
        .route(
            "/api/messages/{id}",
            put(handlers::update_message).delete(handlers::delete_message),
        )
        // --- Votes ---
        // POST /api/votes
        // Same type twice retracts, the other type switches.
        .route("/api/votes", post(handlers::submit_vote))
}
