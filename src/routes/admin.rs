use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Nested under `/api/admin`. The verification hierarchy lives in `policy`:
/// SUPERADMIN manages every account, ADMIN only DEV accounts.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/pending-users
        // Unverified accounts within the caller's tier.
        .route("/pending-users", get(handlers::get_pending_users))
        // POST /api/admin/verify-user/{id}
        // Idempotent: an already verified target reports `already_verified`.
        .route("/verify-user/{id}", post(handlers::verify_user))
        // GET /api/admin/all-users
        // SUPERADMIN only.
        .route("/all-users", get(handlers::get_all_users))
}
