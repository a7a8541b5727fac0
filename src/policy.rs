//! Authorization rules for the forum.
//!
//! Pure decision functions: no IO, no state, no panics. Every gated service operation
//! consults exactly one of these before it touches the store and turns a `false` into
//! `AppError::Forbidden`.

use crate::error::AppError;
use crate::models::Role;

/// ADMIN and SUPERADMIN may look at the verification queue.
pub fn can_list_pending_users(actor: Role) -> bool {
    match actor {
        Role::Admin | Role::Superadmin => true,
        Role::User | Role::Dev => false,
    }
}

/// Only SUPERADMIN sees the full user directory.
pub fn can_list_all_users(actor: Role) -> bool {
    match actor {
        Role::Superadmin => true,
        Role::User | Role::Dev | Role::Admin => false,
    }
}

/// SUPERADMIN verifies anyone; ADMIN verifies DEV accounts only.
pub fn can_verify(actor: Role, target: Role) -> bool {
    match (actor, target) {
        (Role::Superadmin, _) => true,
        (Role::Admin, Role::Dev) => true,
        (Role::Admin, Role::User | Role::Admin | Role::Superadmin) => false,
        (Role::User | Role::Dev, _) => false,
    }
}

/// Replies are reserved for DEV accounts. Verification status is not consulted.
pub fn can_create_message(actor: Role) -> bool {
    match actor {
        Role::Dev => true,
        Role::User | Role::Admin | Role::Superadmin => false,
    }
}

/// Owner-only mutation: the requester's username must equal the owner's.
pub fn can_mutate_owned_content(actor_username: &str, owner_username: &str) -> bool {
    actor_username == owner_username
}

/// Turns a negative decision into `Forbidden`, logging the denial.
pub fn ensure(allowed: bool, reason: &str) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else {
        tracing::warn!(reason, "authorization denied");
        Err(AppError::Forbidden(reason.to_string()))
    }
}
