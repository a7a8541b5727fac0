//! Forum operations.
//!
//! Each function takes the store and, where the operation is gated, the caller's
//! resolved `AuthUser`. Authorization is decided by `crate::policy` before any write.

pub mod accounts;
pub mod admin;
pub mod messages;
pub mod threads;
pub mod votes;
