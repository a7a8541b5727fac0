use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::AppError;

// --- Closed Enumerations ---

/// Role
///
/// The capability tier of an account. Stored as the Postgres enum `user_role` and
/// serialized as upper-case strings (`"DEV"`). The set is closed: every authorization
/// rule in `policy` matches on it exhaustively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Dev,
    Admin,
    Superadmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Dev, Role::Admin, Role::Superadmin];

    /// USER accounts are usable immediately; every other tier waits for a verifier.
    pub fn verified_on_registration(self) -> bool {
        matches!(self, Role::User)
    }
}

/// VoteType
///
/// The two reactions a voter can hold on a message. Stored as the Postgres enum `vote_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "vote_type", rename_all = "UPPERCASE")]
#[ts(export)]
pub enum VoteType {
    Upvote,
    Downvote,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table. Holds the password hash, so it is
/// never serialized directly; handlers answer with `UserResponse` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for `Repository::create_user`. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
}

/// Thread
///
/// A top-level discussion from the `threads` table, joined with the author's username.
/// `author_id` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    // Username of the author (JOIN on users).
    pub author: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Message
///
/// A reply from the `messages` table. `upvotes` and `downvotes` are a cached view of
/// the `votes` rows for this message and are only ever written by the vote transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub sender_id: i64,
    pub sender_username: String,
    pub thread_id: i64,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    #[ts(type = "number")]
    pub upvotes: i64,
    #[ts(type = "number")]
    pub downvotes: i64,
}

/// Vote
///
/// One voter's reaction to one message. At most one row exists per `(user_id, message_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub vote_type: VoteType,
}

/// VoteCounts
///
/// Aggregate tally for a message, always computed from live vote rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VoteCounts {
    #[ts(type = "number")]
    pub upvotes: i64,
    #[ts(type = "number")]
    pub downvotes: i64,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input for POST /api/auth/register. `role` falls back to USER when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("password", &self.password)?;
        if !self.email.contains('@') {
            return Err(AppError::Validation("email must contain '@'".to_string()));
        }
        Ok(())
    }
}

/// LoginRequest
///
/// Input for POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// CreateThreadRequest
///
/// Input for POST /api/threads.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateThreadRequest {
    pub title: String,
    pub content: String,
}

impl CreateThreadRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)?;
        require("content", &self.content)
    }
}

/// UpdateThreadRequest
///
/// Partial update for PUT /api/threads/{id}. Absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateThreadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UpdateThreadRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.is_none() && self.content.is_none() {
            return Err(AppError::Validation(
                "at least one of title or content is required".to_string(),
            ));
        }
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(content) = &self.content {
            require("content", content)?;
        }
        Ok(())
    }
}

/// CreateMessageRequest
///
/// Input for POST /api/messages.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateMessageRequest {
    pub thread_id: i64,
    pub content: String,
}

impl CreateMessageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require("content", &self.content)
    }
}

/// UpdateMessageRequest
///
/// Input for PUT /api/messages/{id}. Only the content of a message is editable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateMessageRequest {
    pub content: String,
}

impl UpdateMessageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require("content", &self.content)
    }
}

/// VoteRequest
///
/// Input for POST /api/votes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoteRequest {
    pub message_id: i64,
    pub vote_type: VoteType,
}

/// --- Response Schemas (Output) ---

/// UserResponse
///
/// Public view of a `User`: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub verified: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

/// AuthResponse
///
/// Returned by register (with a `message`) and login. The token is a signed bearer JWT.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub token: String,
    pub username: String,
    pub role: Role,
    pub verified: bool,
}

/// VoteOutcome
///
/// Which transition `submit_vote` performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum VoteOutcome {
    Added,
    Updated,
    Removed,
}

impl VoteOutcome {
    pub fn message(self) -> &'static str {
        match self {
            VoteOutcome::Added => "Vote added",
            VoteOutcome::Updated => "Vote updated",
            VoteOutcome::Removed => "Vote removed",
        }
    }
}

/// VoteResponse
///
/// Output of POST /api/votes: the transition taken and the recomputed tally.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoteResponse {
    pub message: String,
    pub outcome: VoteOutcome,
    pub vote_counts: VoteCounts,
}

/// VerificationOutcome
///
/// `AlreadyVerified` is reported instead of an error when the target was verified before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

/// VerificationResponse
///
/// Output of POST /api/admin/verify-user/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VerificationResponse {
    pub message: String,
    pub outcome: VerificationOutcome,
    pub user: UserResponse,
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}
