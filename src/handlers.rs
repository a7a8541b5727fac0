use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    models::{
        AuthResponse, CreateMessageRequest, CreateThreadRequest, LoginRequest, Message,
        RegisterUserRequest, Thread, UpdateMessageRequest, UpdateThreadRequest, UserResponse,
        VerificationResponse, VoteCounts, VoteRequest, VoteResponse,
    },
    services::{accounts, admin, messages, threads, votes},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

// --- Filter Structs ---

/// ThreadSearch
///
/// Query parameters for GET /api/threads/search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ThreadSearch {
    /// Case-insensitive text matched against title and content.
    pub keyword: String,
}

// --- Auth ---

/// register_user
///
/// [Public Route] Creates an account and returns a token for it. USER accounts are
/// verified on the spot, every other role starts pending.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = accounts::register(state.repo.as_ref(), &state.credentials, payload).await?;
    Ok(Json(response))
}

/// login
///
/// [Public Route] Exchanges username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = accounts::login(state.repo.as_ref(), &state.credentials, payload).await?;
    Ok(Json(response))
}

/// get_user_profile
///
/// [Public Route] Public profile of one account.
#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(accounts::get_profile(state.repo.as_ref(), &username).await?))
}

// --- Threads ---

/// create_thread
///
/// [Authenticated Route] The author is always the authenticated caller.
#[utoipa::path(
    post,
    path = "/api/threads",
    request_body = CreateThreadRequest,
    responses((status = 200, description = "Created", body = Thread))
)]
pub async fn create_thread(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateThreadRequest>,
) -> Result<Json<Thread>, AppError> {
    Ok(Json(threads::create_thread(state.repo.as_ref(), &user, payload).await?))
}

/// get_threads
///
/// [Public Route] All threads, newest first.
#[utoipa::path(
    get,
    path = "/api/threads",
    responses((status = 200, description = "Threads", body = [Thread]))
)]
pub async fn get_threads(State(state): State<AppState>) -> Result<Json<Vec<Thread>>, AppError> {
    Ok(Json(threads::list_threads(state.repo.as_ref()).await?))
}

/// get_thread
///
/// [Public Route] A single thread by ID.
#[utoipa::path(
    get,
    path = "/api/threads/{id}",
    params(("id" = i64, Path, description = "Thread ID")),
    responses(
        (status = 200, description = "Found", body = Thread),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_thread(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Thread>, AppError> {
    Ok(Json(threads::get_thread(state.repo.as_ref(), id).await?))
}

/// search_threads
///
/// [Public Route] Threads whose title or content contains the keyword.
#[utoipa::path(
    get,
    path = "/api/threads/search",
    params(ThreadSearch),
    responses((status = 200, description = "Matches", body = [Thread]))
)]
pub async fn search_threads(
    State(state): State<AppState>,
    Query(search): Query<ThreadSearch>,
) -> Result<Json<Vec<Thread>>, AppError> {
    Ok(Json(threads::search_threads(state.repo.as_ref(), &search.keyword).await?))
}

/// update_thread
///
/// [Authenticated Route] Owner-only edit. Non-owners get 403 whatever their role.
#[utoipa::path(
    put,
    path = "/api/threads/{id}",
    params(("id" = i64, Path, description = "Thread ID")),
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Updated", body = Thread),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_thread(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateThreadRequest>,
) -> Result<Json<Thread>, AppError> {
    Ok(Json(threads::update_thread(state.repo.as_ref(), &user, id, payload).await?))
}

/// delete_thread
///
/// [Authenticated Route] Owner-only delete.
#[utoipa::path(
    delete,
    path = "/api/threads/{id}",
    params(("id" = i64, Path, description = "Thread ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_thread(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    threads::delete_thread(state.repo.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Messages ---

/// post_message
///
/// [Authenticated Route] Reply to a thread. DEV role only.
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Posted", body = Message),
        (status = 403, description = "Not a DEV account"),
        (status = 404, description = "Thread Not Found")
    )
)]
pub async fn post_message(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMessageRequest>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(messages::post_message(state.repo.as_ref(), &user, payload).await?))
}

/// get_thread_messages
///
/// [Public Route] Replies of a thread, oldest first.
#[utoipa::path(
    get,
    path = "/api/messages/thread/{thread_id}",
    params(("thread_id" = i64, Path, description = "Thread ID")),
    responses((status = 200, description = "Messages", body = [Message]))
)]
pub async fn get_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<i64>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(messages::list_messages(state.repo.as_ref(), thread_id).await?))
}

/// update_message
///
/// [Authenticated Route] Sender-only content edit.
#[utoipa::path(
    put,
    path = "/api/messages/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "Updated", body = Message),
        (status = 403, description = "Not Sender"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMessageRequest>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(messages::update_message(state.repo.as_ref(), &user, id, payload).await?))
}

/// delete_message
///
/// [Authenticated Route] Sender-only delete; the message's votes go with it.
#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not Sender"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    messages::delete_message(state.repo.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Votes ---

/// submit_vote
///
/// [Authenticated Route] Cast, switch or retract a vote on a message.
#[utoipa::path(
    post,
    path = "/api/votes",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote applied", body = VoteResponse),
        (status = 404, description = "Message Not Found"),
        (status = 409, description = "Concurrent vote conflict")
    )
)]
pub async fn submit_vote(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    Ok(Json(votes::submit_vote(state.repo.as_ref(), &user, payload).await?))
}

/// get_vote_counts
///
/// [Public Route] Current tally for a message.
#[utoipa::path(
    get,
    path = "/api/votes/message/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Counts", body = VoteCounts),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_vote_counts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VoteCounts>, AppError> {
    Ok(Json(votes::get_vote_counts(state.repo.as_ref(), id).await?))
}

// --- Admin ---

/// get_pending_users
///
/// [Admin Route] Verification queue. SUPERADMIN sees every pending account, ADMIN only DEV ones.
#[utoipa::path(
    get,
    path = "/api/admin/pending-users",
    responses(
        (status = 200, description = "Pending users", body = [UserResponse]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_pending_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    Ok(Json(admin::list_pending_users(state.repo.as_ref(), &user).await?))
}

/// verify_user
///
/// [Admin Route] Activates an account within the caller's tier.
#[utoipa::path(
    post,
    path = "/api/admin/verify-user/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Verified (or already verified)", body = VerificationResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn verify_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VerificationResponse>, AppError> {
    Ok(Json(admin::verify_user(state.repo.as_ref(), &user, id).await?))
}

/// get_all_users
///
/// [Admin Route] Every account. SUPERADMIN only.
#[utoipa::path(
    get,
    path = "/api/admin/all-users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_all_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    Ok(Json(admin::list_all_users(state.repo.as_ref(), &user).await?))
}
