mod common;

use async_trait::async_trait;
use axum::{
    Json,
    body::to_bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::{seed_actor, seed_message, seed_thread, test_state};
use devchat_forum::{
    AppConfig, AppError, AppResult, AppState, InMemoryRepository, Repository,
    handlers::{self, ThreadSearch},
    models::{
        CreateThreadRequest, Message, NewUser, Role, Thread, UpdateThreadRequest, User, Vote,
        VoteCounts, VoteOutcome, VoteRequest, VoteType,
    },
    voting::AppliedVote,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// --- Conflict-injecting repository ---

/// Delegates to the in-memory store but fails the first `conflicts` vote applications
/// with `Conflict`, as a racing insert on the uniqueness constraint would.
struct RacingVoteRepo {
    inner: InMemoryRepository,
    conflicts: AtomicUsize,
    apply_calls: AtomicUsize,
}

impl RacingVoteRepo {
    fn new(conflicts: usize) -> Self {
        Self {
            inner: InMemoryRepository::new(),
            conflicts: AtomicUsize::new(conflicts),
            apply_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Repository for RacingVoteRepo {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        self.inner.create_user(user).await
    }
    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        self.inner.get_user(id).await
    }
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.inner.get_user_by_username(username).await
    }
    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.inner.list_users().await
    }
    async fn list_pending_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        self.inner.list_pending_users(role).await
    }
    async fn mark_verified(&self, id: i64) -> AppResult<Option<User>> {
        self.inner.mark_verified(id).await
    }
    async fn create_thread(&self, author_id: i64, title: String, content: String) -> AppResult<Thread> {
        self.inner.create_thread(author_id, title, content).await
    }
    async fn get_thread(&self, id: i64) -> AppResult<Option<Thread>> {
        self.inner.get_thread(id).await
    }
    async fn list_threads(&self) -> AppResult<Vec<Thread>> {
        self.inner.list_threads().await
    }
    async fn search_threads(&self, keyword: &str) -> AppResult<Vec<Thread>> {
        self.inner.search_threads(keyword).await
    }
    async fn update_thread(&self, id: i64, changes: UpdateThreadRequest) -> AppResult<Option<Thread>> {
        self.inner.update_thread(id, changes).await
    }
    async fn delete_thread(&self, id: i64) -> AppResult<bool> {
        self.inner.delete_thread(id).await
    }
    async fn create_message(&self, sender_id: i64, thread_id: i64, content: String) -> AppResult<Message> {
        self.inner.create_message(sender_id, thread_id, content).await
    }
    async fn get_message(&self, id: i64) -> AppResult<Option<Message>> {
        self.inner.get_message(id).await
    }
    async fn list_messages_by_thread(&self, thread_id: i64) -> AppResult<Vec<Message>> {
        self.inner.list_messages_by_thread(thread_id).await
    }
    async fn update_message(&self, id: i64, content: String) -> AppResult<Option<Message>> {
        self.inner.update_message(id, content).await
    }
    async fn delete_message(&self, id: i64) -> AppResult<bool> {
        self.inner.delete_message(id).await
    }
    async fn find_vote(&self, voter_id: i64, message_id: i64) -> AppResult<Option<Vote>> {
        self.inner.find_vote(voter_id, message_id).await
    }
    async fn count_votes(&self, message_id: i64) -> AppResult<VoteCounts> {
        self.inner.count_votes(message_id).await
    }
    async fn apply_vote(&self, voter_id: i64, message_id: i64, requested: VoteType) -> AppResult<AppliedVote> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        let pending = self.conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.conflicts.store(pending - 1, Ordering::SeqCst);
            return Err(AppError::Conflict("duplicate key value violates unique constraint".to_string()));
        }
        self.inner.apply_vote(voter_id, message_id, requested).await
    }
}

fn racing_state(conflicts: usize) -> (AppState, Arc<RacingVoteRepo>) {
    let repo = Arc::new(RacingVoteRepo::new(conflicts));
    let state = AppState::new(repo.clone(), AppConfig::default());
    (state, repo)
}

// --- Error mapping ---

#[tokio::test]
async fn test_error_kinds_map_to_status_codes() {
    let cases = [
        (AppError::not_found("Thread", 1), StatusCode::NOT_FOUND),
        (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
        (AppError::Validation("blank".into()), StatusCode::BAD_REQUEST),
        (AppError::Unauthorized("who".into()), StatusCode::UNAUTHORIZED),
        (AppError::Internal("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, expected) in cases {
        assert_eq!(err.status(), expected);
        assert_eq!(err.into_response().status(), expected);
    }
}

#[tokio::test]
async fn test_error_body_is_json_and_hides_internal_detail() {
    let response = AppError::Internal("connection refused on 10.0.0.3".into()).into_response();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let message = json["error"].as_str().expect("error field");
    assert!(!message.contains("10.0.0.3"));

    let response = AppError::not_found("Message", 9).into_response();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Message not found with ID 9");
}

// --- Handlers called directly ---

#[tokio::test]
async fn test_create_thread_handler_uses_authenticated_author() {
    let state = test_state();
    let alice = seed_actor(state.repo.as_ref(), "alice", Role::User).await;

    let Json(thread) = handlers::create_thread(
        alice.clone(),
        State(state.clone()),
        Json(CreateThreadRequest {
            title: "Lifetimes".to_string(),
            content: "why 'a?".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(thread.author, "alice");
    let Json(fetched) = handlers::get_thread(State(state), Path(thread.id)).await.unwrap();
    assert_eq!(fetched.title, "Lifetimes");
}

#[tokio::test]
async fn test_delete_thread_handler_returns_no_content() {
    let state = test_state();
    let alice = seed_actor(state.repo.as_ref(), "alice", Role::User).await;
    let thread = seed_thread(state.repo.as_ref(), &alice, "bye").await;

    let status = handlers::delete_thread(alice, State(state.clone()), Path(thread.id)).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = handlers::get_thread(State(state), Path(thread.id)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_handler_rejects_blank_keyword() {
    let state = test_state();
    let err = handlers::search_threads(
        State(state),
        Query(ThreadSearch {
            keyword: String::new(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_handlers_enforce_tier() {
    let state = test_state();
    let dev = seed_actor(state.repo.as_ref(), "dev", Role::Dev).await;
    let admin = seed_actor(state.repo.as_ref(), "admin", Role::Admin).await;

    let err = handlers::get_pending_users(dev, State(state.clone())).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let err = handlers::get_all_users(admin.clone(), State(state.clone())).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let Json(pending) = handlers::get_pending_users(admin, State(state)).await.unwrap();
    assert!(pending.is_empty());
}

// --- Vote conflict retry ---

#[tokio::test]
async fn test_vote_conflict_is_retried_once() {
    let (state, repo) = racing_state(1);
    let alice = seed_actor(state.repo.as_ref(), "alice", Role::Dev).await;
    let thread = seed_thread(state.repo.as_ref(), &alice, "t").await;
    let message = seed_message(state.repo.as_ref(), &alice, thread.id, "m").await;

    let Json(response) = handlers::submit_vote(
        alice,
        State(state),
        Json(VoteRequest {
            message_id: message.id,
            vote_type: VoteType::Upvote,
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.outcome, VoteOutcome::Added);
    assert_eq!(response.vote_counts, VoteCounts { upvotes: 1, downvotes: 0 });
    assert_eq!(repo.apply_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_vote_conflict_surfaces_after_second_failure() {
    let (state, repo) = racing_state(2);
    let alice = seed_actor(state.repo.as_ref(), "alice", Role::Dev).await;
    let thread = seed_thread(state.repo.as_ref(), &alice, "t").await;
    let message = seed_message(state.repo.as_ref(), &alice, thread.id, "m").await;

    let err = handlers::submit_vote(
        alice,
        State(state.clone()),
        Json(VoteRequest {
            message_id: message.id,
            vote_type: VoteType::Upvote,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert_eq!(repo.apply_calls.load(Ordering::SeqCst), 2);
    let Json(counts) = handlers::get_vote_counts(State(state), Path(message.id)).await.unwrap();
    assert_eq!(counts, VoteCounts::default());
}
