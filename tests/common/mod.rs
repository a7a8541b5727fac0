#![allow(dead_code)]

use devchat_forum::{
    AppConfig, AppState, InMemoryRepository, Repository, RepositoryState,
    auth::AuthUser,
    models::{Message, NewUser, Role, Thread, User},
};
use std::sync::Arc;

// --- Shared Test Fixtures ---

/// Fresh in-memory store shared as the application would share it.
pub fn memory_repo() -> RepositoryState {
    Arc::new(InMemoryRepository::new())
}

/// AppState over a fresh in-memory store with default (local) config.
pub fn test_state() -> AppState {
    AppState::new(memory_repo(), AppConfig::default())
}

/// Inserts a user directly, bypassing registration (no hashing, explicit flag).
pub async fn seed_user(repo: &dyn Repository, username: &str, role: Role, verified: bool) -> User {
    repo.create_user(NewUser {
        username: username.to_string(),
        email: format!("{}@devchat.test", username),
        password_hash: "not-a-real-hash".to_string(),
        role,
        verified,
    })
    .await
    .expect("seeding user failed")
}

/// Seeds a user and returns it as the authenticated principal.
pub async fn seed_actor(repo: &dyn Repository, username: &str, role: Role) -> AuthUser {
    let user = seed_user(repo, username, role, true).await;
    AuthUser::from(&user)
}

pub async fn seed_thread(repo: &dyn Repository, author: &AuthUser, title: &str) -> Thread {
    repo.create_thread(author.id, title.to_string(), format!("body of {}", title))
        .await
        .expect("seeding thread failed")
}

pub async fn seed_message(repo: &dyn Repository, sender: &AuthUser, thread_id: i64, content: &str) -> Message {
    repo.create_message(sender.id, thread_id, content.to_string())
        .await
        .expect("seeding message failed")
}
