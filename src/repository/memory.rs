use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{Message, NewUser, Role, Thread, UpdateThreadRequest, User, Vote, VoteCounts, VoteType};
use crate::voting::{self, AppliedVote, VoteTransition};

/// InMemoryRepository
///
/// A process-local implementation of `Repository`. All tables sit behind one async
/// mutex, so every trait method (including the whole vote toggle) is a single atomic
/// unit. Used for local runs without `DATABASE_URL` and throughout the test-suite.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    users: BTreeMap<i64, User>,
    threads: BTreeMap<i64, Thread>,
    messages: BTreeMap<i64, Message>,
    votes: BTreeMap<i64, Vote>,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username_of(&self, user_id: i64) -> AppResult<String> {
        self.users
            .get(&user_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| AppError::not_found("User", user_id))
    }

    fn vote_for(&self, voter_id: i64, message_id: i64) -> Option<Vote> {
        self.votes
            .values()
            .find(|vote| vote.user_id == voter_id && vote.message_id == message_id)
            .copied()
    }

    fn recount(&self, message_id: i64) -> VoteCounts {
        voting::tally(
            self.votes
                .values()
                .filter(|vote| vote.message_id == message_id)
                .map(|vote| vote.vote_type),
        )
    }

    fn remove_message(&mut self, message_id: i64) -> bool {
        let removed = self.messages.remove(&message_id).is_some();
        if removed {
            self.votes.retain(|_, vote| vote.message_id != message_id);
        }
        removed
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut threads: Vec<Thread>) -> Vec<Thread> {
    threads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    threads
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut store = self.store.lock().await;
        if store.users.values().any(|existing| existing.username == user.username) {
            return Err(AppError::Conflict(format!("username '{}' is already taken", user.username)));
        }
        let id = store.allocate_id();
        let created = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            verified: user.verified,
            created_at: Utc::now(),
        };
        store.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.store.lock().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let store = self.store.lock().await;
        Ok(store.users.values().find(|user| user.username == username).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.store.lock().await.users.values().cloned().collect())
    }

    async fn list_pending_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let store = self.store.lock().await;
        Ok(store
            .users
            .values()
            .filter(|user| !user.verified)
            .filter(|user| role.is_none_or(|wanted| user.role == wanted))
            .cloned()
            .collect())
    }

    async fn mark_verified(&self, id: i64) -> AppResult<Option<User>> {
        let mut store = self.store.lock().await;
        Ok(store.users.get_mut(&id).map(|user| {
            user.verified = true;
            user.clone()
        }))
    }

    async fn create_thread(&self, author_id: i64, title: String, content: String) -> AppResult<Thread> {
        let mut store = self.store.lock().await;
        let author = store.username_of(author_id)?;
        let id = store.allocate_id();
        let thread = Thread {
            id,
            title,
            content,
            author_id,
            author,
            created_at: Utc::now(),
        };
        store.threads.insert(id, thread.clone());
        Ok(thread)
    }

    async fn get_thread(&self, id: i64) -> AppResult<Option<Thread>> {
        Ok(self.store.lock().await.threads.get(&id).cloned())
    }

    async fn list_threads(&self) -> AppResult<Vec<Thread>> {
        let store = self.store.lock().await;
        Ok(newest_first(store.threads.values().cloned().collect()))
    }

    async fn search_threads(&self, keyword: &str) -> AppResult<Vec<Thread>> {
        let needle = keyword.to_lowercase();
        let store = self.store.lock().await;
        let hits = store
            .threads
            .values()
            .filter(|thread| {
                thread.title.to_lowercase().contains(&needle) || thread.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(newest_first(hits))
    }

    async fn update_thread(&self, id: i64, changes: UpdateThreadRequest) -> AppResult<Option<Thread>> {
        let mut store = self.store.lock().await;
        Ok(store.threads.get_mut(&id).map(|thread| {
            if let Some(title) = changes.title {
                thread.title = title;
            }
            if let Some(content) = changes.content {
                thread.content = content;
            }
            thread.clone()
        }))
    }

    async fn delete_thread(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store.lock().await;
        if store.threads.remove(&id).is_none() {
            return Ok(false);
        }
        let orphaned: Vec<i64> = store
            .messages
            .values()
            .filter(|message| message.thread_id == id)
            .map(|message| message.id)
            .collect();
        for message_id in orphaned {
            store.remove_message(message_id);
        }
        Ok(true)
    }

    async fn create_message(&self, sender_id: i64, thread_id: i64, content: String) -> AppResult<Message> {
        let mut store = self.store.lock().await;
        let sender_username = store.username_of(sender_id)?;
        if !store.threads.contains_key(&thread_id) {
            return Err(AppError::not_found("Thread", thread_id));
        }
        let id = store.allocate_id();
        let message = Message {
            id,
            content,
            sender_id,
            sender_username,
            thread_id,
            timestamp: Utc::now(),
            upvotes: 0,
            downvotes: 0,
        };
        store.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: i64) -> AppResult<Option<Message>> {
        Ok(self.store.lock().await.messages.get(&id).cloned())
    }

    async fn list_messages_by_thread(&self, thread_id: i64) -> AppResult<Vec<Message>> {
        let store = self.store.lock().await;
        // BTreeMap order on monotonic ids is creation order.
        Ok(store
            .messages
            .values()
            .filter(|message| message.thread_id == thread_id)
            .cloned()
            .collect())
    }

    async fn update_message(&self, id: i64, content: String) -> AppResult<Option<Message>> {
        let mut store = self.store.lock().await;
        Ok(store.messages.get_mut(&id).map(|message| {
            message.content = content;
            message.clone()
        }))
    }

    async fn delete_message(&self, id: i64) -> AppResult<bool> {
        Ok(self.store.lock().await.remove_message(id))
    }

    async fn find_vote(&self, voter_id: i64, message_id: i64) -> AppResult<Option<Vote>> {
        Ok(self.store.lock().await.vote_for(voter_id, message_id))
    }

    async fn count_votes(&self, message_id: i64) -> AppResult<VoteCounts> {
        Ok(self.store.lock().await.recount(message_id))
    }

    async fn apply_vote(&self, voter_id: i64, message_id: i64, requested: VoteType) -> AppResult<AppliedVote> {
        let mut store = self.store.lock().await;
        if !store.messages.contains_key(&message_id) {
            return Err(AppError::not_found("Message", message_id));
        }

        let current = store.vote_for(voter_id, message_id);
        let transition = voting::plan(current.map(|vote| vote.vote_type), requested);
        match (transition, current) {
            (VoteTransition::Insert(vote_type), _) => {
                let id = store.allocate_id();
                store.votes.insert(
                    id,
                    Vote {
                        id,
                        user_id: voter_id,
                        message_id,
                        vote_type,
                    },
                );
            }
            (VoteTransition::Switch(vote_type), Some(vote)) => {
                if let Some(stored) = store.votes.get_mut(&vote.id) {
                    stored.vote_type = vote_type;
                }
            }
            (VoteTransition::Retract, Some(vote)) => {
                store.votes.remove(&vote.id);
            }
            (VoteTransition::Switch(_) | VoteTransition::Retract, None) => {
                return Err(AppError::Internal("vote transition without an existing vote".to_string()));
            }
        }

        let counts = store.recount(message_id);
        if let Some(message) = store.messages.get_mut(&message_id) {
            message.upvotes = counts.upvotes;
            message.downvotes = counts.downvotes;
        }
        Ok(AppliedVote {
            outcome: transition.outcome(),
            counts,
        })
    }
}
