use crate::error::{AppError, AppResult};
use crate::models::{Message, NewUser, Role, Thread, UpdateThreadRequest, User, Vote, VoteCounts, VoteType};
use crate::voting::{self, AppliedVote, VoteTransition};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

pub mod memory;

pub use memory::InMemoryRepository;

/// Repository Trait
///
/// The persistence contract the forum core is written against. Handlers and services
/// only ever see `Arc<dyn Repository>`, so the Postgres store and the in-memory store
/// are interchangeable.
///
/// Every method is all-or-nothing: an `Err` means nothing was written.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Fails with Conflict when the username is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    // Unverified users, optionally restricted to one role.
    async fn list_pending_users(&self, role: Option<Role>) -> AppResult<Vec<User>>;
    // Flips `verified` to true and returns the updated row.
    async fn mark_verified(&self, id: i64) -> AppResult<Option<User>>;

    // --- Threads ---
    async fn create_thread(&self, author_id: i64, title: String, content: String) -> AppResult<Thread>;
    async fn get_thread(&self, id: i64) -> AppResult<Option<Thread>>;
    // Newest first.
    async fn list_threads(&self) -> AppResult<Vec<Thread>>;
    // Case-insensitive match on title or content.
    async fn search_threads(&self, keyword: &str) -> AppResult<Vec<Thread>>;
    // Partial update: `None` fields keep their value.
    async fn update_thread(&self, id: i64, changes: UpdateThreadRequest) -> AppResult<Option<Thread>>;
    // Cascades to the thread's messages and their votes.
    async fn delete_thread(&self, id: i64) -> AppResult<bool>;

    // --- Messages ---
    async fn create_message(&self, sender_id: i64, thread_id: i64, content: String) -> AppResult<Message>;
    async fn get_message(&self, id: i64) -> AppResult<Option<Message>>;
    // Oldest first.
    async fn list_messages_by_thread(&self, thread_id: i64) -> AppResult<Vec<Message>>;
    async fn update_message(&self, id: i64, content: String) -> AppResult<Option<Message>>;
    // Cascades to the message's votes.
    async fn delete_message(&self, id: i64) -> AppResult<bool>;

    // --- Votes ---
    async fn find_vote(&self, voter_id: i64, message_id: i64) -> AppResult<Option<Vote>>;
    // Authoritative count straight from the vote rows.
    async fn count_votes(&self, message_id: i64) -> AppResult<VoteCounts>;

    /// apply_vote
    ///
    /// Runs the whole toggle as one atomic unit: read the current vote for
    /// `(voter_id, message_id)`, execute the transition chosen by `voting::plan`,
    /// recount both vote types and write the tally onto the message.
    /// Fails with NotFound when the message is gone and with Conflict when a racing
    /// insert hit the `(voter, message)` uniqueness constraint.
    async fn apply_vote(&self, voter_id: i64, message_id: i64, requested: VoteType) -> AppResult<AppliedVote>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL. The schema
/// lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Counts votes by type for one message inside an open transaction.
async fn recount(tx: &mut Transaction<'_, Postgres>, message_id: i64) -> AppResult<VoteCounts> {
    let (upvotes, downvotes): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE vote_type = 'UPVOTE') AS upvotes,
            COUNT(*) FILTER (WHERE vote_type = 'DOWNVOTE') AS downvotes
        FROM votes
        WHERE message_id = $1
        "#,
    )
    .bind(message_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(VoteCounts { upvotes, downvotes })
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role, verified)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, role, verified, created_at
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(user.verified)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, role, verified, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, role, verified, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, role, verified, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// list_pending_users
    ///
    /// `role = None` returns every unverified account (SUPERADMIN view); `Some(role)`
    /// narrows the queue (ADMIN view). Served by the partial index on `verified = false`.
    async fn list_pending_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, verified, created_at
            FROM users
            WHERE verified = false AND ($1::user_role IS NULL OR role = $1)
            ORDER BY id
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn mark_verified(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET verified = true
            WHERE id = $1
            RETURNING id, username, email, password_hash, role, verified, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // --- THREADS ---

    /// create_thread
    ///
    /// Inserts and joins the author's username in one round trip (CTE).
    async fn create_thread(&self, author_id: i64, title: String, content: String) -> AppResult<Thread> {
        let thread = sqlx::query_as::<_, Thread>(
            r#"
            WITH inserted AS (
                INSERT INTO threads (title, content, author_id) VALUES ($1, $2, $3)
                RETURNING id, title, content, author_id, created_at
            )
            SELECT i.id, i.title, i.content, i.author_id, u.username AS author, i.created_at
            FROM inserted i JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(thread)
    }

    async fn get_thread(&self, id: i64) -> AppResult<Option<Thread>> {
        let thread = sqlx::query_as::<_, Thread>(
            r#"
            SELECT t.id, t.title, t.content, t.author_id, u.username AS author, t.created_at
            FROM threads t JOIN users u ON t.author_id = u.id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(thread)
    }

    async fn list_threads(&self) -> AppResult<Vec<Thread>> {
        let threads = sqlx::query_as::<_, Thread>(
            r#"
            SELECT t.id, t.title, t.content, t.author_id, u.username AS author, t.created_at
            FROM threads t JOIN users u ON t.author_id = u.id
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(threads)
    }

    async fn search_threads(&self, keyword: &str) -> AppResult<Vec<Thread>> {
        let pattern = format!("%{}%", keyword);
        let threads = sqlx::query_as::<_, Thread>(
            r#"
            SELECT t.id, t.title, t.content, t.author_id, u.username AS author, t.created_at
            FROM threads t JOIN users u ON t.author_id = u.id
            WHERE t.title ILIKE $1 OR t.content ILIKE $1
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(threads)
    }

    /// update_thread
    ///
    /// `COALESCE` keeps the stored column whenever the matching field is `None`.
    async fn update_thread(&self, id: i64, changes: UpdateThreadRequest) -> AppResult<Option<Thread>> {
        let thread = sqlx::query_as::<_, Thread>(
            r#"
            WITH updated AS (
                UPDATE threads
                SET title = COALESCE($2, title),
                    content = COALESCE($3, content)
                WHERE id = $1
                RETURNING id, title, content, author_id, created_at
            )
            SELECT d.id, d.title, d.content, d.author_id, u.username AS author, d.created_at
            FROM updated d JOIN users u ON d.author_id = u.id
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(thread)
    }

    async fn delete_thread(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM threads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- MESSAGES ---

    async fn create_message(&self, sender_id: i64, thread_id: i64, content: String) -> AppResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            WITH inserted AS (
                INSERT INTO messages (content, sender_id, thread_id) VALUES ($1, $2, $3)
                RETURNING id, content, sender_id, thread_id, sent_at, upvotes, downvotes
            )
            SELECT i.id, i.content, i.sender_id, u.username AS sender_username, i.thread_id,
                   i.sent_at AS "timestamp", i.upvotes, i.downvotes
            FROM inserted i JOIN users u ON i.sender_id = u.id
            "#,
        )
        .bind(content)
        .bind(sender_id)
        .bind(thread_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn get_message(&self, id: i64) -> AppResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.content, m.sender_id, u.username AS sender_username, m.thread_id,
                   m.sent_at AS "timestamp", m.upvotes, m.downvotes
            FROM messages m JOIN users u ON m.sender_id = u.id
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list_messages_by_thread(&self, thread_id: i64) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.content, m.sender_id, u.username AS sender_username, m.thread_id,
                   m.sent_at AS "timestamp", m.upvotes, m.downvotes
            FROM messages m JOIN users u ON m.sender_id = u.id
            WHERE m.thread_id = $1
            ORDER BY m.sent_at ASC, m.id ASC
            "#,
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn update_message(&self, id: i64, content: String) -> AppResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            WITH updated AS (
                UPDATE messages SET content = $2 WHERE id = $1
                RETURNING id, content, sender_id, thread_id, sent_at, upvotes, downvotes
            )
            SELECT d.id, d.content, d.sender_id, u.username AS sender_username, d.thread_id,
                   d.sent_at AS "timestamp", d.upvotes, d.downvotes
            FROM updated d JOIN users u ON d.sender_id = u.id
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn delete_message(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- VOTES ---

    async fn find_vote(&self, voter_id: i64, message_id: i64) -> AppResult<Option<Vote>> {
        let vote = sqlx::query_as::<_, Vote>(
            "SELECT id, user_id, message_id, vote_type FROM votes WHERE user_id = $1 AND message_id = $2",
        )
        .bind(voter_id)
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vote)
    }

    async fn count_votes(&self, message_id: i64) -> AppResult<VoteCounts> {
        let mut tx = self.pool.begin().await?;
        let counts = recount(&mut tx, message_id).await?;
        tx.commit().await?;
        Ok(counts)
    }

    /// apply_vote
    ///
    /// The message row is locked with `FOR UPDATE` first, so transitions on one message
    /// are serialized while other messages proceed in parallel. The unique constraint on
    /// `(user_id, message_id)` stays as the last line of defence and surfaces as Conflict.
    async fn apply_vote(&self, voter_id: i64, message_id: i64, requested: VoteType) -> AppResult<AppliedVote> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM messages WHERE id = $1 FOR UPDATE")
            .bind(message_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(AppError::not_found("Message", message_id));
        }

        let current = sqlx::query_as::<_, Vote>(
            "SELECT id, user_id, message_id, vote_type FROM votes WHERE user_id = $1 AND message_id = $2",
        )
        .bind(voter_id)
        .bind(message_id)
        .fetch_optional(&mut *tx)
        .await?;

        let transition = voting::plan(current.map(|vote| vote.vote_type), requested);
        match (transition, current) {
            (VoteTransition::Insert(vote_type), _) => {
                sqlx::query("INSERT INTO votes (user_id, message_id, vote_type) VALUES ($1, $2, $3)")
                    .bind(voter_id)
                    .bind(message_id)
                    .bind(vote_type)
                    .execute(&mut *tx)
                    .await?;
            }
            (VoteTransition::Switch(vote_type), Some(vote)) => {
                sqlx::query("UPDATE votes SET vote_type = $1 WHERE id = $2")
                    .bind(vote_type)
                    .bind(vote.id)
                    .execute(&mut *tx)
                    .await?;
            }
            (VoteTransition::Retract, Some(vote)) => {
                sqlx::query("DELETE FROM votes WHERE id = $1")
                    .bind(vote.id)
                    .execute(&mut *tx)
                    .await?;
            }
            (VoteTransition::Switch(_) | VoteTransition::Retract, None) => {
                return Err(AppError::Internal("vote transition without an existing vote".to_string()));
            }
        }

        let counts = recount(&mut tx, message_id).await?;
        sqlx::query("UPDATE messages SET upvotes = $1, downvotes = $2 WHERE id = $3")
            .bind(counts.upvotes)
            .bind(counts.downvotes)
            .bind(message_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(AppliedVote {
            outcome: transition.outcome(),
            counts,
        })
    }
}
