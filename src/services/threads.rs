use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateThreadRequest, Thread, UpdateThreadRequest},
    policy,
    repository::Repository,
};

/// Any authenticated user may open a thread.
pub async fn create_thread(repo: &dyn Repository, actor: &AuthUser, req: CreateThreadRequest) -> AppResult<Thread> {
    req.validate()?;
    let thread = repo.create_thread(actor.id, req.title, req.content).await?;
    tracing::info!(thread_id = thread.id, author = %actor.username, "thread created");
    Ok(thread)
}

pub async fn get_thread(repo: &dyn Repository, id: i64) -> AppResult<Thread> {
    repo.get_thread(id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", id))
}

pub async fn list_threads(repo: &dyn Repository) -> AppResult<Vec<Thread>> {
    repo.list_threads().await
}

pub async fn search_threads(repo: &dyn Repository, keyword: &str) -> AppResult<Vec<Thread>> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("keyword must not be blank".to_string()));
    }
    repo.search_threads(keyword).await
}

/// Loads a thread and checks that `actor` authored it.
async fn owned_thread(repo: &dyn Repository, actor: &AuthUser, id: i64) -> AppResult<Thread> {
    let thread = get_thread(repo, id).await?;
    policy::ensure(
        policy::can_mutate_owned_content(&actor.username, &thread.author),
        "you can only modify your own threads",
    )?;
    Ok(thread)
}

/// update_thread
///
/// Owner-only. Title and content are the only editable fields.
pub async fn update_thread(
    repo: &dyn Repository,
    actor: &AuthUser,
    id: i64,
    changes: UpdateThreadRequest,
) -> AppResult<Thread> {
    changes.validate()?;
    owned_thread(repo, actor, id).await?;
    let thread = repo
        .update_thread(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", id))?;
    tracing::info!(thread_id = id, actor = %actor.username, "thread updated");
    Ok(thread)
}

/// delete_thread
///
/// Owner-only. The thread's messages and their votes go with it.
pub async fn delete_thread(repo: &dyn Repository, actor: &AuthUser, id: i64) -> AppResult<()> {
    owned_thread(repo, actor, id).await?;
    if !repo.delete_thread(id).await? {
        return Err(AppError::not_found("Thread", id));
    }
    tracing::info!(thread_id = id, actor = %actor.username, "thread deleted");
    Ok(())
}
