use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateMessageRequest, Message, UpdateMessageRequest},
    policy,
    repository::Repository,
};

/// post_message
///
/// Only DEV accounts may reply. Verification status is not checked, so an
/// unverified DEV can post right after registering.
pub async fn post_message(repo: &dyn Repository, actor: &AuthUser, req: CreateMessageRequest) -> AppResult<Message> {
    policy::ensure(policy::can_create_message(actor.role), "only DEV users can reply to threads")?;
    req.validate()?;

    if repo.get_thread(req.thread_id).await?.is_none() {
        return Err(AppError::not_found("Thread", req.thread_id));
    }

    let message = repo.create_message(actor.id, req.thread_id, req.content).await?;
    tracing::info!(message_id = message.id, thread_id = message.thread_id, sender = %actor.username, "message posted");
    Ok(message)
}

/// Messages of a thread, oldest first. An unknown thread simply has none.
pub async fn list_messages(repo: &dyn Repository, thread_id: i64) -> AppResult<Vec<Message>> {
    repo.list_messages_by_thread(thread_id).await
}

async fn owned_message(repo: &dyn Repository, actor: &AuthUser, id: i64) -> AppResult<Message> {
    let message = repo
        .get_message(id)
        .await?
        .ok_or_else(|| AppError::not_found("Message", id))?;
    policy::ensure(
        policy::can_mutate_owned_content(&actor.username, &message.sender_username),
        "you can only modify your own messages",
    )?;
    Ok(message)
}

/// Owner-only content edit. Counters, thread and timestamp are untouched.
pub async fn update_message(
    repo: &dyn Repository,
    actor: &AuthUser,
    id: i64,
    req: UpdateMessageRequest,
) -> AppResult<Message> {
    req.validate()?;
    owned_message(repo, actor, id).await?;
    let message = repo
        .update_message(id, req.content)
        .await?
        .ok_or_else(|| AppError::not_found("Message", id))?;
    tracing::info!(message_id = id, actor = %actor.username, "message updated");
    Ok(message)
}

/// Owner-only delete. The message's votes are removed with it, so no tally outlives it.
pub async fn delete_message(repo: &dyn Repository, actor: &AuthUser, id: i64) -> AppResult<()> {
    owned_message(repo, actor, id).await?;
    if !repo.delete_message(id).await? {
        return Err(AppError::not_found("Message", id));
    }
    tracing::info!(message_id = id, actor = %actor.username, "message deleted");
    Ok(())
}
