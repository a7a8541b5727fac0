use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{VoteCounts, VoteRequest, VoteResponse},
    repository::Repository,
    voting::AppliedVote,
};

/// submit_vote
///
/// Toggles the caller's vote on a message:
///
/// | current   | same type requested | other type requested |
/// |-----------|---------------------|----------------------|
/// | none      | insert              | insert               |
/// | voted(T)  | delete              | switch in place      |
///
/// Any authenticated account may vote, whatever its role or verification status.
/// A Conflict from a racing insert on the same `(voter, message)` is retried once;
/// the retry re-reads the now-existing vote and takes the update path.
pub async fn submit_vote(repo: &dyn Repository, actor: &AuthUser, req: VoteRequest) -> AppResult<VoteResponse> {
    let voter = repo
        .get_user_by_username(&actor.username)
        .await?
        .ok_or_else(|| AppError::not_found("User", &actor.username))?;

    if repo.get_message(req.message_id).await?.is_none() {
        return Err(AppError::not_found("Message", req.message_id));
    }

    let applied = match repo.apply_vote(voter.id, req.message_id, req.vote_type).await {
        Err(AppError::Conflict(reason)) => {
            tracing::warn!(voter_id = voter.id, message_id = req.message_id, %reason, "vote insert raced, retrying");
            repo.apply_vote(voter.id, req.message_id, req.vote_type).await?
        }
        other => other?,
    };

    let AppliedVote { outcome, counts } = applied;
    tracing::info!(
        voter = %actor.username,
        message_id = req.message_id,
        vote_type = ?req.vote_type,
        outcome = ?outcome,
        upvotes = counts.upvotes,
        downvotes = counts.downvotes,
        "vote applied"
    );

    Ok(VoteResponse {
        message: outcome.message().to_string(),
        outcome,
        vote_counts: counts,
    })
}

/// Read-only tally for a message, counted from the vote rows.
pub async fn get_vote_counts(repo: &dyn Repository, message_id: i64) -> AppResult<VoteCounts> {
    if repo.get_message(message_id).await?.is_none() {
        return Err(AppError::not_found("Message", message_id));
    }
    repo.count_votes(message_id).await
}
