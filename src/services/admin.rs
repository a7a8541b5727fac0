use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Role, UserResponse, VerificationOutcome, VerificationResponse},
    policy,
    repository::Repository,
};

/// list_pending_users
///
/// SUPERADMIN sees every unverified account, ADMIN only unverified DEV accounts.
pub async fn list_pending_users(repo: &dyn Repository, actor: &AuthUser) -> AppResult<Vec<UserResponse>> {
    policy::ensure(
        policy::can_list_pending_users(actor.role),
        "only ADMIN or SUPERADMIN can view pending users",
    )?;
    let scope = match actor.role {
        Role::Superadmin => None,
        Role::Admin => Some(Role::Dev),
        Role::User | Role::Dev => {
            return Err(AppError::Forbidden("only ADMIN or SUPERADMIN can view pending users".to_string()));
        }
    };
    let users = repo.list_pending_users(scope).await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}

/// Full user directory, SUPERADMIN only.
pub async fn list_all_users(repo: &dyn Repository, actor: &AuthUser) -> AppResult<Vec<UserResponse>> {
    policy::ensure(policy::can_list_all_users(actor.role), "only SUPERADMIN can list all users")?;
    let users = repo.list_users().await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}

/// verify_user
///
/// Pending -> Verified, one way only. The target must exist (NotFound) and the actor
/// must outrank it per `policy::can_verify` (Forbidden). Verifying an account that is
/// already verified is a successful no-op reported as `AlreadyVerified`.
pub async fn verify_user(repo: &dyn Repository, actor: &AuthUser, target_id: i64) -> AppResult<VerificationResponse> {
    let target = repo
        .get_user(target_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", target_id))?;

    policy::ensure(
        policy::can_verify(actor.role, target.role),
        &format!("{:?} cannot verify a {:?} account", actor.role, target.role),
    )?;

    if target.verified {
        return Ok(VerificationResponse {
            message: "User already verified".to_string(),
            outcome: VerificationOutcome::AlreadyVerified,
            user: UserResponse::from(target),
        });
    }

    let verified = repo
        .mark_verified(target_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", target_id))?;

    tracing::info!(actor = %actor.username, target_id, target_role = ?verified.role, "user verified");

    Ok(VerificationResponse {
        message: "User verified successfully".to_string(),
        outcome: VerificationOutcome::Verified,
        user: UserResponse::from(verified),
    })
}
