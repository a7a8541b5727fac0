use crate::{
    config::SuperadminSeed,
    credentials::Credentials,
    error::{AppError, AppResult},
    models::{AuthResponse, LoginRequest, NewUser, RegisterUserRequest, Role, User, UserResponse},
    repository::Repository,
};

pub const SUPERADMIN_USERNAME: &str = "superadmin";

/// register
///
/// Creates an account and logs it in. USER accounts are verified immediately; DEV,
/// ADMIN and SUPERADMIN accounts start unverified and wait for an authorized verifier.
pub async fn register(
    repo: &dyn Repository,
    credentials: &Credentials,
    req: RegisterUserRequest,
) -> AppResult<AuthResponse> {
    req.validate()?;
    let role = req.role.unwrap_or_default();
    let password_hash = credentials.hash_password(&req.password)?;

    let user = repo
        .create_user(NewUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
            role,
            verified: role.verified_on_registration(),
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!("username '{}' is already taken", req.username.trim())),
            other => other,
        })?;

    tracing::info!(user_id = user.id, username = %user.username, role = ?user.role, verified = user.verified, "user registered");

    let token = credentials.issue_token(&user.username)?;
    Ok(AuthResponse {
        message: Some("User registered successfully".to_string()),
        token,
        username: user.username,
        role: user.role,
        verified: user.verified,
    })
}

/// login
///
/// Unknown usernames and wrong passwords fail identically.
pub async fn login(repo: &dyn Repository, credentials: &Credentials, req: LoginRequest) -> AppResult<AuthResponse> {
    let invalid = || AppError::Unauthorized("invalid username or password".to_string());

    let user = repo.get_user_by_username(&req.username).await?.ok_or_else(invalid)?;
    if !credentials.verify_password(&req.password, &user.password_hash) {
        tracing::warn!(username = %req.username, "failed login attempt");
        return Err(invalid());
    }

    let token = credentials.issue_token(&user.username)?;
    Ok(AuthResponse {
        message: None,
        token,
        username: user.username,
        role: user.role,
        verified: user.verified,
    })
}

/// Public profile lookup by username.
pub async fn get_profile(repo: &dyn Repository, username: &str) -> AppResult<UserResponse> {
    repo.get_user_by_username(username)
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| AppError::not_found("User", username))
}

/// ensure_superadmin
///
/// Startup seed: creates the verified `superadmin` account when it does not exist yet.
/// Returns the account either way.
pub async fn ensure_superadmin(
    repo: &dyn Repository,
    credentials: &Credentials,
    seed: &SuperadminSeed,
) -> AppResult<User> {
    if let Some(existing) = repo.get_user_by_username(SUPERADMIN_USERNAME).await? {
        return Ok(existing);
    }
    let user = repo
        .create_user(NewUser {
            username: SUPERADMIN_USERNAME.to_string(),
            email: seed.email.clone(),
            password_hash: credentials.hash_password(&seed.password)?,
            role: Role::Superadmin,
            verified: true,
        })
        .await?;
    tracing::info!(user_id = user.id, "superadmin account created");
    Ok(user)
}
