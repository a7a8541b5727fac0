use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};

use crate::{
    config::{AppConfig, Env},
    credentials::Credentials,
    models::{Role, User},
    repository::RepositoryState,
};

/// Header accepted in `Env::Local` in place of a bearer token.
pub const DEV_BYPASS_HEADER: &str = "x-username";

/// AuthUser
///
/// The resolved principal of an authenticated request. Services receive it explicitly;
/// nothing in the core reads identity from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    /// Current role, read from the store on every request.
    pub role: Role,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Local bypass: in `Env::Local` an `x-username` header naming an existing account
///    authenticates the request.
/// 2. Otherwise a `Bearer` token is required; its signature and expiry are checked.
/// 3. The token subject is looked up in the store so deleted accounts lose access.
///
/// Rejection: `401 Unauthorized` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    Credentials: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let credentials = Credentials::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(username) = parts
                .headers
                .get(DEV_BYPASS_HEADER)
                .and_then(|value| value.to_str().ok())
            {
                if let Ok(Some(user)) = repo.get_user_by_username(username).await {
                    return Ok(AuthUser::from(&user));
                }
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = credentials.decode_token(token).map_err(|e| {
            tracing::debug!("rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        let user = repo
            .get_user_by_username(&claims.sub)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser::from(&user))
    }
}
