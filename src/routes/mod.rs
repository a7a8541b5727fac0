/// Router Module Index
///
/// Routes are split by access level so the authentication layer is applied per module,
/// never per handler.

/// Anonymous, read-only browsing plus the login/register gateway.
pub mod public;

/// Routes wrapped in the `AuthUser` middleware.
pub mod authenticated;

/// Moderation routes. Authenticated like the above; role checks run in the services.
pub mod admin;
