use std::env;

/// Fallback signing secret for local runs only.
pub const LOCAL_JWT_SECRET: &str = "devchat-local-jwt-secret-change-me";
pub const DEFAULT_JWT_TTL_SECS: u64 = 86_400;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` (local only) selects the in-memory store.
    pub db_url: Option<String>,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls the dev bypass and log format.
    pub env: Env,
    // HS256 secret used to sign and validate bearer tokens.
    pub jwt_secret: String,
    // Token lifetime in seconds.
    pub jwt_ttl_secs: u64,
    // Optional seed account created at startup.
    pub superadmin: Option<SuperadminSeed>,
}

/// Credentials for the bootstrap SUPERADMIN account.
#[derive(Clone, Debug, PartialEq)]
pub struct SuperadminSeed {
    pub email: String,
    pub password: String,
}

/// Env
///
/// Runtime context: developer conveniences in `Local`, hardened behaviour in `Production`.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup. No database: the in-memory store is used.
    fn default() -> Self {
        Self {
            db_url: None,
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_ttl_secs: DEFAULT_JWT_TTL_SECS,
            superadmin: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `JWT_SECRET` is missing, and in any
    /// environment when `JWT_TTL_SECS` is not a number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        let jwt_ttl_secs = env::var("JWT_TTL_SECS")
            .map(|raw| raw.parse().expect("FATAL: JWT_TTL_SECS must be a number of seconds"))
            .unwrap_or(DEFAULT_JWT_TTL_SECS);

        let superadmin = match (env::var("SUPERADMIN_EMAIL"), env::var("SUPERADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(SuperadminSeed { email, password }),
            _ => None,
        };

        Self {
            db_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            env,
            jwt_secret,
            jwt_ttl_secs,
            superadmin,
        }
    }
}
