use std::{env, time::Duration};

use crate::guard::RedirectPolicy;

/// AppConfig
///
/// Holds the gateway's entire configuration state. Immutable once loaded and shared
/// with handlers through FromRef, the same way the identity service is.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and fail-fast requirements.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the remote identity/session service.
    pub identity_url: String,
    // Path of the identity query endpoint, appended to `identity_url`.
    pub session_path: String,
    // Path of the session invalidation endpoint, appended to `identity_url`.
    pub logout_path: String,
    // Name of the browser cookie carrying the session credential.
    pub session_cookie: String,
    // Optional upper bound for identity calls. None keeps the transport default.
    pub identity_timeout: Option<Duration>,
    // Anonymous entry point.
    pub login_path: String,
    // Default area for ADMIN actors.
    pub admin_home: String,
    // Default area for USER actors and role-less actors.
    pub user_home: String,
}

/// Env
///
/// Defines the runtime context: pretty logs and local fallbacks, or JSON logs and
/// mandatory infrastructure settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests and local scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            identity_url: "http://localhost:8080".to_string(),
            session_path: "/auth/session".to_string(),
            logout_path: "/auth/logout".to_string(),
            session_cookie: "session".to_string(),
            identity_timeout: None,
            login_path: "/login".to_string(),
            admin_home: "/admin".to_string(),
            user_home: "/dashboard".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `IDENTITY_URL` is missing, or in any environment when
    /// `IDENTITY_TIMEOUT_SECS` is set to something other than a positive integer.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let defaults = Self::default();

        // The identity service is the only authority on who is logged in, so production
        // refuses to start without an explicit address.
        let identity_url = match env {
            Env::Production => {
                env::var("IDENTITY_URL").expect("FATAL: IDENTITY_URL must be set in production.")
            }
            Env::Local => env::var("IDENTITY_URL").unwrap_or(defaults.identity_url),
        };

        let identity_timeout = env::var("IDENTITY_TIMEOUT_SECS").ok().map(|raw| {
            let secs: u64 = raw
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .expect("FATAL: IDENTITY_TIMEOUT_SECS must be a positive integer.");
            Duration::from_secs(secs)
        });

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            identity_url: identity_url.trim_end_matches('/').to_string(),
            session_path: env::var("IDENTITY_SESSION_PATH").unwrap_or(defaults.session_path),
            logout_path: env::var("IDENTITY_LOGOUT_PATH").unwrap_or(defaults.logout_path),
            session_cookie: env::var("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            identity_timeout,
            login_path: env::var("LOGIN_PATH").unwrap_or(defaults.login_path),
            admin_home: env::var("ADMIN_HOME").unwrap_or(defaults.admin_home),
            user_home: env::var("USER_HOME").unwrap_or(defaults.user_home),
        }
    }

    /// Destinations used by the access guard and the logout flow.
    pub fn redirect_policy(&self) -> RedirectPolicy {
        RedirectPolicy {
            login: self.login_path.clone(),
            admin_home: self.admin_home.clone(),
            user_home: self.user_home.clone(),
        }
    }

    /// Full URL of the identity query endpoint.
    pub fn session_endpoint(&self) -> String {
        format!("{}{}", self.identity_url, self.session_path)
    }

    /// Full URL of the session invalidation endpoint.
    pub fn logout_endpoint(&self) -> String {
        format!("{}{}", self.identity_url, self.logout_path)
    }
}
