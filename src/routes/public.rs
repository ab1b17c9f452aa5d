use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints with no guard. Logout lives here because it must succeed for an actor whose
/// session is already gone.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check; does not touch the identity service.
        .route("/health", get(|| async { "ok" }))
        // GET /login
        // Anonymous entry point. Every denial and every logout ends here.
        .route("/login", get(handlers::login_page))
        // GET /api/session
        // The caller's resolved identity as JSON. Never cached.
        .route(
            "/api/session",
            get(handlers::get_session).layer(crate::no_store()),
        )
        // POST /logout
        // Invalidates the remote session, clears the cookie, redirects to /login.
        .route("/logout", post(handlers::logout))
}
