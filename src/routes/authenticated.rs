use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// The USER area. Wrapped in `require_user` by `create_router`: anonymous actors are sent to
/// /login and ADMIN actors to their own area.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard
        // Default area for USER actors and for authenticated actors without a role claim.
        .route("/dashboard", get(handlers::dashboard))
}
