use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The back-office shell. Wrapped in `require_admin` by `create_router`, and every response
/// is marked `no-store` so a logged-out browser cannot bring the shell back from its cache.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Full shell: navbar, sidebar and the overview content.
        .route("/admin", get(handlers::admin_shell))
        // GET /admin/fragments/navbar
        // Navbar alone, for clients that mount fragments independently.
        .route("/admin/fragments/navbar", get(handlers::navbar_fragment))
        // GET /admin/fragments/sidebar
        .route("/admin/fragments/sidebar", get(handlers::sidebar_fragment))
}
