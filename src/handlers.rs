use crate::{
    auth::RequestIdentity,
    config::AppConfig,
    logout::LogoutInvoker,
    models::{IdentitySnapshot, SessionView},
    navigation::RedirectSlot,
    shell::{self, ShellFragment},
};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Response},
};

// --- Handlers ---

/// get_session
///
/// [Public Route] Resolves the caller's identity and reports it. Never fails: a rejected
/// or unreachable identity service yields an anonymous view whose `home` is the login page.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current actor", body = SessionView))
)]
pub async fn get_session(
    State(config): State<AppConfig>,
    RequestIdentity(cache): RequestIdentity,
) -> Json<SessionView> {
    let snapshot = cache.resolve().await;
    let policy = config.redirect_policy();
    Json(SessionView {
        authenticated: snapshot.is_authenticated(),
        actor_name: snapshot.actor_name().map(str::to_string),
        role: snapshot.role(),
        home: policy.landing_for(&snapshot).to_string(),
        checked_at: chrono::Utc::now(),
    })
}

/// logout
///
/// [Public Route] Invalidates the remote session, then always clears the session cookie and
/// redirects to the login page, even when invalidation fails or the session was already gone.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Logged out; redirect to the login page"))
)]
pub async fn logout(
    State(config): State<AppConfig>,
    RequestIdentity(cache): RequestIdentity,
) -> Response {
    let redirect = RedirectSlot::default();
    let navigation = LogoutInvoker::new(cache, &config.redirect_policy())
        .logout(&redirect)
        .await;

    let expired = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        config.session_cookie
    );
    let mut response = redirect.take().unwrap_or(navigation).into_response();
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// login_page
///
/// [Public Route] The anonymous entry point every denial and logout lands on.
pub async fn login_page() -> Html<String> {
    Html(shell::render_login_page())
}

/// dashboard
///
/// [User Route] Default area for USER actors. Only reached through `require_user`.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "User dashboard"),
        (status = 303, description = "Not signed in, or not a USER")
    )
)]
pub async fn dashboard(Extension(snapshot): Extension<IdentitySnapshot>) -> Html<String> {
    let name = snapshot.actor_name().unwrap_or("there");
    Html(shell::render_dashboard_page(name))
}

/// admin_shell
///
/// [Admin Route] The protected back-office shell. The navbar and sidebar mount on the
/// request's identity cache, which the guard has already resolved.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin shell"),
        (status = 303, description = "Not signed in, or not an ADMIN")
    )
)]
pub async fn admin_shell(RequestIdentity(cache): RequestIdentity) -> Html<String> {
    let mut navbar = ShellFragment::navbar(&cache);
    let mut sidebar = ShellFragment::sidebar(&cache);
    let navbar_html = navbar.settle().await;
    let sidebar_html = sidebar.settle().await;
    Html(shell::render_admin_page(&navbar_html, &sidebar_html))
}

/// navbar_fragment
///
/// [Admin Route] The navbar on its own, for clients that load fragments independently.
#[utoipa::path(
    get,
    path = "/admin/fragments/navbar",
    responses((status = 200, description = "Navbar markup"))
)]
pub async fn navbar_fragment(RequestIdentity(cache): RequestIdentity) -> Html<String> {
    Html(ShellFragment::navbar(&cache).settle().await)
}

/// sidebar_fragment
///
/// [Admin Route] The sidebar on its own.
#[utoipa::path(
    get,
    path = "/admin/fragments/sidebar",
    responses((status = 200, description = "Sidebar markup"))
)]
pub async fn sidebar_fragment(RequestIdentity(cache): RequestIdentity) -> Html<String> {
    Html(ShellFragment::sidebar(&cache).settle().await)
}
