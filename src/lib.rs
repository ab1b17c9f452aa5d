use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, header},
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access-control core.
pub mod cache;
pub mod credential;
pub mod guard;
pub mod holder;
pub mod identity;
pub mod logout;
pub mod models;
pub mod navigation;
pub mod probe;
pub mod shell;

// HTTP surface.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use cache::IdentityCache;
pub use config::AppConfig;
pub use guard::{
    AccessGuard, GuardDecision, GuardMachine, GuardState, RedirectPolicy, can_access, evaluate,
};
pub use holder::AuthStateHolder;
pub use identity::{HttpIdentityService, IdentityService, IdentityState, MockIdentityService};
pub use logout::LogoutInvoker;
pub use models::{AuthPhase, IdentitySnapshot, Role};
pub use probe::probe;

/// ApiDoc
///
/// OpenAPI document for the gateway, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::logout, handlers::dashboard,
        handlers::admin_shell, handlers::navbar_fragment, handlers::sidebar_fragment
    ),
    components(schemas(models::SessionView, models::Role)),
    tags(
        (name = "portal-access", description = "Session and role-gated access for the investor portal")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable application state: the identity service every request probes and the
/// loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Identity Layer: remote identity/session service (HTTP in production, mock in tests).
    pub identity: IdentityState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, attaches each route group's guard and the global
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // USER area.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_user,
                ))
                .layer(no_store()),
        )
        // ADMIN shell.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_admin,
                ))
                .layer(no_store()),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// no_store
///
/// Marks per-actor responses as uncacheable, so a page or identity view served before logout
/// cannot be replayed from the browser cache afterwards.
pub(crate) fn no_store() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    )
}

/// trace_span_logger
///
/// Span for every request, correlated by `x-request-id`. Cookies and authorization headers
/// are never recorded.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
