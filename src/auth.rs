use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;

use crate::{
    cache::IdentityCache,
    config::AppConfig,
    credential::SessionCredential,
    guard::{AccessGuard, GuardState},
    identity::IdentityState,
    models::Role,
    navigation::RedirectSlot,
};

/// RequestIdentity Extractor Result
///
/// The request-scoped identity cache. The first extractor in a request builds it from the
/// incoming credential and stores it in the request extensions; the guard middleware and
/// every handler or fragment rendered for the same request reuse it, so one request issues
/// at most one identity query.
#[derive(Clone)]
pub struct RequestIdentity(pub IdentityCache);

/// RequestIdentity Extractor Implementation
///
/// Never rejects: a missing or bad credential simply probes as anonymous.
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
    // Provides the identity service to probe.
    IdentityState: FromRef<S>,
    // Provides the session cookie name.
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cache) = parts.extensions.get::<IdentityCache>() {
            return Ok(RequestIdentity(cache.clone()));
        }

        let config = AppConfig::from_ref(state);
        let service = IdentityState::from_ref(state);
        let credential = SessionCredential::from_headers(&parts.headers, &config.session_cookie);

        let cache = IdentityCache::new(service, credential);
        parts.extensions.insert(cache.clone());
        Ok(RequestIdentity(cache))
    }
}

/// require_admin
///
/// Layout guard for the admin shell. Anonymous actors are sent to login, non-admins to their
/// own area; admitted requests carry the resolved `IdentitySnapshot` in their extensions.
pub async fn require_admin(
    State(config): State<AppConfig>,
    identity: RequestIdentity,
    request: Request,
    next: Next,
) -> Response {
    enforce_role(Role::Admin, &config, identity, request, next).await
}

/// require_user
///
/// Layout guard for the user dashboard.
pub async fn require_user(
    State(config): State<AppConfig>,
    identity: RequestIdentity,
    request: Request,
    next: Next,
) -> Response {
    enforce_role(Role::User, &config, identity, request, next).await
}

async fn enforce_role(
    required: Role,
    config: &AppConfig,
    RequestIdentity(cache): RequestIdentity,
    mut request: Request,
    next: Next,
) -> Response {
    let guard = AccessGuard::new(required, config.redirect_policy());
    let mut holder = cache.mount("layout-guard");
    let redirect = RedirectSlot::default();

    match guard.enter(&mut holder, &redirect).await {
        GuardState::Admitted => {
            if let Some(snapshot) = holder.phase().snapshot() {
                request.extensions_mut().insert(snapshot.clone());
            }
            next.run(request).await
        }
        GuardState::Loading => {
            tracing::error!(path = %request.uri().path(), "guard finished without a resolved identity");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        GuardState::DeniedUnauthenticated | GuardState::DeniedWrongRole(_) => match redirect.take()
        {
            // A role-less actor's home is the area it was just denied.
            Some(navigation) if navigation.to == request.uri().path() => {
                StatusCode::FORBIDDEN.into_response()
            }
            Some(navigation) => navigation.into_response(),
            None => StatusCode::FORBIDDEN.into_response(),
        },
    }
}
