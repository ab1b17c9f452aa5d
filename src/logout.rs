use crate::cache::IdentityCache;
use crate::guard::RedirectPolicy;
use crate::navigation::{Navigation, Navigator};

/// LogoutInvoker
///
/// Ends the session. The remote invalidation is attempted, but local logout never depends
/// on it: once the request settles, whatever its outcome, the cache is reset to anonymous
/// and the actor is sent to the anonymous entry point. An unreachable identity service can
/// therefore never keep the actor inside a logged-in shell.
#[derive(Clone)]
pub struct LogoutInvoker {
    cache: IdentityCache,
    login: String,
}

impl LogoutInvoker {
    pub fn new(cache: IdentityCache, policy: &RedirectPolicy) -> Self {
        Self {
            cache,
            login: policy.login.clone(),
        }
    }

    /// Idempotent: repeated calls end in the same anonymous state and the same navigation.
    pub async fn logout(&self, navigator: &dyn Navigator) -> Navigation {
        self.cache.begin_logout();

        match self
            .cache
            .service()
            .invalidate_session(self.cache.credential())
            .await
        {
            Ok(()) => tracing::info!("session invalidated"),
            Err(e) => tracing::warn!(error = %e, "session invalidation failed; logging out locally"),
        }

        self.cache.reset_anonymous();
        let navigation = Navigation::replace(&self.login);
        navigator.navigate(navigation.clone());
        navigation
    }
}
