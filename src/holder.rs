use tokio::sync::watch;
use uuid::Uuid;

use crate::cache::IdentityCache;
use crate::models::{AuthPhase, IdentitySnapshot};

/// AuthStateHolder
///
/// One fragment's view of the identity cache, alive from mount to unmount. It starts in
/// `Loading` and follows the cache's publications. Once unmounted it is detached from the
/// channel: later publications never reach it and waiting on it yields nothing.
pub struct AuthStateHolder {
    id: Uuid,
    fragment: &'static str,
    cache: IdentityCache,
    receiver: Option<watch::Receiver<AuthPhase>>,
    last_seen: AuthPhase,
}

impl AuthStateHolder {
    pub fn mount(cache: &IdentityCache, fragment: &'static str) -> Self {
        let receiver = cache.subscribe();
        cache.ensure_probe();
        let id = Uuid::new_v4();
        tracing::trace!(%id, fragment, "fragment mounted");
        let last_seen = receiver.borrow().clone();
        Self {
            id,
            fragment,
            cache: cache.clone(),
            last_seen,
            receiver: Some(receiver),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn fragment(&self) -> &'static str {
        self.fragment
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    pub fn is_mounted(&self) -> bool {
        self.receiver.is_some()
    }

    /// Latest phase. An unmounted holder keeps the phase it had when it was unmounted.
    pub fn phase(&self) -> AuthPhase {
        match &self.receiver {
            Some(receiver) => receiver.borrow().clone(),
            None => self.last_seen.clone(),
        }
    }

    /// Waits until the probe settles. None when the holder is unmounted.
    pub async fn resolved(&mut self) -> Option<IdentitySnapshot> {
        let receiver = self.receiver.as_mut()?;
        let snapshot = match receiver.wait_for(AuthPhase::is_resolved).await {
            Ok(phase) => phase.snapshot().cloned(),
            Err(_) => None,
        }?;
        self.last_seen = AuthPhase::Resolved(snapshot.clone());
        Some(snapshot)
    }

    /// Waits for the next publication after the last one observed. None when unmounted.
    pub async fn changed(&mut self) -> Option<AuthPhase> {
        let receiver = self.receiver.as_mut()?;
        receiver.changed().await.ok()?;
        let phase = receiver.borrow_and_update().clone();
        self.last_seen = phase.clone();
        Some(phase)
    }

    /// Detaches from the cache. The shared probe keeps running for other fragments.
    pub fn unmount(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            self.last_seen = receiver.borrow().clone();
            tracing::trace!(id = %self.id, fragment = self.fragment, "fragment unmounted");
        }
    }
}

impl Drop for AuthStateHolder {
    fn drop(&mut self) {
        self.unmount();
    }
}
