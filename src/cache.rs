use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::credential::SessionCredential;
use crate::holder::AuthStateHolder;
use crate::identity::{IdentityService, IdentityState};
use crate::models::{AuthPhase, IdentitySnapshot};
use crate::probe::probe;

/// IdentityCache
///
/// The single source of truth for "who is logged in" within one scope: the whole process in
/// an embedded client, or one HTTP request in the server-rendered shell. Every fragment
/// mounted on the same cache reads the same phase, and at most one identity query is in
/// flight per epoch no matter how many fragments ask.
///
/// Epochs guard against late responses. A probe only publishes if the epoch it started in
/// is still current; logout and `invalidate` advance the epoch, so a response that arrives
/// after them is discarded. While a logout is pending no probe starts and nothing but the
/// logout's own reset is published.
#[derive(Clone)]
pub struct IdentityCache {
    inner: Arc<Inner>,
}

struct Inner {
    service: IdentityState,
    credential: SessionCredential,
    phase: watch::Sender<AuthPhase>,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    epoch: u64,
    in_flight: Option<u64>,
    logging_out: bool,
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, epoch: u64, snapshot: IdentitySnapshot) {
        let mut control = self.control();
        if control.in_flight == Some(epoch) {
            control.in_flight = None;
        }
        if control.logging_out || control.epoch != epoch {
            tracing::debug!(
                probe_epoch = epoch,
                current_epoch = control.epoch,
                "discarding stale probe result"
            );
            return;
        }
        self.phase.send_replace(AuthPhase::Resolved(snapshot));
    }
}

impl IdentityCache {
    pub fn new(service: IdentityState, credential: SessionCredential) -> Self {
        let (phase, _) = watch::channel(AuthPhase::Loading);
        Self {
            inner: Arc::new(Inner {
                service,
                credential,
                phase,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.inner.credential
    }

    pub fn service(&self) -> &dyn IdentityService {
        self.inner.service.as_ref()
    }

    /// Current phase without triggering a probe.
    pub fn phase(&self) -> AuthPhase {
        self.inner.phase.borrow().clone()
    }

    /// Update channel. The receiver sees every phase published from now on.
    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.inner.phase.subscribe()
    }

    /// Mounts a fragment on this cache and makes sure a probe is underway.
    pub fn mount(&self, fragment: &'static str) -> AuthStateHolder {
        AuthStateHolder::mount(self, fragment)
    }

    /// Starts a probe unless the phase is already resolved or one is in flight for the
    /// current epoch. The probe runs on its own task so a fragment that stops waiting does
    /// not cancel it for the others.
    pub fn ensure_probe(&self) {
        let epoch = {
            let mut control = self.inner.control();
            if control.logging_out
                || control.in_flight.is_some()
                || self.inner.phase.borrow().is_resolved()
            {
                return;
            }
            control.in_flight = Some(control.epoch);
            control.epoch
        };

        tracing::debug!(epoch, credential = ?self.inner.credential, "starting identity probe");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let snapshot = probe(inner.service.as_ref(), &inner.credential).await;
            inner.publish(epoch, snapshot);
        });
    }

    /// Resolves the current actor, sharing any probe already in flight.
    pub async fn resolve(&self) -> IdentitySnapshot {
        let mut receiver = self.subscribe();
        self.ensure_probe();
        let resolved = match receiver.wait_for(AuthPhase::is_resolved).await {
            Ok(phase) => phase.snapshot().cloned(),
            Err(_) => None,
        };
        resolved.unwrap_or_default()
    }

    /// Makes every probe started so far stale and holds the cache in `Loading` until
    /// `reset_anonymous`. Called before the invalidation request, so neither a response
    /// racing with logout nor a fragment mounted while it is pending can see an identity.
    pub fn begin_logout(&self) {
        let mut control = self.inner.control();
        control.epoch += 1;
        control.in_flight = None;
        control.logging_out = true;
        self.inner.phase.send_replace(AuthPhase::Loading);
    }

    pub fn is_logging_out(&self) -> bool {
        self.inner.control().logging_out
    }

    /// Synchronously forces the anonymous snapshot. Final for the current epoch: pending
    /// probes are discarded when they settle.
    pub fn reset_anonymous(&self) {
        let mut control = self.inner.control();
        control.epoch += 1;
        control.in_flight = None;
        control.logging_out = false;
        self.inner
            .phase
            .send_replace(AuthPhase::Resolved(IdentitySnapshot::anonymous()));
    }

    /// Returns to Loading so the next `resolve` or mount probes again. This is the explicit
    /// re-probe hook; nothing calls it on a timer.
    pub fn invalidate(&self) {
        let mut control = self.inner.control();
        control.epoch += 1;
        control.in_flight = None;
        self.inner.phase.send_replace(AuthPhase::Loading);
    }
}
