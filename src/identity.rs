use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::credential::SessionCredential;
use crate::models::{IdentityPayload, Role};

/// IdentityError
///
/// Everything that can go wrong talking to the identity service. Callers of the probe never
/// see these; they are collapsed to an anonymous snapshot and only logged.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No response at all (connection refused, DNS, timeout).
    #[error("identity service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("identity service rejected the request with status {0}")]
    Rejected(StatusCode),

    /// A success status whose body does not describe a recognizable identity.
    #[error("identity payload not recognized: {0}")]
    MalformedPayload(String),
}

// 1. IdentityService Contract
/// IdentityService
///
/// The abstract contract for the remote identity/session service. The real HTTP client and
/// the in-memory mock are interchangeable behind `Arc<dyn IdentityService>`.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Read-only identity query for the given credential.
    async fn fetch_identity(
        &self,
        credential: &SessionCredential,
    ) -> Result<IdentityPayload, IdentityError>;

    /// Mutating request that invalidates the session behind the given credential.
    async fn invalidate_session(&self, credential: &SessionCredential)
    -> Result<(), IdentityError>;
}

/// IdentityState
///
/// The concrete type used to share the identity service across the application state.
pub type IdentityState = Arc<dyn IdentityService>;

// 2. The Real Implementation
/// HttpIdentityService
///
/// Talks to the identity service over HTTP with `reqwest`. The credential is attached to
/// every call; no cookie store is kept on the client so nothing is cached between calls.
#[derive(Clone)]
pub struct HttpIdentityService {
    client: reqwest::Client,
    session_url: String,
    logout_url: String,
}

impl HttpIdentityService {
    pub fn new(config: &AppConfig) -> Result<Self, IdentityError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.identity_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            session_url: config.session_endpoint(),
            logout_url: config.logout_endpoint(),
        })
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn fetch_identity(
        &self,
        credential: &SessionCredential,
    ) -> Result<IdentityPayload, IdentityError> {
        let response = credential
            .apply(self.client.get(&self.session_url))
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Rejected(status));
        }

        response
            .json::<IdentityPayload>()
            .await
            .map_err(|e| IdentityError::MalformedPayload(e.to_string()))
    }

    async fn invalidate_session(
        &self,
        credential: &SessionCredential,
    ) -> Result<(), IdentityError> {
        let response = credential
            .apply(self.client.post(&self.logout_url))
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Rejected(status));
        }
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockOutcome
///
/// What the mock identity service answers to an identity query.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Identity(IdentityPayload),
    Status(StatusCode),
    TransportFailure,
}

impl MockOutcome {
    pub fn identity(name: &str, role: Option<Role>) -> Self {
        MockOutcome::Identity(IdentityPayload {
            name: name.to_string(),
            role,
        })
    }
}

/// MockIdentityService
///
/// In-memory stand-in for the identity service. Records every call and the credentials it
/// saw, and can hold identity queries until the test releases them so late responses can be
/// simulated deterministically.
pub struct MockIdentityService {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    invalidation_fails: bool,
    gate: Option<Semaphore>,
    invalidation_gate: Option<Semaphore>,
    probe_calls: AtomicUsize,
    invalidate_calls: AtomicUsize,
    seen_credentials: Mutex<Vec<SessionCredential>>,
}

impl MockIdentityService {
    /// Answers every identity query with `outcome`.
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: outcome,
            invalidation_fails: false,
            gate: None,
            invalidation_gate: None,
            probe_calls: AtomicUsize::new(0),
            invalidate_calls: AtomicUsize::new(0),
            seen_credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn admin(name: &str) -> Self {
        Self::new(MockOutcome::identity(name, Some(Role::Admin)))
    }

    pub fn user(name: &str) -> Self {
        Self::new(MockOutcome::identity(name, Some(Role::User)))
    }

    pub fn unauthorized() -> Self {
        Self::new(MockOutcome::Status(StatusCode::UNAUTHORIZED))
    }

    pub fn unreachable() -> Self {
        Self::new(MockOutcome::TransportFailure)
    }

    /// Queue outcomes consumed in order before falling back to the default one.
    pub fn with_sequence(self, outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        if let Ok(mut queue) = self.outcomes.lock() {
            queue.extend(outcomes);
        }
        self
    }

    /// Invalidation requests fail with a transport error.
    pub fn with_failing_invalidation(mut self) -> Self {
        self.invalidation_fails = true;
        self
    }

    /// Identity queries block until `release_probes` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_probes(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Invalidation requests block until `release_invalidations` is called.
    pub fn gated_invalidation(mut self) -> Self {
        self.invalidation_gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_invalidations(&self, count: usize) {
        if let Some(gate) = &self.invalidation_gate {
            gate.add_permits(count);
        }
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn invalidate_calls(&self) -> usize {
        self.invalidate_calls.load(Ordering::SeqCst)
    }

    pub fn seen_credentials(&self) -> Vec<SessionCredential> {
        self.seen_credentials
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }

    fn record(&self, credential: &SessionCredential) {
        if let Ok(mut seen) = self.seen_credentials.lock() {
            seen.push(credential.clone());
        }
    }

    fn next_outcome(&self) -> MockOutcome {
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn fetch_identity(
        &self,
        credential: &SessionCredential,
    ) -> Result<IdentityPayload, IdentityError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.record(credential);
        let outcome = self.next_outcome();

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        match outcome {
            MockOutcome::Identity(payload) => Ok(payload),
            MockOutcome::Status(status) => Err(IdentityError::Rejected(status)),
            MockOutcome::TransportFailure => Err(IdentityError::Transport(
                "Mock Identity Error: connection refused".to_string(),
            )),
        }
    }

    async fn invalidate_session(
        &self,
        credential: &SessionCredential,
    ) -> Result<(), IdentityError> {
        self.invalidate_calls.fetch_add(1, Ordering::SeqCst);
        self.record(credential);

        if let Some(gate) = &self.invalidation_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.invalidation_fails {
            return Err(IdentityError::Transport(
                "Mock Identity Error: connection reset".to_string(),
            ));
        }
        Ok(())
    }
}
