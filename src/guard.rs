use crate::holder::AuthStateHolder;
use crate::models::{AuthPhase, IdentitySnapshot, Role};
use crate::navigation::{Navigation, Navigator};

/// RedirectPolicy
///
/// The abstract destinations of the navigation contract: the anonymous entry point and each
/// role's default area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub login: String,
    pub admin_home: String,
    pub user_home: String,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            admin_home: "/admin".to_string(),
            user_home: "/dashboard".to_string(),
        }
    }
}

impl RedirectPolicy {
    /// Default area for an authenticated actor. Role-less actors share the user area.
    pub fn home_for(&self, role: Option<Role>) -> &str {
        match role {
            Some(Role::Admin) => &self.admin_home,
            Some(Role::User) | None => &self.user_home,
        }
    }

    /// Where this snapshot lands by default: its home, or login when anonymous.
    pub fn landing_for(&self, snapshot: &IdentitySnapshot) -> &str {
        if snapshot.is_authenticated() {
            self.home_for(snapshot.role())
        } else {
            &self.login
        }
    }
}

/// Pure authorization check: authenticated and holding exactly the required role.
pub fn can_access(snapshot: &IdentitySnapshot, required: Role) -> bool {
    snapshot.is_authenticated() && snapshot.role() == Some(required)
}

/// GuardDecision
///
/// What a protected area should do for a given phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Still loading: show the loading indicator, do not navigate.
    Pending,
    Admit,
    Redirect(Navigation),
}

/// evaluate
///
/// Pure decision function. Authentication is checked before role, so an anonymous snapshot
/// always goes to login whatever else it carries.
pub fn evaluate(phase: &AuthPhase, required: Role, policy: &RedirectPolicy) -> GuardDecision {
    let Some(snapshot) = phase.snapshot() else {
        return GuardDecision::Pending;
    };
    if !snapshot.is_authenticated() {
        return GuardDecision::Redirect(Navigation::replace(&policy.login));
    }
    if !can_access(snapshot, required) {
        return GuardDecision::Redirect(Navigation::replace(policy.home_for(snapshot.role())));
    }
    GuardDecision::Admit
}

/// GuardState
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    DeniedUnauthenticated,
    /// Authenticated with a role other than the required one (None for role-less actors).
    DeniedWrongRole(Option<Role>),
    Admitted,
}

/// GuardMachine
///
/// Per-mount state machine of a protected area. It evaluates exactly once, on the first
/// resolved phase it observes; every later observation is ignored.
#[derive(Debug, Clone)]
pub struct GuardMachine {
    required: Role,
    policy: RedirectPolicy,
    state: GuardState,
}

impl GuardMachine {
    pub fn new(required: Role, policy: RedirectPolicy) -> Self {
        Self {
            required,
            policy,
            state: GuardState::Loading,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Protected content may render only once admitted.
    pub fn renders_protected(&self) -> bool {
        self.state == GuardState::Admitted
    }

    /// Feeds a phase into the machine and returns the navigation to perform, if any.
    pub fn observe(&mut self, phase: &AuthPhase) -> Option<Navigation> {
        if self.state != GuardState::Loading {
            return None;
        }
        match evaluate(phase, self.required, &self.policy) {
            GuardDecision::Pending => None,
            GuardDecision::Admit => {
                self.state = GuardState::Admitted;
                None
            }
            GuardDecision::Redirect(navigation) => {
                // evaluate only redirects resolved snapshots
                let snapshot = phase.snapshot().cloned().unwrap_or_default();
                self.state = if snapshot.is_authenticated() {
                    GuardState::DeniedWrongRole(snapshot.role())
                } else {
                    GuardState::DeniedUnauthenticated
                };
                tracing::info!(
                    required = %self.required,
                    to = %navigation.to,
                    state = ?self.state,
                    "access denied; redirecting"
                );
                Some(navigation)
            }
        }
    }
}

/// AccessGuard
///
/// Entry point of a protected area: waits for the mounted fragment's probe, decides once and
/// performs the redirect when denied.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    required: Role,
    policy: RedirectPolicy,
}

impl AccessGuard {
    pub fn new(required: Role, policy: RedirectPolicy) -> Self {
        Self { required, policy }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    /// Runs the guard for one mount. An unmounted holder stays in Loading and never
    /// navigates.
    pub async fn enter(
        &self,
        holder: &mut AuthStateHolder,
        navigator: &dyn Navigator,
    ) -> GuardState {
        let mut machine = GuardMachine::new(self.required, self.policy.clone());
        let Some(snapshot) = holder.resolved().await else {
            return GuardState::Loading;
        };
        if let Some(navigation) = machine.observe(&AuthPhase::Resolved(snapshot)) {
            navigator.navigate(navigation);
        }
        machine.state().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_for_roleless_actor_is_user_area() {
        let policy = RedirectPolicy::default();
        assert_eq!(policy.home_for(None), "/dashboard");
        assert_eq!(policy.home_for(Some(Role::Admin)), "/admin");
    }

    #[test]
    fn test_can_access_requires_exact_role() {
        let admin = IdentitySnapshot::authenticated("Alice", Some(Role::Admin));
        let roleless = IdentitySnapshot::authenticated("Eve", None);

        assert!(can_access(&admin, Role::Admin));
        assert!(!can_access(&admin, Role::User));
        assert!(!can_access(&roleless, Role::User));
        assert!(!can_access(&IdentitySnapshot::anonymous(), Role::Admin));
    }
}
