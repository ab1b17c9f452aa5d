use portal_access::{
    AccessGuard, AuthPhase, GuardDecision, GuardMachine, GuardState, IdentityCache,
    IdentitySnapshot, MockIdentityService, RedirectPolicy, Role, evaluate,
    credential::SessionCredential,
    identity::IdentityState,
    navigation::{Navigation, Navigator, SessionHistory},
};
use std::sync::Arc;

fn admin_guard() -> AccessGuard {
    AccessGuard::new(Role::Admin, RedirectPolicy::default())
}

fn cache_for(mock: MockIdentityService) -> IdentityCache {
    IdentityCache::new(
        Arc::new(mock) as IdentityState,
        SessionCredential::cookie("session", "abc"),
    )
}

fn all_snapshots() -> Vec<IdentitySnapshot> {
    vec![
        IdentitySnapshot::anonymous(),
        IdentitySnapshot::authenticated("Alice", Some(Role::Admin)),
        IdentitySnapshot::authenticated("Bob", Some(Role::User)),
        IdentitySnapshot::authenticated("Eve", None),
    ]
}

// --- Pure decision ---

#[test]
fn test_loading_never_admits_or_redirects() {
    for required in [Role::Admin, Role::User] {
        assert_eq!(
            evaluate(&AuthPhase::Loading, required, &RedirectPolicy::default()),
            GuardDecision::Pending
        );
    }

    let mut machine = GuardMachine::new(Role::Admin, RedirectPolicy::default());
    for _ in 0..3 {
        assert_eq!(machine.observe(&AuthPhase::Loading), None);
        assert!(!machine.renders_protected());
        assert_eq!(machine.state(), &GuardState::Loading);
    }
}

#[test]
fn test_unauthenticated_always_goes_to_login() {
    let policy = RedirectPolicy::default();
    for required in [Role::Admin, Role::User] {
        let decision = evaluate(
            &AuthPhase::Resolved(IdentitySnapshot::anonymous()),
            required,
            &policy,
        );
        assert_eq!(decision, GuardDecision::Redirect(Navigation::replace("/login")));
    }
}

#[test]
fn test_wrong_role_goes_to_own_home_not_login() {
    let policy = RedirectPolicy::default();

    let user = AuthPhase::Resolved(IdentitySnapshot::authenticated("Bob", Some(Role::User)));
    assert_eq!(
        evaluate(&user, Role::Admin, &policy),
        GuardDecision::Redirect(Navigation::replace("/dashboard"))
    );

    let admin = AuthPhase::Resolved(IdentitySnapshot::authenticated("Alice", Some(Role::Admin)));
    assert_eq!(
        evaluate(&admin, Role::User, &policy),
        GuardDecision::Redirect(Navigation::replace("/admin"))
    );

    let roleless = AuthPhase::Resolved(IdentitySnapshot::authenticated("Eve", None));
    assert_eq!(
        evaluate(&roleless, Role::Admin, &policy),
        GuardDecision::Redirect(Navigation::replace("/dashboard"))
    );
}

#[test]
fn test_every_redirect_replaces_history() {
    let policy = RedirectPolicy::default();
    for snapshot in all_snapshots() {
        for required in [Role::Admin, Role::User] {
            if let GuardDecision::Redirect(navigation) =
                evaluate(&AuthPhase::Resolved(snapshot.clone()), required, &policy)
            {
                assert!(navigation.replace);
            }
        }
    }
}

#[test]
fn test_machine_decides_once() {
    let mut machine = GuardMachine::new(Role::Admin, RedirectPolicy::default());
    let admin = AuthPhase::Resolved(IdentitySnapshot::authenticated("Alice", Some(Role::Admin)));

    assert_eq!(machine.observe(&AuthPhase::Loading), None);
    assert_eq!(machine.observe(&admin), None);
    assert_eq!(machine.state(), &GuardState::Admitted);

    // Admitted is final: later inputs do not re-run the evaluation.
    assert_eq!(
        machine.observe(&AuthPhase::Resolved(IdentitySnapshot::anonymous())),
        None
    );
    assert!(machine.renders_protected());
}

#[test]
fn test_machine_denied_state_records_role() {
    let mut machine = GuardMachine::new(Role::Admin, RedirectPolicy::default());
    let user = AuthPhase::Resolved(IdentitySnapshot::authenticated("Bob", Some(Role::User)));

    assert_eq!(
        machine.observe(&user),
        Some(Navigation::replace("/dashboard"))
    );
    assert_eq!(machine.state(), &GuardState::DeniedWrongRole(Some(Role::User)));
    assert_eq!(machine.observe(&user), None);
}

// --- Scenarios through the guard driver ---

#[tokio::test]
async fn test_scenario_admin_is_admitted() {
    let cache = cache_for(MockIdentityService::admin("Alice"));
    let history = SessionHistory::starting_at("/admin");
    let mut holder = cache.mount("layout-guard");

    let state = admin_guard().enter(&mut holder, &history).await;

    assert_eq!(state, GuardState::Admitted);
    assert_eq!(history.entries(), vec!["/admin"]);
}

#[tokio::test]
async fn test_scenario_unauthorized_goes_to_login() {
    let cache = cache_for(MockIdentityService::unauthorized());
    let history = SessionHistory::starting_at("/");
    history.navigate(Navigation {
        to: "/admin".to_string(),
        replace: false,
    });
    let mut holder = cache.mount("layout-guard");

    let state = admin_guard().enter(&mut holder, &history).await;

    assert_eq!(state, GuardState::DeniedUnauthenticated);
    assert_eq!(history.current().as_deref(), Some("/login"));
    // The protected entry was replaced, so back does not return to it.
    assert_eq!(history.back_target().as_deref(), Some("/"));
}

#[tokio::test]
async fn test_scenario_user_on_admin_shell_goes_to_dashboard() {
    let cache = cache_for(MockIdentityService::user("Bob"));
    let history = SessionHistory::starting_at("/admin");
    let mut holder = cache.mount("layout-guard");

    let state = admin_guard().enter(&mut holder, &history).await;

    assert_eq!(state, GuardState::DeniedWrongRole(Some(Role::User)));
    assert_eq!(history.entries(), vec!["/dashboard"]);
}

#[tokio::test]
async fn test_unreachable_identity_service_is_handled_as_unauthenticated() {
    let cache = cache_for(MockIdentityService::unreachable());
    let history = SessionHistory::starting_at("/admin");
    let mut holder = cache.mount("layout-guard");

    let state = admin_guard().enter(&mut holder, &history).await;

    assert_eq!(state, GuardState::DeniedUnauthenticated);
    assert_eq!(history.entries(), vec!["/login"]);
}

#[tokio::test]
async fn test_unmounted_guard_stays_loading_without_navigation() {
    let cache = cache_for(MockIdentityService::admin("Alice").gated());
    let history = SessionHistory::starting_at("/admin");
    let mut holder = cache.mount("layout-guard");
    holder.unmount();

    let state = admin_guard().enter(&mut holder, &history).await;

    assert_eq!(state, GuardState::Loading);
    assert_eq!(history.entries(), vec!["/admin"]);
}
