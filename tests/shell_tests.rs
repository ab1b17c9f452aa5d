use portal_access::{
    AuthPhase, IdentityCache, IdentitySnapshot, MockIdentityService, RedirectPolicy, Role,
    credential::SessionCredential,
    identity::{IdentityState, MockOutcome},
    navigation::SessionHistory,
    shell::{DEFAULT_ACTOR_LABEL, FragmentKind, FragmentView, ShellFragment},
};
use std::sync::Arc;

fn cache_for(mock: &Arc<MockIdentityService>) -> IdentityCache {
    IdentityCache::new(
        Arc::clone(mock) as IdentityState,
        SessionCredential::cookie("session", "abc"),
    )
}

#[test]
fn test_view_follows_phase() {
    assert_eq!(
        FragmentView::from_phase(&AuthPhase::Loading),
        FragmentView::Skeleton
    );
    assert_eq!(
        FragmentView::from_phase(&AuthPhase::Resolved(IdentitySnapshot::authenticated(
            "Alice",
            Some(Role::Admin)
        ))),
        FragmentView::Ready {
            display_name: "Alice".to_string()
        }
    );
    assert_eq!(
        FragmentView::from_phase(&AuthPhase::Resolved(IdentitySnapshot::anonymous())),
        FragmentView::Ready {
            display_name: DEFAULT_ACTOR_LABEL.to_string()
        }
    );
}

#[tokio::test]
async fn test_fragments_show_skeleton_until_resolved() {
    let mock = Arc::new(MockIdentityService::admin("Alice").gated());
    let cache = cache_for(&mock);
    let mut navbar = ShellFragment::navbar(&cache);
    let mut sidebar = ShellFragment::sidebar(&cache);

    assert_eq!(navbar.view(), FragmentView::Skeleton);
    assert_eq!(sidebar.view(), FragmentView::Skeleton);
    assert!(navbar.render().contains("aria-busy"));
    assert!(!navbar.render().contains(DEFAULT_ACTOR_LABEL));

    mock.release_probes(1);
    let navbar_html = navbar.settle().await;
    let sidebar_html = sidebar.settle().await;

    assert!(navbar_html.contains("Alice"));
    assert!(sidebar_html.contains("Alice"));
    assert!(navbar_html.contains(r#"action="/logout""#));
    assert_eq!(mock.probe_calls(), 1);
}

#[tokio::test]
async fn test_missing_name_falls_back_to_label() {
    // Authenticated admin whose name cannot be shown, modelled with a name that trims away.
    let snapshot = IdentitySnapshot::authenticated("  ", Some(Role::Admin));
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.actor_name(), None);

    let view = FragmentView::from_phase(&AuthPhase::Resolved(snapshot));
    assert_eq!(
        view,
        FragmentView::Ready {
            display_name: DEFAULT_ACTOR_LABEL.to_string()
        }
    );
}

#[tokio::test]
async fn test_fragment_logout_trigger() {
    let mock = Arc::new(MockIdentityService::admin("Alice"));
    let cache = cache_for(&mock);
    let mut navbar = ShellFragment::navbar(&cache);
    let mut sidebar = ShellFragment::sidebar(&cache);
    navbar.settle().await;
    sidebar.settle().await;

    let history = SessionHistory::starting_at("/admin");
    navbar.logout(&RedirectPolicy::default(), &history).await;

    assert_eq!(history.entries(), vec!["/login"]);
    // Every fragment on the cache sees the reset.
    assert_eq!(sidebar.view(), FragmentView::Ready {
        display_name: DEFAULT_ACTOR_LABEL.to_string()
    });
    assert_eq!(mock.invalidate_calls(), 1);
}

#[tokio::test]
async fn test_fragments_on_separate_caches_may_disagree_until_resolved() {
    let slow = Arc::new(MockIdentityService::admin("Alice").gated());
    let fast = Arc::new(MockIdentityService::new(MockOutcome::identity(
        "Alice",
        Some(Role::Admin),
    )));
    let mut navbar = ShellFragment::mount(FragmentKind::Navbar, &cache_for(&slow));
    let mut sidebar = ShellFragment::mount(FragmentKind::Sidebar, &cache_for(&fast));

    sidebar.settle().await;
    assert_eq!(navbar.view(), FragmentView::Skeleton);
    assert_ne!(sidebar.view(), FragmentView::Skeleton);

    slow.release_probes(1);
    navbar.settle().await;
    assert_eq!(navbar.view(), sidebar.view());
    assert_eq!(navbar.kind(), FragmentKind::Navbar);
}
