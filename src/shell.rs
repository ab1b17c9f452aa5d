use crate::cache::IdentityCache;
use crate::guard::RedirectPolicy;
use crate::holder::AuthStateHolder;
use crate::logout::LogoutInvoker;
use crate::models::AuthPhase;
use crate::navigation::{Navigation, Navigator};

/// Label shown when the actor's name is missing.
pub const DEFAULT_ACTOR_LABEL: &str = "Administrator";

/// Form action of the logout trigger.
pub const LOGOUT_ACTION: &str = "/logout";

/// FragmentView
///
/// What an identity-aware fragment shows. While loading it renders a fixed-size skeleton
/// instead of a default name, so the name never flickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentView {
    Skeleton,
    Ready { display_name: String },
}

impl FragmentView {
    pub fn from_phase(phase: &AuthPhase) -> Self {
        match phase.snapshot() {
            None => FragmentView::Skeleton,
            Some(snapshot) => FragmentView::Ready {
                display_name: snapshot
                    .actor_name()
                    .unwrap_or(DEFAULT_ACTOR_LABEL)
                    .to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Navbar,
    Sidebar,
}

impl FragmentKind {
    fn name(&self) -> &'static str {
        match self {
            FragmentKind::Navbar => "navbar",
            FragmentKind::Sidebar => "sidebar",
        }
    }
}

/// ShellFragment
///
/// A navbar or sidebar of the admin shell. Each one mounts its own holder; mounted on the
/// same cache they share one probe.
pub struct ShellFragment {
    kind: FragmentKind,
    holder: AuthStateHolder,
}

impl ShellFragment {
    pub fn mount(kind: FragmentKind, cache: &IdentityCache) -> Self {
        Self {
            kind,
            holder: cache.mount(kind.name()),
        }
    }

    pub fn navbar(cache: &IdentityCache) -> Self {
        Self::mount(FragmentKind::Navbar, cache)
    }

    pub fn sidebar(cache: &IdentityCache) -> Self {
        Self::mount(FragmentKind::Sidebar, cache)
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn view(&self) -> FragmentView {
        FragmentView::from_phase(&self.holder.phase())
    }

    pub fn render(&self) -> String {
        render_fragment(self.kind, &self.view())
    }

    /// Waits for the probe and renders the resolved view. An unmounted fragment renders
    /// whatever it had when it was unmounted.
    pub async fn settle(&mut self) -> String {
        self.holder.resolved().await;
        self.render()
    }

    /// The fragment's logout trigger.
    pub async fn logout(&self, policy: &RedirectPolicy, navigator: &dyn Navigator) -> Navigation {
        LogoutInvoker::new(self.holder.cache().clone(), policy)
            .logout(navigator)
            .await
    }

    pub fn unmount(&mut self) {
        self.holder.unmount();
    }
}

fn logout_form() -> String {
    format!(
        r#"<form method="post" action="{LOGOUT_ACTION}" class="logout"><button type="submit">Log out</button></form>"#
    )
}

/// Markup of a fragment for the given view.
pub fn render_fragment(kind: FragmentKind, view: &FragmentView) -> String {
    let identity = match view {
        FragmentView::Skeleton => {
            r#"<span class="actor-name skeleton" aria-busy="true"></span>"#.to_string()
        }
        FragmentView::Ready { display_name } => {
            format!(r#"<span class="actor-name">{}</span>"#, html_escape(display_name))
        }
    };

    match kind {
        FragmentKind::Navbar => format!(
            r#"<nav class="admin-navbar"><a class="brand" href="/admin">Back Office</a>{identity}{}</nav>"#,
            logout_form()
        ),
        FragmentKind::Sidebar => format!(
            r#"<aside class="admin-sidebar"><div class="actor">{identity}</div><ul><li><a href="/admin">Overview</a></li><li><a href="/admin/posts">Posts</a></li><li><a href="/admin/investors">Investors</a></li></ul>{}</aside>"#,
            logout_form()
        ),
    }
}

/// Full admin shell page around the two fragments.
pub fn render_admin_page(navbar: &str, sidebar: &str) -> String {
    format!(
        r#"<!doctype html><html><head><title>Back Office</title></head><body class="admin-shell">{navbar}<div class="admin-layout">{sidebar}<main id="admin-content"><h1>Overview</h1></main></div></body></html>"#
    )
}

/// Anonymous entry point.
pub fn render_login_page() -> String {
    r#"<!doctype html><html><head><title>Sign in</title></head><body class="login"><main><h1>Sign in</h1><p>Your session has ended or you are not signed in.</p></main></body></html>"#.to_string()
}

/// Default area of USER actors.
pub fn render_dashboard_page(display_name: &str) -> String {
    format!(
        r#"<!doctype html><html><head><title>Dashboard</title></head><body class="dashboard"><main><h1>Welcome, {}</h1>{}</main></body></html>"#,
        html_escape(display_name),
        logout_form()
    )
}

/// Escape HTML entities
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
