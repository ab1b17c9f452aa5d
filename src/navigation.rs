use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::{Mutex, PoisonError};

/// Navigation
///
/// A request to move the actor elsewhere. Everything this crate emits replaces the current
/// history entry, so the back button cannot return to a page the actor was bounced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
    pub replace: bool,
}

impl Navigation {
    pub fn replace(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            replace: true,
        }
    }
}

/// Over HTTP a replacing navigation is a 303 that the browser must not cache.
impl IntoResponse for Navigation {
    fn into_response(self) -> Response {
        let location = match HeaderValue::from_str(&self.to) {
            Ok(location) => location,
            Err(_) => {
                tracing::error!(to = %self.to, "navigation target is not a valid header value");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, location),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            ],
        )
            .into_response()
    }
}

/// Navigator
///
/// Where guards and the logout flow send their navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, navigation: Navigation);
}

/// SessionHistory
///
/// Browser-style history stack. A replacing navigation overwrites the top entry; a plain one
/// pushes a new entry.
#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: Mutex<Vec<String>>,
}

impl SessionHistory {
    pub fn starting_at(path: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![path.into()]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current(&self) -> Option<String> {
        self.entries().last().cloned()
    }

    /// The entry the back button would land on.
    pub fn back_target(&self) -> Option<String> {
        let entries = self.entries();
        entries.len().checked_sub(2).map(|i| entries[i].clone())
    }
}

impl Navigator for SessionHistory {
    fn navigate(&self, navigation: Navigation) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if navigation.replace {
            entries.pop();
        }
        entries.push(navigation.to);
    }
}

/// RedirectSlot
///
/// Navigator for the HTTP surface: keeps the last navigation so the handler can answer with
/// it as a redirect.
#[derive(Debug, Default)]
pub struct RedirectSlot {
    navigation: Mutex<Option<Navigation>>,
}

impl RedirectSlot {
    pub fn take(&self) -> Option<Navigation> {
        self.navigation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Navigator for RedirectSlot {
    fn navigate(&self, navigation: Navigation) {
        *self.navigation.lock().unwrap_or_else(PoisonError::into_inner) = Some(navigation);
    }
}
