use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity Schemas ---

/// Role
///
/// The server-declared role of an authenticated actor. The remote set is open; any value
/// other than these two is treated as "no role" by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Case-insensitive parse of a wire role marker. Unknown markers yield None.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IdentityPayload
///
/// Body returned by the identity query endpoint on success. Only the display name is
/// mandatory; the role marker is lenient so an unrecognized role never fails the probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityPayload {
    #[serde(alias = "displayName", alias = "username", alias = "email")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Role::parse))
}

/// IdentitySnapshot
///
/// The resolved answer to "who is the current actor". Fields are private so an anonymous
/// snapshot can never carry a name or a role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentitySnapshot {
    actor_name: Option<String>,
    role: Option<Role>,
    authenticated: bool,
}

impl IdentitySnapshot {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated actor. A blank name is stored as absent.
    pub fn authenticated(actor_name: impl Into<String>, role: Option<Role>) -> Self {
        let name = actor_name.into();
        let trimmed = name.trim();
        Self {
            actor_name: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            role,
            authenticated: true,
        }
    }

    pub fn actor_name(&self) -> Option<&str> {
        self.actor_name.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl From<IdentityPayload> for IdentitySnapshot {
    fn from(payload: IdentityPayload) -> Self {
        IdentitySnapshot::authenticated(payload.name, payload.role)
    }
}

/// AuthPhase
///
/// Lifecycle of one probe as seen by a mounted fragment. `Loading` deliberately carries no
/// snapshot, so nothing can gate on identity fields before the probe settles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Loading,
    Resolved(IdentitySnapshot),
}

impl AuthPhase {
    pub fn is_resolved(&self) -> bool {
        matches!(self, AuthPhase::Resolved(_))
    }

    pub fn snapshot(&self) -> Option<&IdentitySnapshot> {
        match self {
            AuthPhase::Loading => None,
            AuthPhase::Resolved(snapshot) => Some(snapshot),
        }
    }
}

// --- Output Schemas ---

/// SessionView
///
/// Output schema for GET /api/session. The browser bundle uses it to hydrate its own
/// identity store without probing the identity service a second time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub authenticated: bool,
    pub actor_name: Option<String>,
    pub role: Option<Role>,
    /// Where this actor lands by default (the login page when anonymous).
    pub home: String,
    #[ts(type = "string")]
    pub checked_at: DateTime<Utc>,
}
