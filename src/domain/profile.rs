//! Identities and the profile records mirrored from the platform's user store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle for an authenticated end user, issued by the external
/// authentication service. `None` in a stream means signed out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Account role stored on the profile document.
///
/// Closed set plus an explicit catch-all so role-gated logic can never be fed
/// an arbitrary string by accident; unrecognized wire values land in
/// [`Role::Unknown`] with the original string preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Customer,
    Staff,
    Admin,
    Unknown(String),
}

impl Role {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "customer" => Self::Customer,
            "staff" => Self::Staff,
            "admin" => Self::Admin,
            _ => Self::Unknown(name.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
            Self::Unknown(name) => name,
        }
    }

    /// Staff and admin accounts get the station-facing dashboards.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.name().to_string()
    }
}

/// Read-only mirror of one user's profile document. The document store owns
/// the record; this copy is replaced wholesale on every change notification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ProfileRecord {
    /// Fallback profile substituted when the user's document is missing or
    /// unreadable: a plain customer carrying whatever the identity knows.
    pub fn default_for(identity: &Identity) -> Self {
        Self {
            role: Role::Customer,
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            ..Self::default()
        }
    }
}

/// The externally observable auth-and-profile tuple, republished on every
/// transition of the sync state machine.
///
/// `loading` is true only in the window between an identity transition and
/// the first resolved (or defaulted) profile for that identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncState {
    pub identity: Option<Identity>,
    pub profile: Option<ProfileRecord>,
    pub loading: bool,
}

impl SyncState {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn role(&self) -> Option<&Role> {
        self.profile.as_ref().map(|profile| &profile.role)
    }
}
