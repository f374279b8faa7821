//! PIN verification and the per-business role grants kept in a session.

use chrono::{DateTime, Duration, Utc};
use ring::constant_time;
use serde::{Deserialize, Serialize};

use crate::models::Client;

/// What a verified PIN lets the holder do for one business
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    /// How long a grant for this role stays valid
    pub fn lifetime(self) -> Duration {
        match self {
            Role::Admin => Duration::hours(24),
            Role::Staff => Duration::hours(12),
        }
    }

    /// Where the holder lands after logging in
    pub fn home_path(self, slug: &str) -> String {
        match self {
            Role::Admin => format!("/client/{}", slug),
            Role::Staff => format!("/pos/{}", slug),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role for one business, stored in the session under `auth_<slug>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Grant {
    pub fn issue(role: Role, now: DateTime<Utc>) -> Self {
        Self {
            role,
            expires_at: now + role.lifetime(),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether this grant opens an area that requires `required`.
    /// Admins may use the staff area as well.
    pub fn permits(&self, required: Role) -> bool {
        match required {
            Role::Admin => self.role == Role::Admin,
            Role::Staff => true,
        }
    }
}

/// Session key holding the grant for one business
pub fn grant_key(slug: &str) -> String {
    format!("auth_{}", slug)
}

/// Checks a submitted PIN against a client's admin PIN, then its staff PIN.
/// The comparison is exact: surrounding whitespace is not stripped.
pub fn verify_pin(client: &Client, submitted: &str) -> Option<Role> {
    if submitted.is_empty() {
        return None;
    }

    if pin_matches(&client.admin_pin, submitted) {
        Some(Role::Admin)
    } else if pin_matches(&client.staff_pin, submitted) {
        Some(Role::Staff)
    } else {
        None
    }
}

fn pin_matches(stored: &str, submitted: &str) -> bool {
    !stored.is_empty()
        && constant_time::verify_slices_are_equal(stored.as_bytes(), submitted.as_bytes()).is_ok()
}
