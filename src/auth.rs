//! Auth records
//!
//! The storefront never verifies credentials itself. Whatever the
//! authentication service hands back is kept as an opaque record: a bearer
//! token plus the user it was issued for.

use serde::{Deserialize, Serialize};

/// Role value the admin routes require.
pub const ADMIN_ROLE: u8 = 1;

/// Signed-in user, as returned by the authentication service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Email address
    #[serde(default)]
    pub email: String,

    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Role; see [`ADMIN_ROLE`]
    #[serde(default)]
    pub role: u8,
}

impl User {
    /// Whether the user may use the admin dashboard.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Token-bearing auth record, persisted under the `auth` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    /// Signed-in user
    pub user: User,

    /// Bearer token sent with authenticated requests
    pub token: String,
}

impl AuthRecord {
    /// Create a record for `user` holding `token`.
    pub fn new(user: User, token: impl Into<String>) -> Self {
        AuthRecord {
            user,
            token: token.into(),
        }
    }
}
