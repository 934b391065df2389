//! # Admin Gate
//!
//! Checks the admin id/password pair that guards destructive inventory
//! actions (reset from BOM, direct level edits).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ⚠ PLACEHOLDER, NOT A SECURITY BOUNDARY                                 │
//! │                                                                         │
//! │  This is a plain string equality check against a configured pair.       │
//! │  It stops accidental clicks, not attackers. Production deployments     │
//! │  must put a real authentication/authorization service in front of     │
//! │  the admin actions instead.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Out-of-the-box admin id.
pub const DEFAULT_ADMIN_ID: &str = "123";
/// Out-of-the-box admin password.
pub const DEFAULT_ADMIN_PASSWORD: &str = "456";

/// Credentials supplied by the caller of an admin action.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub id: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        AdminCredentials {
            id: id.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("id", &self.id)
            .field("password", &"***")
            .finish()
    }
}

/// The configured admin pair.
#[derive(Debug, Clone)]
pub struct AdminGate {
    expected: AdminCredentials,
}

impl AdminGate {
    pub fn new(expected: AdminCredentials) -> Self {
        AdminGate { expected }
    }

    /// True while the built-in `123`/`456` pair is still configured.
    pub fn uses_default_credentials(&self) -> bool {
        self.expected.id == DEFAULT_ADMIN_ID && self.expected.password == DEFAULT_ADMIN_PASSWORD
    }

    /// Plain equality check; see the module docs.
    pub fn authorize(&self, supplied: &AdminCredentials) -> CoreResult<()> {
        if supplied.id == self.expected.id && supplied.password == self.expected.password {
            Ok(())
        } else {
            Err(CoreError::Unauthorized)
        }
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        AdminGate::new(AdminCredentials::new(
            DEFAULT_ADMIN_ID,
            DEFAULT_ADMIN_PASSWORD,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pair() {
        let gate = AdminGate::default();
        assert!(gate.uses_default_credentials());
        assert!(gate.authorize(&AdminCredentials::new("123", "456")).is_ok());
        assert!(matches!(
            gate.authorize(&AdminCredentials::new("123", "wrong")),
            Err(CoreError::Unauthorized)
        ));
    }

    #[test]
    fn test_configured_pair() {
        let gate = AdminGate::new(AdminCredentials::new("manager", "s3cret"));
        assert!(!gate.uses_default_credentials());
        assert!(gate.authorize(&AdminCredentials::new("123", "456")).is_err());
        assert!(gate.authorize(&AdminCredentials::new("manager", "s3cret")).is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = AdminCredentials::new("manager", "s3cret");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }
}
