//! The resolved identity for a request.

use serde::{Deserialize, Serialize};

/// Identity resolved for the current request.
///
/// Produced per-request by the session authenticator and never
/// persisted. Id `0` means anonymous; anonymous principals carry no
/// roles and never match any allow or deny list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Numeric account id, `0` for anonymous.
    pub id: i64,
    /// Role names resolved from the identity store.
    pub roles: Vec<String>,
}

impl Principal {
    /// The anonymous principal.
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            roles: Vec::new(),
        }
    }

    /// Whether this principal is anonymous.
    pub fn is_anonymous(&self) -> bool {
        self.id == 0
    }

    /// Whether any of this principal's roles appears in `roles`.
    pub fn has_any_role(&self, roles: &[String]) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}
