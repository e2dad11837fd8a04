//! Layered allow/deny rule evaluation.
//!
//! A fixed priority chain combines the principal with global and
//! per-resource lists; the first matching rule wins. User rules
//! outrank role rules, and global rules outrank per-resource rules at
//! the same granularity. When nothing matches, the verdict is
//! indeterminate and the caller falls through to the crawler and
//! token checks.

use serde::{Deserialize, Serialize};

use mediagate_core::types::{AccessReason, DenyReason, Principal};
use mediagate_entity::resource::Resource;

/// Site-wide allow/deny lists from the settings store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessLists {
    /// Account ids always granted access.
    #[serde(default)]
    pub user_allow: Vec<i64>,
    /// Account ids always denied access.
    #[serde(default)]
    pub user_deny: Vec<i64>,
    /// Role names always granted access.
    #[serde(default)]
    pub role_allow: Vec<String>,
    /// Role names always denied access.
    #[serde(default)]
    pub role_deny: Vec<String>,
}

/// The rule evaluator's verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleVerdict {
    /// A rule granted access.
    Grant(AccessReason),
    /// A rule denied access.
    Deny(DenyReason),
    /// No rule matched; try crawler and token checks.
    Indeterminate,
}

/// Evaluate the priority chain for a principal against a resource.
///
/// Anonymous principals (id 0) skip every list check: absence of an id
/// must never read as membership.
pub fn evaluate(principal: &Principal, resource: &Resource, global: &AccessLists) -> RuleVerdict {
    if principal.is_anonymous() {
        return RuleVerdict::Indeterminate;
    }

    if global.user_allow.contains(&principal.id) {
        return RuleVerdict::Grant(AccessReason::GlobalUserAllow);
    }
    if global.user_deny.contains(&principal.id) {
        return RuleVerdict::Deny(DenyReason::GlobalUserDeny);
    }
    if resource.user_allow_list.contains(&principal.id) {
        return RuleVerdict::Grant(AccessReason::ResourceUserAllow);
    }
    if resource.user_deny_list.contains(&principal.id) {
        return RuleVerdict::Deny(DenyReason::ResourceUserDeny);
    }
    if principal.has_any_role(&global.role_allow) {
        return RuleVerdict::Grant(AccessReason::GlobalRoleAllow);
    }
    if principal.has_any_role(&global.role_deny) {
        return RuleVerdict::Deny(DenyReason::GlobalRoleDeny);
    }
    if principal.has_any_role(&resource.role_allow_list) {
        return RuleVerdict::Grant(AccessReason::ResourceRoleAllow);
    }
    if principal.has_any_role(&resource.role_deny_list) {
        return RuleVerdict::Deny(DenyReason::ResourceRoleDeny);
    }

    RuleVerdict::Indeterminate
}
