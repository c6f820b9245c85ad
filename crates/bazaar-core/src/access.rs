//! # Access Control
//!
//! Decides whether an already authenticated caller may act. Authentication
//! itself happens in the API layer; nothing here inspects credentials.
//!
//! ```text
//! authorize(caller, required_roles, resource_owner)
//!      │
//!      ├── required_roles given and caller.role ∉ roles ──► Forbidden
//!      │
//!      ├── resource_owner given, caller not admin,
//!      │   caller.user_id != owner ─────────────────────► Forbidden
//!      │
//!      └── otherwise ─────────────────────────────────────► Ok
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// Identity of the requester, produced by the identity verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    /// Display name carried in the credential; informational only.
    pub name: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role, name: impl Into<String>) -> Self {
        Caller {
            user_id: user_id.into(),
            role,
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Role and ownership gate.
///
/// ## Example
/// ```rust
/// use bazaar_core::{authorize, Caller, Role};
///
/// let shopper = Caller::new("u-1", Role::Customer, "Sam");
/// assert!(authorize(&shopper, None, Some("u-1")).is_ok());
/// assert!(authorize(&shopper, None, Some("u-2")).is_err());
/// assert!(authorize(&shopper, Some(&[Role::Admin]), None).is_err());
/// ```
pub fn authorize(
    caller: &Caller,
    required_roles: Option<&[Role]>,
    resource_owner: Option<&str>,
) -> CoreResult<()> {
    if let Some(roles) = required_roles {
        if !roles.contains(&caller.role) {
            return Err(CoreError::Forbidden(format!(
                "role {} may not perform this action",
                caller.role
            )));
        }
    }

    if let Some(owner) = resource_owner {
        if !caller.is_admin() && caller.user_id != owner {
            return Err(CoreError::Forbidden(
                "resource belongs to another user".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_passes_role_and_ownership() {
        let admin = Caller::new("a-1", Role::Admin, "Ada");
        assert!(authorize(&admin, Some(&[Role::Admin]), Some("someone-else")).is_ok());
    }

    #[test]
    fn test_customer_blocked_by_role() {
        let customer = Caller::new("u-1", Role::Customer, "Sam");
        assert!(matches!(
            authorize(&customer, Some(&[Role::Admin]), None),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_check() {
        let customer = Caller::new("u-1", Role::Customer, "Sam");
        assert!(authorize(&customer, None, Some("u-1")).is_ok());
        assert!(matches!(
            authorize(&customer, None, Some("u-2")),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_no_constraints_allows_anyone() {
        let customer = Caller::new("u-1", Role::Customer, "Sam");
        assert!(authorize(&customer, None, None).is_ok());
    }
}
