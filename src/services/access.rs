//! Caller identity and the authorization predicates every service consults.
//!
//! An [`Identity`] is resolved once per request from the bearer token and then
//! passed explicitly into each service call. The predicates here are pure.

use crate::api::error::AppError;
use crate::entities::users::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<i32>,
    pub role: UserRole,
    pub authenticated: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: UserRole::User,
            authenticated: false,
        }
    }

    pub fn user(user_id: i32) -> Self {
        Self::with_role(user_id, UserRole::User)
    }

    pub fn admin(user_id: i32) -> Self {
        Self::with_role(user_id, UserRole::Admin)
    }

    pub fn with_role(user_id: i32, role: UserRole) -> Self {
        Self {
            user_id: Some(user_id),
            role,
            authenticated: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.authenticated && self.role == UserRole::Admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated && self.user_id.is_some()
    }

    pub fn current_user_id(&self) -> Option<i32> {
        if self.authenticated { self.user_id } else { None }
    }

    /// Admins may modify anything; everyone else only what they own.
    pub fn can_modify(&self, owner_id: i32) -> bool {
        self.is_admin() || self.current_user_id() == Some(owner_id)
    }

    /// The caller's user id, or `Unauthorized` for anonymous callers.
    pub fn require_user_id(&self) -> Result<i32, AppError> {
        self.current_user_id()
            .filter(|_| self.is_authenticated())
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }

    pub fn require_admin(&self, message: &str) -> Result<(), AppError> {
        self.require_user_id()?;
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }

    /// `Unauthorized` for anonymous callers, `Forbidden` when `can_modify` is false.
    pub fn require_can_modify(&self, owner_id: i32, message: &str) -> Result<(), AppError> {
        self.require_user_id()?;
        if self.can_modify(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_rights() {
        let anon = Identity::anonymous();
        assert!(!anon.is_admin());
        assert!(!anon.is_authenticated());
        assert_eq!(anon.current_user_id(), None);
        assert!(!anon.can_modify(1));
        assert!(matches!(
            anon.require_user_id(),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_owner_can_modify_own_only() {
        let user = Identity::user(7);
        assert!(user.can_modify(7));
        assert!(!user.can_modify(8));
        assert!(matches!(
            user.require_can_modify(8, "nope"),
            Err(AppError::Forbidden(_))
        ));
        assert!(user.require_can_modify(7, "nope").is_ok());
    }

    #[test]
    fn test_admin_can_modify_anything() {
        let admin = Identity::admin(1);
        assert!(admin.is_admin());
        assert!(admin.can_modify(99));
        assert!(admin.require_admin("admins only").is_ok());
        assert!(matches!(
            Identity::user(2).require_admin("admins only"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_unauthenticated_admin_role_is_ignored() {
        let forged = Identity {
            user_id: Some(3),
            role: UserRole::Admin,
            authenticated: false,
        };
        assert!(!forged.is_admin());
        assert!(!forged.can_modify(3));
    }
}
