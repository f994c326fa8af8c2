//! # Roles
//!
//! The three tenant roles and the checks built on them.

use std::{fmt, str::FromStr};

use error::AppError;
use serde::{Deserialize, Serialize};

/// Role of a user inside their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    /// Stored and serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }

    /// Parse a role name, ignoring case.
    pub fn from_string(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "MANAGER" => Some(Role::Manager),
            "USER" => Some(Role::User),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool { matches!(self, Role::Admin) }

    /// ADMIN or MANAGER.
    pub fn can_manage(&self) -> bool { matches!(self, Role::Admin | Role::Manager) }

    /// Fail with 403 unless the role is ADMIN.
    pub fn require_admin(&self) -> crate::Result<()> {
        if self.is_admin() {
            Ok(())
        }
        else {
            Err(AppError::forbidden("Admin privileges required"))
        }
    }

    /// Fail with 403 unless the role is ADMIN or MANAGER.
    pub fn require_manager(&self) -> crate::Result<()> {
        if self.can_manage() {
            Ok(())
        }
        else {
            Err(AppError::forbidden("Manager privileges required"))
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_string(s).ok_or_else(|| AppError::validation(format!("Invalid role: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Role::from_string("admin"), Some(Role::Admin));
        assert_eq!(Role::from_string(" Manager "), Some(Role::Manager));
        assert_eq!(Role::from_string("USER"), Some(Role::User));
        assert_eq!(Role::from_string("owner"), None);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "root".parse::<Role>().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_require_admin() {
        assert!(Role::Admin.require_admin().is_ok());
        let err = Role::Manager.require_admin().unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        assert_eq!(err.message(), "Admin privileges required");
    }

    #[test]
    fn test_require_manager() {
        assert!(Role::Admin.require_manager().is_ok());
        assert!(Role::Manager.require_manager().is_ok());
        assert!(Role::User.require_manager().is_err());
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"MANAGER\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }
}
