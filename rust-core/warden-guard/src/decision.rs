// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! The language-agnostic decision surface returned to callers:
//!
//! ```json
//! { "allowed": false, "errorKind": "PermissionDenied",
//!   "missingPermissions": ["user:delete"], "message": "missing permissions: user:delete" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AccessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthenticationRequired,
    AccountLocked,
    PermissionDenied,
}

/// Serializable outcome of one guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub allowed: bool,
    pub error_kind: Option<ErrorKind>,
    pub missing_permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_roles: Vec<String>,
    pub message: String,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            error_kind: None,
            missing_permissions: Vec::new(),
            missing_roles: Vec::new(),
            message: String::new(),
        }
    }

    /// Fold a guard result into the surface shape.
    pub fn from_result<T>(result: &Result<T, AccessError>) -> Self {
        match result {
            Ok(_) => Self::allow(),
            Err(e) => Self::from(e),
        }
    }
}

impl From<&AccessError> for AccessDecision {
    fn from(err: &AccessError) -> Self {
        let (kind, missing_permissions, missing_roles) = match err {
            AccessError::AuthenticationRequired => (ErrorKind::AuthenticationRequired, vec![], vec![]),
            AccessError::AccountLocked => (ErrorKind::AccountLocked, vec![], vec![]),
            AccessError::PermissionDenied {
                missing_permissions,
                missing_roles,
                ..
            } => (
                ErrorKind::PermissionDenied,
                missing_permissions.clone(),
                missing_roles.clone(),
            ),
        };
        Self {
            allowed: false,
            error_kind: Some(kind),
            missing_permissions,
            missing_roles,
            message: err.to_string(),
        }
    }
}
