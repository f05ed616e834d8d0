// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call-time error types.

use thiserror::Error;

/// Why a guarded call was refused. Always terminal for the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No principal could be resolved for the call.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The user or origin has too many recent authentication failures.
    #[error("account locked: too many failed attempts")]
    AccountLocked,

    /// The principal does not satisfy the guard's policy.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Unsatisfied permission atoms.
        missing_permissions: Vec<String>,
        /// Unsatisfied role atoms.
        missing_roles: Vec<String>,
        message: String,
    },
}

impl AccessError {
    /// HTTP-analogous status code.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::AuthenticationRequired => 401,
            AccessError::AccountLocked => 423,
            AccessError::PermissionDenied { .. } => 403,
        }
    }

    /// Stable kind name, as reported in audit records and decisions.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::AuthenticationRequired => "AuthenticationRequired",
            AccessError::AccountLocked => "AccountLocked",
            AccessError::PermissionDenied { .. } => "PermissionDenied",
        }
    }
}

/// Why a login attempt was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// Locked before the credentials were looked at.
    #[error("account locked: too many failed attempts")]
    AccountLocked,

    /// The verifier rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials {
        /// Attempts left before lockout, when the tracker could tell.
        remaining_attempts: Option<u64>,
    },
}

impl LoginError {
    pub fn status_code(&self) -> u16 {
        match self {
            LoginError::AccountLocked => 423,
            LoginError::InvalidCredentials { .. } => 401,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LoginError::AccountLocked => "AccountLocked",
            LoginError::InvalidCredentials { .. } => "InvalidCredentials",
        }
    }
}
