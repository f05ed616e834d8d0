// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Declarative policies.
//!
//! `PolicySpec` is the serde form of every policy shape that does not carry a
//! closure, so guard policies can be loaded from configuration:
//!
//! ```json
//! { "type": "and", "all": [
//!     { "type": "has", "permission": "user:update" },
//!     { "type": "or", "any": [
//!         { "type": "has_role", "role": "admin" },
//!         { "type": "owner_or_permission", "owner_param": "user_id", "permission": "user:delete" }
//!     ]}
//! ]}
//! ```
//!
//! Unknown node types and unknown fields are rejected while parsing, so a
//! malformed policy never reaches a guard.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::policy::Policy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum PolicySpec {
    Has { permission: String },
    HasRole { role: String },
    And { all: Vec<PolicySpec> },
    Or { any: Vec<PolicySpec> },
    OwnerOrPermission { owner_param: String, permission: String },
}

impl PolicySpec {
    /// Parse and validate a JSON policy.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidPolicySpec`] when the JSON is malformed
    /// or names an unknown node, and the structural errors of
    /// [`Policy::validate`].
    pub fn parse(json: &str) -> Result<Policy, ConfigurationError> {
        let spec: PolicySpec = serde_json::from_str(json)?;
        Policy::try_from(spec)
    }
}

impl PolicySpec {
    fn into_policy(self) -> Policy {
        match self {
            PolicySpec::Has { permission } => Policy::Has(permission),
            PolicySpec::HasRole { role } => Policy::HasRole(role),
            PolicySpec::And { all } => {
                Policy::And(all.into_iter().map(PolicySpec::into_policy).collect())
            }
            PolicySpec::Or { any } => {
                Policy::Or(any.into_iter().map(PolicySpec::into_policy).collect())
            }
            PolicySpec::OwnerOrPermission {
                owner_param,
                permission,
            } => Policy::OwnerOrPermission {
                owner_param,
                permission,
            },
        }
    }
}

impl TryFrom<PolicySpec> for Policy {
    type Error = ConfigurationError;

    fn try_from(spec: PolicySpec) -> Result<Self, Self::Error> {
        let policy = spec.into_policy();
        policy.validate()?;
        Ok(policy)
    }
}

impl Policy {
    /// Shorthand for [`PolicySpec::parse`].
    pub fn from_json(json: &str) -> Result<Policy, ConfigurationError> {
        PolicySpec::parse(json)
    }
}
