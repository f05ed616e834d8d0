// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! The audit record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one guarded invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Allowed => write!(f, "ALLOWED"),
            AuditOutcome::Denied => write!(f, "DENIED"),
        }
    }
}

/// A structured entry describing one authorization decision.
///
/// Built once per guarded invocation and moved into the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier, so at-least-once delivery can be deduplicated.
    pub id: Uuid,
    /// The guarded action (e.g. "user:update").
    pub action: String,
    /// The resource type acted upon (e.g. "user").
    pub resource_type: String,
    /// The specific resource, when the guard has an extractor for it.
    pub resource_id: Option<String>,
    /// The acting principal; absent for unauthenticated calls.
    pub actor: Option<String>,
    /// Network origin of the call, if known.
    pub origin: Option<String>,
    pub outcome: AuditOutcome,
    /// Denial kind and detail, for denied records.
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Start a record stamped with the current time and a fresh id.
    pub fn new(action: impl Into<String>, resource_type: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            actor: None,
            origin: None,
            outcome,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn allowed(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::new(action, resource_type, AuditOutcome::Allowed)
    }

    pub fn denied(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::new(action, resource_type, AuditOutcome::Denied)
    }

    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_resource_id(mut self, resource_id: Option<String>) -> Self {
        self.resource_id = resource_id;
        self
    }

    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == AuditOutcome::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let record = AuditRecord::denied("user:delete", "user")
            .with_actor(Some("u1".into()))
            .with_resource_id(Some("42".into()))
            .with_origin(Some("10.0.0.1".into()))
            .with_reason("PermissionDenied");

        assert!(!record.is_allowed());
        assert_eq!(record.actor.as_deref(), Some("u1"));
        assert_eq!(record.resource_id.as_deref(), Some("42"));
        assert_eq!(record.reason.as_deref(), Some("PermissionDenied"));
        assert_eq!(record.outcome.to_string(), "DENIED");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = AuditRecord::allowed("x", "y");
        let b = AuditRecord::allowed("x", "y");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_serializes_outcome_lowercase() {
        let record = AuditRecord::allowed("dashboard:view", "dashboard");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"], "allowed");
        assert_eq!(json["resource_id"], serde_json::Value::Null);
    }
}
