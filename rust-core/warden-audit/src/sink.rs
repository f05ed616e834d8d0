// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! The sink contract and the tracing-backed sink.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::AuditError;
use crate::record::{AuditOutcome, AuditRecord};

/// Receives audit records and forwards them to durable storage.
///
/// Delivery is at-least-once from the caller's point of view; records carry
/// a unique id so a sink can drop redeliveries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Hand one record to the sink.
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        (**self).append(record).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Writes each record as a structured `tracing` event on target
/// `warden::audit`, for collection by whatever subscriber the process runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        let actor = record.actor.as_deref().unwrap_or("-");
        let resource_id = record.resource_id.as_deref().unwrap_or("-");
        let origin = record.origin.as_deref().unwrap_or("-");
        match record.outcome {
            AuditOutcome::Allowed => info!(
                target: "warden::audit",
                id = %record.id,
                action = %record.action,
                resource_type = %record.resource_type,
                resource_id,
                actor,
                origin,
                timestamp = %record.timestamp.to_rfc3339(),
                "Access ALLOWED"
            ),
            AuditOutcome::Denied => warn!(
                target: "warden::audit",
                id = %record.id,
                action = %record.action,
                resource_type = %record.resource_type,
                resource_id,
                actor,
                origin,
                reason = record.reason.as_deref().unwrap_or("-"),
                timestamp = %record.timestamp.to_rfc3339(),
                "Access DENIED"
            ),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
