// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warden Audit Trail
//
// Every guarded invocation produces one `AuditRecord` (actor, action,
// resource, outcome, timestamp). This crate defines the record, the
// `AuditSink` contract for forwarding it to a durable log, and two sinks:
//
// - [`memory`] -- `MemoryAuditLog`, a bounded ring buffer (default 10 000).
// - [`sink`] -- `AuditSink` and `TracingAuditSink` (structured events on
//   target `warden::audit`).
//
// Sink failures are reported as `AuditError` and never alter the
// authorization decision that produced the record.

pub mod error;
pub mod memory;
pub mod record;
pub mod sink;

pub use error::AuditError;
pub use memory::MemoryAuditLog;
pub use record::{AuditOutcome, AuditRecord};
pub use sink::{AuditSink, TracingAuditSink};
