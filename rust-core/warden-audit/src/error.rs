// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit sink error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while handing a record to a sink.
///
/// Callers log these and carry on: an audit failure never changes an
/// authorization decision.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("audit sink timed out after {0:?}")]
    Timeout(Duration),
}
