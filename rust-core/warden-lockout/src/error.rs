// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lockout tracker error types.

use thiserror::Error;
use warden_cache::CacheError;

/// Errors surfaced by the lockout tracker.
#[derive(Debug, Error)]
pub enum LockoutError {
    /// The counter cache failed or timed out.
    #[error("lockout cache unavailable: {0}")]
    CollaboratorUnavailable(#[from] CacheError),

    /// A configuration value is out of range or unparseable.
    #[error("invalid lockout configuration: {0}")]
    InvalidConfig(String),
}
