// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache error types for Warden's counter cache abstraction.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the counter cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache is not reachable (connection refused, lost, or reset).
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The cache did not answer within the caller's deadline.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// The value stored at a counter key is not an integer.
    #[error("corrupted counter at {key}: {detail}")]
    CorruptedData {
        /// The offending key.
        key: String,
        /// What was found instead of a counter.
        detail: String,
    },

    /// The requested TTL cannot be represented as a deadline.
    #[error("ttl {0:?} is out of range")]
    InvalidTtl(Duration),

    /// The key exceeds the maximum allowed size.
    #[error("key too large: {size} bytes (max: {max})")]
    KeyTooLarge {
        /// Actual key size in bytes.
        size: usize,
        /// Maximum allowed key size in bytes.
        max: usize,
    },
}

impl CacheError {
    /// Whether the error means "the collaborator could not be reached", as
    /// opposed to a malformed request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Unavailable(_) | CacheError::Timeout(_))
    }
}
