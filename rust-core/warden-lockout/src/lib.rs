// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warden Account Lockout
//
// Brute-force protection for the authentication front door. Failures are
// counted per user and per origin in an external TTL cache
// (`warden_cache::CounterCache`); either counter reaching the threshold
// locks the pair until the cache expires it.
//
// - [`tracker`] -- `LockoutTracker` and `LockoutState`.
// - [`config`] -- `LockoutConfig` and the fail-open / fail-closed `FailureMode`.
// - [`error`] -- `LockoutError`.

pub mod config;
pub mod error;
pub mod tracker;

pub use config::{FailureMode, LockoutConfig, MAX_CACHE_TIMEOUT_MS, MAX_WINDOW_SECS};
pub use error::LockoutError;
pub use tracker::{LockoutState, LockoutTracker};
