// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! The authentication front door.
//!
//! [`LoginGate::attempt`] puts the lockout tracker around a caller-supplied
//! credential check:
//!
//! 1. Locked user or origin: refuse with `AccountLocked` without running
//!    the verifier.
//! 2. Verifier rejects: record a failure on both counters.
//! 3. Verifier accepts: clear the user counter.
//!
//! Every attempt produces one `auth:login` audit record. Cache failures
//! while recording are logged; the configured failure mode governs only the
//! lock check.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use warden_audit::{AuditOutcome, AuditRecord, AuditSink};
use warden_lockout::{LockoutState, LockoutTracker};

use crate::error::LoginError;
use crate::guard::deliver;

const LOGIN_ACTION: &str = "auth:login";

#[derive(Clone)]
pub struct LoginGate {
    tracker: LockoutTracker,
    audit: Arc<dyn AuditSink>,
    audit_timeout: Duration,
}

impl std::fmt::Debug for LoginGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGate")
            .field("tracker", &self.tracker)
            .field("audit", &self.audit.name())
            .finish()
    }
}

impl LoginGate {
    pub fn new(tracker: LockoutTracker, audit: Arc<dyn AuditSink>, audit_timeout: Duration) -> Self {
        Self {
            tracker,
            audit,
            audit_timeout,
        }
    }

    pub fn tracker(&self) -> &LockoutTracker {
        &self.tracker
    }

    /// Run one login attempt for `user_id` from `origin`.
    ///
    /// # Errors
    ///
    /// [`LoginError::AccountLocked`] when the pair is locked (the verifier
    /// is not called), [`LoginError::InvalidCredentials`] when `verify`
    /// resolves to `false`.
    pub async fn attempt<F, Fut>(
        &self,
        user_id: &str,
        origin: Option<&str>,
        verify: F,
    ) -> Result<(), LoginError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.tracker.is_locked(user_id, origin).await {
            warn!(user = %user_id, origin = origin.unwrap_or("-"), "Login refused: account locked");
            let err = LoginError::AccountLocked;
            self.audit(user_id, origin, Some(&err)).await;
            return Err(err);
        }

        if !verify().await {
            let remaining_attempts = match self.tracker.record_failure(user_id, origin).await {
                Ok(LockoutState::Warning { remaining, .. }) => Some(remaining),
                Ok(_) => Some(0),
                Err(_) => None,
            };
            warn!(user = %user_id, origin = origin.unwrap_or("-"), remaining = ?remaining_attempts, "Login failed");
            let err = LoginError::InvalidCredentials { remaining_attempts };
            self.audit(user_id, origin, Some(&err)).await;
            return Err(err);
        }

        if let Err(err) = self.tracker.record_success(user_id).await {
            debug!(user = %user_id, error = %err, "User counter not cleared");
        }
        info!(user = %user_id, origin = origin.unwrap_or("-"), "Login succeeded");
        self.audit(user_id, origin, None).await;
        Ok(())
    }

    async fn audit(&self, user_id: &str, origin: Option<&str>, err: Option<&LoginError>) {
        let outcome = if err.is_some() {
            AuditOutcome::Denied
        } else {
            AuditOutcome::Allowed
        };
        let mut record = AuditRecord::new(LOGIN_ACTION, "auth", outcome)
            .with_actor(Some(user_id.to_string()))
            .with_origin(origin.map(str::to_string));
        if let Some(err) = err {
            record = record.with_reason(err.kind());
        }
        deliver(self.audit.as_ref(), record, self.audit_timeout).await;
    }
}
