// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Access guards.
//!
//! A [`Warden`] bundles the shared services (policy evaluator, identity
//! collaborators, optional lockout tracker, audit sink, configuration).
//! Guards are built from it once, at route/handler setup, and wrap
//! protected operations:
//!
//! ```text
//! resolve principal ──none──> AuthenticationRequired (401)
//!        │
//! lockout check (opt-in) ──locked──> AccountLocked (423)
//!        │
//! evaluate policy ──false──> PermissionDenied (403, missing atoms)
//!        │
//! audit ALLOWED ──> run operation
//! ```
//!
//! Authorization always completes before the operation starts. The allowed
//! record is handed to the sink before the operation runs, so cancelling
//! the operation never retracts it. Audit delivery failures are logged and
//! never change the decision.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use warden_audit::{AuditError, AuditOutcome, AuditRecord, AuditSink};
use warden_authz::{
    CallContext, ConfigurationError, Evaluation, Operator, Policy, PolicyEvaluator, Principal,
};
use warden_lockout::LockoutTracker;

use crate::config::WardenConfig;
use crate::decision::AccessDecision;
use crate::error::AccessError;
use crate::identity::{IdentityResolver, RoleSource};
use crate::login::LoginGate;

/// Pulls the target resource id out of a call, for audit records.
pub type ResourceExtractor = Arc<dyn Fn(&CallContext) -> Option<String> + Send + Sync>;

// ---------------------------------------------------------------------------
// Shared services
// ---------------------------------------------------------------------------

/// Process-wide authorization services. Cheap to clone.
#[derive(Clone)]
pub struct Warden {
    evaluator: PolicyEvaluator,
    identity: Arc<dyn IdentityResolver>,
    roles: Arc<dyn RoleSource>,
    lockout: Option<LockoutTracker>,
    audit: Arc<dyn AuditSink>,
    config: WardenConfig,
}

impl std::fmt::Debug for Warden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warden")
            .field("evaluator", &self.evaluator)
            .field("lockout", &self.lockout)
            .field("audit", &self.audit.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Warden {
    /// Create the services with default configuration and no lockout tracker.
    pub fn new(
        evaluator: PolicyEvaluator,
        identity: Arc<dyn IdentityResolver>,
        roles: Arc<dyn RoleSource>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            evaluator,
            identity,
            roles,
            lockout: None,
            audit,
            config: WardenConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WardenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_lockout(mut self, tracker: LockoutTracker) -> Self {
        self.lockout = Some(tracker);
        self
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn lockout(&self) -> Option<&LockoutTracker> {
        self.lockout.as_ref()
    }

    /// Start configuring a guard for `action` (e.g. "user:update").
    pub fn guard(&self, action: impl Into<String>) -> GuardBuilder {
        GuardBuilder::new(self.clone(), action.into())
    }

    /// The authentication front door backed by this warden's tracker.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidConfig`] when no lockout tracker is set.
    pub fn login_gate(&self) -> Result<LoginGate, ConfigurationError> {
        let tracker = self.lockout.clone().ok_or_else(|| {
            ConfigurationError::InvalidConfig("login gate requires a lockout tracker".into())
        })?;
        Ok(LoginGate::new(
            tracker,
            self.audit.clone(),
            self.config.audit.sink_timeout(),
        ))
    }

    async fn emit(&self, record: AuditRecord) {
        deliver(self.audit.as_ref(), record, self.config.audit.sink_timeout()).await;
    }
}

/// Hand `record` to `sink` within `deadline`. Failures are logged only.
pub(crate) async fn deliver(sink: &dyn AuditSink, record: AuditRecord, deadline: Duration) {
    let id = record.id;
    let result = match tokio::time::timeout(deadline, sink.append(record)).await {
        Ok(result) => result,
        Err(_) => Err(AuditError::Timeout(deadline)),
    };
    if let Err(e) = result {
        warn!(record = %id, sink = sink.name(), error = %e, "Audit delivery failed");
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures one [`AccessGuard`].
pub struct GuardBuilder {
    warden: Warden,
    action: String,
    resource_type: Option<String>,
    policy: Option<Policy>,
    lockout_check: bool,
    audit_denials: Option<bool>,
    resource_id: Option<ResourceExtractor>,
}

impl GuardBuilder {
    fn new(warden: Warden, action: String) -> Self {
        Self {
            warden,
            action,
            resource_type: None,
            policy: None,
            lockout_check: false,
            audit_denials: None,
            resource_id: None,
        }
    }

    /// Resource type for audit records. Defaults to the part of the action
    /// before the first `:`.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Require `policy`. Repeated requirements are combined with AND.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(match self.policy.take() {
            None => policy,
            Some(Policy::And(mut items)) => {
                items.push(policy);
                Policy::And(items)
            }
            Some(previous) => Policy::And(vec![previous, policy]),
        });
        self
    }

    /// Require permissions combined with `op`.
    pub fn require_permissions<I, S>(self, op: Operator, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy(Policy::permissions(op, names))
    }

    /// Require roles combined with `op`.
    pub fn require_roles<I, S>(self, op: Operator, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy(Policy::roles(op, names))
    }

    /// Refuse locked users and origins before evaluating the policy.
    pub fn check_lockout(mut self, enabled: bool) -> Self {
        self.lockout_check = enabled;
        self
    }

    /// Override `AuditConfig::audit_denials` for this guard.
    pub fn audit_denials(mut self, enabled: bool) -> Self {
        self.audit_denials = Some(enabled);
        self
    }

    pub fn resource_id<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&CallContext) -> Option<String> + Send + Sync + 'static,
    {
        self.resource_id = Some(Arc::new(extractor));
        self
    }

    /// Take the resource id from a named call parameter.
    pub fn resource_id_param(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.resource_id(move |ctx| ctx.param(&key).map(str::to_string))
    }

    /// Validate the configuration and produce the guard.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::EmptyAtom`] for a blank action.
    /// - [`ConfigurationError::InvalidConfig`] when no policy was given, or a
    ///   lockout check was requested without a tracker.
    /// - Any error of [`PolicyEvaluator::validate`].
    pub fn build(self) -> Result<AccessGuard, ConfigurationError> {
        if self.action.trim().is_empty() {
            return Err(ConfigurationError::EmptyAtom { kind: "action" });
        }
        let policy = self.policy.ok_or_else(|| {
            ConfigurationError::InvalidConfig(format!("guard {} has no policy", self.action))
        })?;
        let config = self.warden.config();
        self.warden
            .evaluator()
            .validate(&policy, config.policy.strict_atoms)?;
        if self.lockout_check && self.warden.lockout().is_none() {
            return Err(ConfigurationError::InvalidConfig(format!(
                "guard {} checks lockout but no tracker is configured",
                self.action
            )));
        }

        let resource_type = self.resource_type.unwrap_or_else(|| {
            self.action
                .split_once(':')
                .map_or(self.action.as_str(), |(resource, _)| resource)
                .to_string()
        });
        let audit_denials = self.audit_denials.unwrap_or(config.audit.audit_denials);

        Ok(AccessGuard {
            inner: Arc::new(GuardInner {
                action: self.action,
                resource_type,
                policy,
                lockout_check: self.lockout_check,
                audit_denials,
                resource_id: self.resource_id,
                warden: self.warden,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

struct GuardInner {
    warden: Warden,
    action: String,
    resource_type: String,
    policy: Policy,
    lockout_check: bool,
    audit_denials: bool,
    resource_id: Option<ResourceExtractor>,
}

/// Wraps protected operations with authentication, lockout, policy and
/// audit. Immutable once built; clones share configuration.
#[derive(Clone)]
pub struct AccessGuard {
    inner: Arc<GuardInner>,
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("action", &self.inner.action)
            .field("policy", &self.inner.policy.to_string())
            .field("lockout_check", &self.inner.lockout_check)
            .field("audit_denials", &self.inner.audit_denials)
            .finish()
    }
}

impl AccessGuard {
    pub fn action(&self) -> &str {
        &self.inner.action
    }

    pub fn resource_type(&self) -> &str {
        &self.inner.resource_type
    }

    pub fn policy(&self) -> &Policy {
        &self.inner.policy
    }

    /// Decide whether the call may proceed, returning the authorized principal.
    ///
    /// # Errors
    ///
    /// [`AccessError::AuthenticationRequired`], [`AccessError::AccountLocked`]
    /// or [`AccessError::PermissionDenied`], in that order of precedence.
    pub async fn authorize(&self, ctx: &CallContext) -> Result<Principal, AccessError> {
        let g = &self.inner;

        let Some(principal) = g.warden.identity.current_principal(ctx).await else {
            return Err(self.deny(ctx, None, AccessError::AuthenticationRequired).await);
        };

        if g.lockout_check {
            if let Some(tracker) = g.warden.lockout() {
                if tracker.is_locked(&principal.id, ctx.origin.as_deref()).await {
                    return Err(self.deny(ctx, Some(&principal), AccessError::AccountLocked).await);
                }
            }
        }

        let roles = g.warden.roles.roles_of(&principal.id).await;
        let evaluation = g.warden.evaluator().explain(&g.policy, &principal, &roles, ctx);
        if !evaluation.granted {
            let message = denial_message(&principal, &evaluation, &g.policy);
            let err = AccessError::PermissionDenied {
                missing_permissions: evaluation.missing_permissions,
                missing_roles: evaluation.missing_roles,
                message,
            };
            return Err(self.deny(ctx, Some(&principal), err).await);
        }

        info!(
            principal = %principal,
            action = %g.action,
            policy = %g.policy,
            "Access ALLOWED"
        );
        g.warden
            .emit(self.record(ctx, Some(&principal), AuditOutcome::Allowed))
            .await;
        Ok(principal)
    }

    /// Authorize, then run `op` with the authorized principal.
    /// `op` is never started when authorization fails.
    pub async fn invoke<F, Fut, T>(&self, ctx: &CallContext, op: F) -> Result<T, AccessError>
    where
        F: FnOnce(Principal) -> Fut,
        Fut: Future<Output = T>,
    {
        let principal = self.authorize(ctx).await?;
        Ok(op(principal).await)
    }

    /// [`authorize`](Self::authorize) folded into the serializable surface.
    pub async fn check(&self, ctx: &CallContext) -> AccessDecision {
        AccessDecision::from_result(&self.authorize(ctx).await)
    }

    async fn deny(&self, ctx: &CallContext, principal: Option<&Principal>, err: AccessError) -> AccessError {
        let g = &self.inner;
        warn!(
            principal = principal.map_or("-", |p| p.id.as_str()),
            action = %g.action,
            kind = err.kind(),
            status = err.status_code(),
            reason = %err,
            "Access DENIED"
        );
        if g.audit_denials {
            let record = self
                .record(ctx, principal, AuditOutcome::Denied)
                .with_reason(format!("{}: {}", err.kind(), err));
            g.warden.emit(record).await;
        }
        err
    }

    fn record(&self, ctx: &CallContext, principal: Option<&Principal>, outcome: AuditOutcome) -> AuditRecord {
        let g = &self.inner;
        AuditRecord::new(g.action.clone(), g.resource_type.clone(), outcome)
            .with_actor(principal.map(|p| p.id.clone()))
            .with_resource_id(g.resource_id.as_ref().and_then(|extract| extract(ctx)))
            .with_origin(ctx.origin.clone())
    }
}

fn denial_message(principal: &Principal, evaluation: &Evaluation, policy: &Policy) -> String {
    if !principal.active {
        format!("principal {} is inactive", principal.id)
    } else if !evaluation.missing_permissions.is_empty() {
        format!(
            "missing permissions: {}",
            evaluation.missing_permissions.join(", ")
        )
    } else if !evaluation.missing_roles.is_empty() {
        format!("missing roles: {}", evaluation.missing_roles.join(", "))
    } else {
        format!("policy {policy} not satisfied")
    }
}
