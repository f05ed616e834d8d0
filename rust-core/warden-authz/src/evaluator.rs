// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Policy evaluation.
//!
//! [`PolicyEvaluator`] answers "does this principal, holding these roles,
//! satisfy this policy for this call?". It is stateless apart from shared
//! handles on the catalog and role bindings, and evaluation has no side
//! effects beyond reading them.
//!
//! # Rules
//!
//! - An inactive principal satisfies nothing.
//! - `Has(p)` holds for a superuser, or when any held role is bound to `p`.
//! - `HasRole(r)` holds when `r` is in the role set (superusers included).
//! - `And` stops at the first false operand; `Or` at the first true one.
//! - `OwnerOrPermission` compares the principal id with the named call
//!   parameter before consulting the bindings.
//! - `Conditional` is true outright when its predicate is false; a predicate
//!   that errors is treated as true, so the inner policy is enforced.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bindings::RoleBindingStore;
use crate::catalog::PermissionCatalog;
use crate::error::ConfigurationError;
use crate::policy::Policy;
use crate::principal::{CallContext, Principal, RoleSet};

/// The outcome of [`PolicyEvaluator::explain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub granted: bool,
    /// Unsatisfied permission atoms, in policy order. Empty when granted.
    pub missing_permissions: Vec<String>,
    /// Unsatisfied role atoms, in policy order. Empty when granted.
    pub missing_roles: Vec<String>,
}

impl Evaluation {
    fn granted() -> Self {
        Self {
            granted: true,
            ..Self::default()
        }
    }
}

/// Evaluates [`Policy`] expressions against the shared catalog and bindings.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    catalog: Arc<PermissionCatalog>,
    bindings: Arc<RoleBindingStore>,
}

impl PolicyEvaluator {
    pub fn new(catalog: Arc<PermissionCatalog>, bindings: Arc<RoleBindingStore>) -> Self {
        Self { catalog, bindings }
    }

    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        &self.catalog
    }

    pub fn bindings(&self) -> &Arc<RoleBindingStore> {
        &self.bindings
    }

    /// Evaluate `policy` for one call.
    pub fn evaluate(
        &self,
        policy: &Policy,
        principal: &Principal,
        roles: &RoleSet,
        ctx: &CallContext,
    ) -> bool {
        if !principal.active {
            debug!(principal = %principal, "Inactive principal satisfies no policy");
            return false;
        }
        self.eval(policy, principal, roles, ctx)
    }

    fn eval(&self, policy: &Policy, principal: &Principal, roles: &RoleSet, ctx: &CallContext) -> bool {
        match policy {
            Policy::Has(permission) => self.holds(permission, principal, roles),
            Policy::HasRole(role) => roles.contains(role),
            Policy::And(items) => items.iter().all(|p| self.eval(p, principal, roles, ctx)),
            Policy::Or(items) => items.iter().any(|p| self.eval(p, principal, roles, ctx)),
            Policy::OwnerOrPermission {
                owner_param,
                permission,
            } => {
                ctx.param(owner_param) == Some(principal.id.as_str())
                    || self.holds(permission, principal, roles)
            }
            Policy::Conditional { predicate, inner } => match predicate.test(ctx) {
                Ok(false) => true,
                Ok(true) => self.eval(inner, principal, roles, ctx),
                Err(reason) => {
                    warn!(
                        predicate = %predicate.name(),
                        error = %reason,
                        "Predicate failed; enforcing inner policy"
                    );
                    self.eval(inner, principal, roles, ctx)
                }
            },
        }
    }

    fn holds(&self, permission: &str, principal: &Principal, roles: &RoleSet) -> bool {
        principal.superuser || self.bindings.has_permission(roles, permission)
    }

    /// Evaluate `policy` and, when it is denied, report which atoms were
    /// unsatisfied.
    ///
    /// This is the same pass as [`evaluate`](Self::evaluate), so each
    /// predicate runs at most once. Once an `And` operand fails, the rest
    /// of that `And` is still walked for atoms but predicates are no longer
    /// invoked and conditional nodes count as satisfied. An `Or` with any
    /// satisfied operand contributes nothing.
    pub fn explain(
        &self,
        policy: &Policy,
        principal: &Principal,
        roles: &RoleSet,
        ctx: &CallContext,
    ) -> Evaluation {
        let mut report = Evaluation::default();
        if !principal.active {
            debug!(principal = %principal, "Inactive principal satisfies no policy");
            return report;
        }
        let walk = Walk {
            evaluator: self,
            principal,
            roles,
            ctx,
        };
        if walk.visit(policy, Mode::Live, &mut report) {
            return Evaluation::granted();
        }
        report
    }

    /// Check a policy before it is attached to a guard.
    ///
    /// Structural problems are always errors. Permission atoms missing from
    /// the catalog are an error when `strict`, otherwise they are logged and
    /// returned.
    ///
    /// # Errors
    ///
    /// Any error of [`Policy::validate`], or
    /// [`ConfigurationError::UnknownPermission`] in strict mode.
    pub fn validate(&self, policy: &Policy, strict: bool) -> Result<Vec<String>, ConfigurationError> {
        policy.validate()?;
        let unknown: Vec<String> = policy
            .permission_atoms()
            .into_iter()
            .filter(|name| !self.catalog.exists(name))
            .map(str::to_string)
            .collect();
        if let Some(first) = unknown.first() {
            if strict {
                return Err(ConfigurationError::UnknownPermission(first.clone()));
            }
            for name in &unknown {
                warn!(permission = %name, "Policy references permission not in catalog");
            }
        }
        Ok(unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Predicates are invoked.
    Live,
    /// An enclosing `And` has already failed.
    Static,
}

/// One diagnostic evaluation pass.
struct Walk<'a> {
    evaluator: &'a PolicyEvaluator,
    principal: &'a Principal,
    roles: &'a RoleSet,
    ctx: &'a CallContext,
}

impl Walk<'_> {
    fn visit(&self, policy: &Policy, mode: Mode, report: &mut Evaluation) -> bool {
        match policy {
            Policy::Has(permission) => {
                let held = self.evaluator.holds(permission, self.principal, self.roles);
                if !held {
                    push_unique(&mut report.missing_permissions, permission);
                }
                held
            }
            Policy::HasRole(role) => {
                let held = self.roles.contains(role);
                if !held {
                    push_unique(&mut report.missing_roles, role);
                }
                held
            }
            Policy::And(items) => {
                let mut granted = true;
                let mut mode = mode;
                for item in items {
                    if !self.visit(item, mode, report) {
                        granted = false;
                        mode = Mode::Static;
                    }
                }
                granted
            }
            Policy::Or(items) => {
                let mut branch = Evaluation::default();
                if items.iter().any(|p| self.visit(p, mode, &mut branch)) {
                    return true;
                }
                for permission in &branch.missing_permissions {
                    push_unique(&mut report.missing_permissions, permission);
                }
                for role in &branch.missing_roles {
                    push_unique(&mut report.missing_roles, role);
                }
                false
            }
            Policy::OwnerOrPermission {
                owner_param,
                permission,
            } => {
                let granted = self.ctx.param(owner_param) == Some(self.principal.id.as_str())
                    || self.evaluator.holds(permission, self.principal, self.roles);
                if !granted {
                    push_unique(&mut report.missing_permissions, permission);
                }
                granted
            }
            Policy::Conditional { predicate, inner } => {
                if mode == Mode::Static {
                    return true;
                }
                match predicate.test(self.ctx) {
                    Ok(false) => true,
                    Ok(true) => self.visit(inner, mode, report),
                    Err(reason) => {
                        warn!(
                            predicate = %predicate.name(),
                            error = %reason,
                            "Predicate failed; enforcing inner policy"
                        );
                        self.visit(inner, mode, report)
                    }
                }
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}
