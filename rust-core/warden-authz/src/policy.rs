// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Policy expressions.
//!
//! A [`Policy`] is an immutable boolean expression over permission and role
//! atoms, built once when a guard is configured. Leaves are [`Policy::Has`]
//! and [`Policy::HasRole`]; [`Policy::And`] and [`Policy::Or`] combine them.
//! Two further shapes are first-class:
//!
//! - [`Policy::OwnerOrPermission`] grants when the principal's id equals a
//!   named call parameter, and otherwise falls back to a permission check.
//! - [`Policy::Conditional`] applies its inner policy only when a
//!   [`Predicate`] over the call context holds; otherwise the call is allowed.
//!
//! Structural problems (empty names, empty combinators) are caught by
//! [`Policy::validate`] at setup time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::principal::CallContext;

type PredicateFn = dyn Fn(&CallContext) -> Result<bool, String> + Send + Sync;

/// A named test over the call context, used by [`Policy::Conditional`].
///
/// A predicate that reports an error is treated as holding, so the inner
/// policy is enforced.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    test: Arc<PredicateFn>,
}

impl Predicate {
    /// Wrap an infallible test.
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&CallContext) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            test: Arc::new(move |ctx| Ok(test(ctx))),
        }
    }

    /// Wrap a test that can fail (e.g. a parameter that does not parse).
    pub fn fallible<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&CallContext) -> Result<bool, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    /// True when the named parameter is present and equals `value`.
    pub fn param_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let name = format!("{key}=={value}");
        Self::new(name, move |ctx| ctx.param(&key) == Some(value.as_str()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn test(&self, ctx: &CallContext) -> Result<bool, String> {
        (self.test)(ctx)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish()
    }
}

/// How a list of atoms is combined by the convenience constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

/// A composable authorization rule.
#[derive(Debug, Clone)]
pub enum Policy {
    /// The principal's roles grant this permission.
    Has(String),
    /// The principal holds this role.
    HasRole(String),
    /// Every operand holds. Short-circuits on the first false operand.
    And(Vec<Policy>),
    /// At least one operand holds. Short-circuits on the first true operand.
    Or(Vec<Policy>),
    /// The principal owns the resource named by `owner_param`, or holds `permission`.
    OwnerOrPermission {
        owner_param: String,
        permission: String,
    },
    /// `inner` is enforced only when `predicate` holds.
    Conditional {
        predicate: Predicate,
        inner: Box<Policy>,
    },
}

impl Policy {
    pub fn has(permission: impl Into<String>) -> Self {
        Policy::Has(permission.into())
    }

    pub fn has_role(role: impl Into<String>) -> Self {
        Policy::HasRole(role.into())
    }

    pub fn owner_or_permission(owner_param: impl Into<String>, permission: impl Into<String>) -> Self {
        Policy::OwnerOrPermission {
            owner_param: owner_param.into(),
            permission: permission.into(),
        }
    }

    pub fn conditional(predicate: Predicate, inner: Policy) -> Self {
        Policy::Conditional {
            predicate,
            inner: Box::new(inner),
        }
    }

    /// Combine permission atoms with `op`. A single name yields a bare `Has`.
    pub fn permissions<I, S>(op: Operator, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::combine(op, names.into_iter().map(|n| Policy::Has(n.into())).collect())
    }

    /// Combine role atoms with `op`. A single name yields a bare `HasRole`.
    pub fn roles<I, S>(op: Operator, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::combine(op, names.into_iter().map(|n| Policy::HasRole(n.into())).collect())
    }

    fn combine(op: Operator, mut atoms: Vec<Policy>) -> Self {
        if atoms.len() == 1 {
            return atoms.remove(0);
        }
        match op {
            Operator::And => Policy::And(atoms),
            Operator::Or => Policy::Or(atoms),
        }
    }

    /// Listing and reading users.
    pub fn user_management() -> Self {
        Self::permissions(Operator::And, ["user:list", "user:read"])
    }

    /// Listing and reading roles.
    pub fn role_management() -> Self {
        Self::permissions(Operator::And, ["role:list", "role:read"])
    }

    /// The `admin` role.
    pub fn system_admin() -> Self {
        Self::has_role("admin")
    }

    /// Either the `admin` or the `manager` role.
    pub fn manager_or_admin() -> Self {
        Self::roles(Operator::Or, ["admin", "manager"])
    }

    /// Check the expression for structural errors.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::EmptyAtom`] for a blank permission, role or
    /// owner parameter name, and [`ConfigurationError::EmptyComposite`] for
    /// an `And`/`Or` with no operands.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            Policy::Has(name) => non_empty(name, "permission"),
            Policy::HasRole(name) => non_empty(name, "role"),
            Policy::And(items) | Policy::Or(items) => {
                if items.is_empty() {
                    let kind = if matches!(self, Policy::And(_)) { "and" } else { "or" };
                    return Err(ConfigurationError::EmptyComposite(kind));
                }
                items.iter().try_for_each(Policy::validate)
            }
            Policy::OwnerOrPermission {
                owner_param,
                permission,
            } => {
                non_empty(owner_param, "owner parameter")?;
                non_empty(permission, "permission")
            }
            Policy::Conditional { predicate, inner } => {
                non_empty(predicate.name(), "predicate")?;
                inner.validate()
            }
        }
    }

    /// Every permission name the expression can test, in first-seen order.
    pub fn permission_atoms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_permissions(&mut out);
        out
    }

    fn collect_permissions<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Policy::Has(name) | Policy::OwnerOrPermission { permission: name, .. } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Policy::HasRole(_) => {}
            Policy::And(items) | Policy::Or(items) => {
                items.iter().for_each(|p| p.collect_permissions(out));
            }
            Policy::Conditional { inner, .. } => inner.collect_permissions(out),
        }
    }
}

fn non_empty(name: &str, kind: &'static str) -> Result<(), ConfigurationError> {
    if name.trim().is_empty() {
        Err(ConfigurationError::EmptyAtom { kind })
    } else {
        Ok(())
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Has(name) => write!(f, "has({name})"),
            Policy::HasRole(name) => write!(f, "has_role({name})"),
            Policy::And(items) | Policy::Or(items) => {
                f.write_str(if matches!(self, Policy::And(_)) { "and(" } else { "or(" })?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Policy::OwnerOrPermission {
                owner_param,
                permission,
            } => write!(f, "owner_or_permission({owner_param}, {permission})"),
            Policy::Conditional { predicate, inner } => {
                write!(f, "when({}, {inner})", predicate.name())
            }
        }
    }
}
