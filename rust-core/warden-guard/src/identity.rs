// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Identity collaborators.
//!
//! Warden does not authenticate anyone. The session layer plugs in an
//! [`IdentityResolver`] (who is calling?) and a [`RoleSource`] (which roles
//! do they hold?). [`StaticDirectory`] implements both from a fixed table,
//! for tests, tools and single-process deployments.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use warden_authz::{CallContext, Principal, RoleSet};

/// Resolves the principal behind a call.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` when the call is unauthenticated.
    async fn current_principal(&self, ctx: &CallContext) -> Option<Principal>;
}

/// Supplies the roles held by a principal.
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// An unknown principal holds no roles.
    async fn roles_of(&self, principal_id: &str) -> RoleSet;
}

/// Fixed principal table. The caller is identified by the value of one call
/// parameter (e.g. a session subject placed there by upstream middleware).
#[derive(Debug)]
pub struct StaticDirectory {
    subject_param: String,
    entries: RwLock<HashMap<String, (Principal, RoleSet)>>,
}

impl StaticDirectory {
    pub fn new(subject_param: impl Into<String>) -> Self {
        Self {
            subject_param: subject_param.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace a principal and its roles.
    pub fn insert<I, S>(&self, principal: Principal, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: RoleSet = roles.into_iter().map(Into::into).collect();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(principal.id.clone(), (principal, roles));
    }

    pub fn remove(&self, principal_id: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(principal_id)
            .is_some()
    }

    pub fn subject_param(&self) -> &str {
        &self.subject_param
    }
}

#[async_trait]
impl IdentityResolver for StaticDirectory {
    async fn current_principal(&self, ctx: &CallContext) -> Option<Principal> {
        let subject = ctx.param(&self.subject_param)?;
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .map(|(principal, _)| principal.clone())
    }
}

#[async_trait]
impl RoleSource for StaticDirectory {
    async fn roles_of(&self, principal_id: &str) -> RoleSet {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(principal_id)
            .map(|(_, roles)| roles.clone())
            .unwrap_or_default()
    }
}
