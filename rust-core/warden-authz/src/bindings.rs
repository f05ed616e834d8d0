// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Role to permission bindings.
//!
//! Roles are plain strings owned by the identity layer; this store only
//! records which permission names each role grants. A binding may name a
//! permission that is not (yet) in the [`PermissionCatalog`]: such a name is
//! simply never granted by anything else, and [`RoleBindingStore::dangling_bindings`]
//! reports it for operators without treating it as an error.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::catalog::PermissionCatalog;

/// Permissions granted to `manager` by [`RoleBindingStore::with_default_roles`].
const MANAGER_PERMISSIONS: &[&str] = &[
    "user:read",
    "user:list",
    "user:update",
    "role:read",
    "role:list",
    "permission:read",
    "permission:list",
    "system:monitor",
    "dashboard:view",
    "dashboard:export",
];

const USER_PERMISSIONS: &[&str] = &["dashboard:view", "user:read"];

const GUEST_PERMISSIONS: &[&str] = &["dashboard:view"];

/// Mapping from role identifier to the set of permission names it grants.
///
/// Mutations are idempotent. Reads take a shared lock for the duration of a
/// single call only.
#[derive(Debug, Default)]
pub struct RoleBindingStore {
    bindings: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl RoleBindingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the stock `admin`, `manager`, `user` and `guest`
    /// roles. `admin` is bound to every permission currently in `catalog`.
    pub fn with_default_roles(catalog: &PermissionCatalog) -> Self {
        let store = Self::new();
        store.assign_all("admin", catalog.names());
        store.assign_all("manager", MANAGER_PERMISSIONS.iter().copied());
        store.assign_all("user", USER_PERMISSIONS.iter().copied());
        store.assign_all("guest", GUEST_PERMISSIONS.iter().copied());
        store
    }

    /// Bind `permission` to `role`. Returns `false` if it was already bound.
    pub fn assign_permission(&self, role: &str, permission: &str) -> bool {
        let added = self
            .write()
            .entry(role.to_string())
            .or_default()
            .insert(permission.to_string());
        if added {
            debug!(role = %role, permission = %permission, "Permission assigned");
        }
        added
    }

    /// Bind every permission in `permissions` to `role`.
    pub fn assign_all<I, S>(&self, role: &str, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bindings = self.write();
        let set = bindings.entry(role.to_string()).or_default();
        set.extend(permissions.into_iter().map(Into::into));
    }

    /// Unbind `permission` from `role`. Returns `false` if it was not bound.
    pub fn revoke_permission(&self, role: &str, permission: &str) -> bool {
        let mut bindings = self.write();
        let removed = bindings
            .get_mut(role)
            .is_some_and(|set| set.remove(permission));
        if removed {
            debug!(role = %role, permission = %permission, "Permission revoked");
        }
        removed
    }

    /// True iff any role in `roles` is bound to `permission`.
    /// An empty role set grants nothing.
    pub fn has_permission<I, S>(&self, roles: I, permission: &str) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bindings = self.read();
        roles.into_iter().any(|role| {
            bindings
                .get(role.as_ref())
                .is_some_and(|set| set.contains(permission))
        })
    }

    /// The union of the permissions bound to every role in `roles`.
    pub fn effective_permissions<I, S>(&self, roles: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bindings = self.read();
        roles
            .into_iter()
            .filter_map(|role| bindings.get(role.as_ref()))
            .flat_map(|set| set.iter().cloned())
            .collect()
    }

    /// The permissions bound to a single role.
    pub fn permissions_of(&self, role: &str) -> BTreeSet<String> {
        self.read().get(role).cloned().unwrap_or_default()
    }

    /// All known role identifiers, sorted.
    pub fn roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self.read().keys().cloned().collect();
        roles.sort();
        roles
    }

    /// `(role, permission)` pairs whose permission is missing from `catalog`.
    pub fn dangling_bindings(&self, catalog: &PermissionCatalog) -> Vec<(String, String)> {
        let bindings = self.read();
        let mut dangling: Vec<(String, String)> = bindings
            .iter()
            .flat_map(|(role, set)| {
                set.iter()
                    .filter(|perm| !catalog.exists(perm))
                    .map(move |perm| (role.clone(), perm.clone()))
            })
            .collect();
        dangling.sort();
        dangling
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, BTreeSet<String>>> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, BTreeSet<String>>> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }
}
