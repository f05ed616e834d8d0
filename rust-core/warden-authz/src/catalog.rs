// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Permission catalog.
//!
//! A process-wide registry of [`PermissionDefinition`]s keyed by name
//! (`resource:action` by convention). The catalog is populated at startup
//! from the built-in definitions plus any caller-registered custom ones and
//! is read-mostly afterwards. Enumeration always follows registration order.
//!
//! Duplicate names are handled according to [`DuplicatePolicy`]:
//! - [`DuplicatePolicy::Overwrite`] (default) replaces the definition in
//!   place, keeping the slot of the first registration.
//! - [`DuplicatePolicy::Reject`] returns
//!   [`ConfigurationError::DuplicateDefinition`] and leaves the catalog as is.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigurationError;

// ---------------------------------------------------------------------------
// Permission definitions
// ---------------------------------------------------------------------------

/// An immutable permission definition. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Globally unique name, `resource:action` by convention.
    pub name: String,
    /// The resource type the permission applies to (e.g. "user").
    pub resource: String,
    /// The action on that resource (e.g. "update").
    pub action: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Display group (e.g. "user management").
    #[serde(default)]
    pub group: String,
}

impl PermissionDefinition {
    /// Define `resource:action`, deriving the name from its parts.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        let resource = resource.into();
        let action = action.into();
        Self {
            name: format!("{resource}:{action}"),
            resource,
            action,
            description: String::new(),
            group: String::new(),
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a display group.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

/// What [`PermissionCatalog::register`] does when the name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the existing definition, keeping its position.
    #[default]
    Overwrite,
    /// Refuse the registration with a configuration error.
    Reject,
}

/// The built-in definitions: `(resource, action, description, group)`.
const BUILTIN_DEFINITIONS: &[(&str, &str, &str, &str)] = &[
    ("user", "create", "Create users", "user management"),
    ("user", "read", "View users", "user management"),
    ("user", "update", "Update users", "user management"),
    ("user", "delete", "Delete users", "user management"),
    ("user", "list", "List users", "user management"),
    ("role", "create", "Create roles", "role management"),
    ("role", "read", "View roles", "role management"),
    ("role", "update", "Update roles", "role management"),
    ("role", "delete", "Delete roles", "role management"),
    ("role", "list", "List roles", "role management"),
    ("permission", "create", "Create permissions", "permission management"),
    ("permission", "read", "View permissions", "permission management"),
    ("permission", "update", "Update permissions", "permission management"),
    ("permission", "delete", "Delete permissions", "permission management"),
    ("permission", "list", "List permissions", "permission management"),
    ("system", "config", "Change system configuration", "system management"),
    ("system", "monitor", "Monitor the system", "system management"),
    ("system", "log", "Read system logs", "system management"),
    ("system", "backup", "Back up data", "system management"),
    ("dashboard", "view", "View the dashboard", "dashboard"),
    ("dashboard", "export", "Export dashboard data", "dashboard"),
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CatalogInner {
    /// Definitions in registration order.
    ordered: Vec<PermissionDefinition>,
    /// Name -> index into `ordered`.
    index: HashMap<String, usize>,
}

impl CatalogInner {
    fn insert(
        &mut self,
        definition: PermissionDefinition,
        duplicate_policy: DuplicatePolicy,
    ) -> Result<(), ConfigurationError> {
        match self.index.get(&definition.name).copied() {
            Some(slot) => match duplicate_policy {
                DuplicatePolicy::Reject => {
                    Err(ConfigurationError::DuplicateDefinition(definition.name))
                }
                DuplicatePolicy::Overwrite => {
                    debug!(permission = %definition.name, "Overwriting permission definition");
                    self.ordered[slot] = definition;
                    Ok(())
                }
            },
            None => {
                debug!(permission = %definition.name, "Registered permission");
                let slot = self.ordered.len();
                self.index.insert(definition.name.clone(), slot);
                self.ordered.push(definition);
                Ok(())
            }
        }
    }
}

/// Registry of permission definitions.
///
/// Shared behind an `Arc` for the life of the process; all methods take
/// `&self`. Lookups return owned snapshots so no lock is held by callers.
#[derive(Debug, Default)]
pub struct PermissionCatalog {
    inner: RwLock<CatalogInner>,
    duplicate_policy: DuplicatePolicy,
}

impl PermissionCatalog {
    /// Create an empty catalog that overwrites duplicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog with an explicit duplicate policy.
    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            inner: RwLock::new(CatalogInner::default()),
            duplicate_policy,
        }
    }

    /// Create a catalog pre-populated with the built-in definitions.
    pub fn with_builtin_definitions(duplicate_policy: DuplicatePolicy) -> Self {
        let catalog = Self::with_duplicate_policy(duplicate_policy);
        {
            let mut inner = catalog.write();
            for (resource, action, description, group) in BUILTIN_DEFINITIONS {
                let def = PermissionDefinition::new(*resource, *action)
                    .with_description(*description)
                    .in_group(*group);
                if let Err(err) = inner.insert(def, DuplicatePolicy::Overwrite) {
                    warn!(error = %err, "Skipping built-in permission");
                }
            }
        }
        info!(count = BUILTIN_DEFINITIONS.len(), "Registered built-in permissions");
        catalog
    }

    /// The active duplicate policy.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Register a definition.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DuplicateDefinition`] when the name exists and
    /// the catalog rejects duplicates.
    pub fn register(&self, definition: PermissionDefinition) -> Result<(), ConfigurationError> {
        self.write().insert(definition, self.duplicate_policy)
    }

    /// Look up a definition by exact name.
    pub fn get(&self, name: &str) -> Option<PermissionDefinition> {
        let inner = self.read();
        inner.index.get(name).map(|&slot| inner.ordered[slot].clone())
    }

    /// Whether `name` is registered.
    pub fn exists(&self, name: &str) -> bool {
        self.read().index.contains_key(name)
    }

    /// All definitions in registration order.
    pub fn get_all(&self) -> Vec<PermissionDefinition> {
        self.read().ordered.clone()
    }

    /// All registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.read().ordered.iter().map(|d| d.name.clone()).collect()
    }

    /// Definitions for one resource, in registration order.
    pub fn get_by_resource(&self, resource: &str) -> Vec<PermissionDefinition> {
        self.filtered(|d| d.resource == resource)
    }

    /// Definitions in one display group, in registration order.
    pub fn get_by_group(&self, group: &str) -> Vec<PermissionDefinition> {
        self.filtered(|d| d.group == group)
    }

    /// Distinct resources in first-seen order.
    pub fn resources(&self) -> Vec<String> {
        self.distinct(|d| &d.resource)
    }

    /// Distinct non-empty groups in first-seen order.
    pub fn groups(&self) -> Vec<String> {
        self.distinct(|d| &d.group)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.read().ordered.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filtered(&self, keep: impl Fn(&PermissionDefinition) -> bool) -> Vec<PermissionDefinition> {
        self.read().ordered.iter().filter(|d| keep(d)).cloned().collect()
    }

    fn distinct(&self, field: impl Fn(&PermissionDefinition) -> &String) -> Vec<String> {
        let inner = self.read();
        let mut out: Vec<String> = Vec::new();
        for def in &inner.ordered {
            let value = field(def);
            if !value.is_empty() && !out.contains(value) {
                out.push(value.clone());
            }
        }
        out
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CatalogInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CatalogInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_name_is_derived() {
        let def = PermissionDefinition::new("user", "update");
        assert_eq!(def.name, "user:update");
        assert_eq!(def.resource, "user");
        assert_eq!(def.action, "update");
    }

    #[test]
    fn test_builtin_definitions() {
        let catalog = PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite);
        assert_eq!(catalog.len(), BUILTIN_DEFINITIONS.len());
        assert!(catalog.exists("user:create"));
        assert!(catalog.exists("role:read"));
        assert!(catalog.exists("system:config"));
        assert!(catalog.exists("dashboard:view"));

        let perm = catalog.get("user:create").unwrap();
        assert_eq!(perm.resource, "user");
        assert_eq!(perm.action, "create");
        assert_eq!(perm.group, "user management");
    }

    #[test]
    fn test_builtin_index_matches_order() {
        let catalog = PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Reject);
        let names = catalog.names();
        assert_eq!(names.len(), 21);
        for (name, (resource, action, _, _)) in names.iter().zip(BUILTIN_DEFINITIONS) {
            assert_eq!(name, &format!("{resource}:{action}"));
            assert_eq!(&catalog.get(name).unwrap().name, name);
        }

        // Built-ins count as registered for the duplicate check.
        let err = catalog
            .register(PermissionDefinition::new("user", "read"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateDefinition(n) if n == "user:read"));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let catalog = PermissionCatalog::new();
        assert!(catalog.get("nope:nothing").is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_get_all_follows_registration_order() {
        let catalog = PermissionCatalog::new();
        for action in ["zeta", "alpha", "mid"] {
            catalog.register(PermissionDefinition::new("doc", action)).unwrap();
        }
        let names = catalog.names();
        assert_eq!(names, vec!["doc:zeta", "doc:alpha", "doc:mid"]);
        // Enumeration is restartable.
        assert_eq!(catalog.get_all().len(), 3);
        assert_eq!(catalog.get_all().len(), 3);
    }

    #[test]
    fn test_get_by_resource_and_group() {
        let catalog = PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite);

        let user_perms = catalog.get_by_resource("user");
        assert_eq!(user_perms.len(), 5);
        assert!(user_perms.iter().all(|p| p.resource == "user"));
        assert_eq!(user_perms[0].name, "user:create");

        let system = catalog.get_by_group("system management");
        assert_eq!(system.len(), 4);

        assert!(catalog.get_by_resource("unknown").is_empty());
    }

    #[test]
    fn test_resources_and_groups_are_distinct() {
        let catalog = PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite);
        assert_eq!(
            catalog.resources(),
            vec!["user", "role", "permission", "system", "dashboard"]
        );
        assert_eq!(catalog.groups().len(), 5);
    }

    #[test]
    fn test_duplicate_overwrites_in_place() {
        let catalog = PermissionCatalog::new();
        catalog.register(PermissionDefinition::new("a", "x")).unwrap();
        catalog.register(PermissionDefinition::new("b", "y")).unwrap();
        catalog
            .register(PermissionDefinition::new("a", "x").with_description("second"))
            .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a:x").unwrap().description, "second");
        // Position of the first registration is kept.
        assert_eq!(catalog.names(), vec!["a:x", "b:y"]);
    }

    #[test]
    fn test_duplicate_rejected_in_strict_mode() {
        let catalog = PermissionCatalog::with_duplicate_policy(DuplicatePolicy::Reject);
        catalog
            .register(PermissionDefinition::new("a", "x").with_description("first"))
            .unwrap();

        let err = catalog
            .register(PermissionDefinition::new("a", "x").with_description("second"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateDefinition(ref n) if n == "a:x"));
        assert_eq!(catalog.get("a:x").unwrap().description, "first");
    }

    #[test]
    fn test_custom_definition_alongside_builtins() {
        let catalog = PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Reject);
        catalog
            .register(
                PermissionDefinition::new("report", "publish")
                    .with_description("Publish reports")
                    .in_group("reporting"),
            )
            .unwrap();
        assert!(catalog.exists("report:publish"));
        assert_eq!(catalog.names().last().unwrap(), "report:publish");
        assert!(catalog.register(PermissionDefinition::new("user", "read")).is_err());
    }
}
