// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warden Authorization Model
//
// The permission and role model behind every Warden guard:
//
// - [`catalog`] -- `PermissionCatalog`, the registry of permission definitions.
// - [`bindings`] -- `RoleBindingStore`, role to permission-name bindings.
// - [`policy`] -- `Policy`, composable AND/OR/owner/conditional expressions.
// - [`spec`] -- `PolicySpec`, the JSON form of closure-free policies.
// - [`evaluator`] -- `PolicyEvaluator`, short-circuiting evaluation and
//   denial diagnostics.
// - [`principal`] -- `Principal`, `RoleSet` and `CallContext`.
//
// The catalog and bindings are built once at startup and shared behind
// `Arc`s. Nothing in this crate performs I/O.
//
// # Example
//
// ```rust
// use std::sync::Arc;
// use warden_authz::{
//     CallContext, DuplicatePolicy, PermissionCatalog, Policy, PolicyEvaluator, Principal,
//     RoleBindingStore, RoleSet,
// };
//
// let catalog = Arc::new(PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite));
// let bindings = Arc::new(RoleBindingStore::new());
// bindings.assign_permission("editor", "user:update");
//
// let evaluator = PolicyEvaluator::new(catalog, bindings);
// let roles: RoleSet = ["editor".to_string()].into_iter().collect();
// let policy = Policy::owner_or_permission("user_id", "user:delete");
// let ctx = CallContext::new().with_param("user_id", "u1");
//
// assert!(evaluator.evaluate(&policy, &Principal::new("u1"), &roles, &ctx));
// assert!(!evaluator.evaluate(&policy, &Principal::new("u2"), &roles, &ctx));
// ```

pub mod bindings;
pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod policy;
pub mod principal;
pub mod spec;

pub use bindings::RoleBindingStore;
pub use catalog::{DuplicatePolicy, PermissionCatalog, PermissionDefinition};
pub use error::ConfigurationError;
pub use evaluator::{Evaluation, PolicyEvaluator};
pub use policy::{Operator, Policy, Predicate};
pub use principal::{CallContext, Principal, RoleSet};
pub use spec::PolicySpec;
