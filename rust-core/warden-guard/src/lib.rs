// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warden Access Guard
//
// The request-time entry point. A `Warden` holds the shared services; an
// `AccessGuard` built from it wraps one protected operation:
//
// 1. resolve the principal (`IdentityResolver`), else `AuthenticationRequired`
// 2. optionally refuse locked users and origins (`LockoutTracker`), `AccountLocked`
// 3. evaluate the policy (`PolicyEvaluator`), else `PermissionDenied` with the
//    missing atoms
// 4. audit the decision (`AuditSink`) and only then run the operation
//
// `LoginGate` applies the lockout tracker to the authentication endpoint
// itself.
//
// # Modules
//
// - [`guard`] -- `Warden`, `GuardBuilder`, `AccessGuard`.
// - [`login`] -- `LoginGate`.
// - [`identity`] -- collaborator traits and `StaticDirectory`.
// - [`decision`] -- the serializable `AccessDecision` surface.
// - [`config`] -- `WardenConfig` and its sections.
// - [`error`] -- `AccessError`, `LoginError`.

pub mod config;
pub mod decision;
pub mod error;
pub mod guard;
pub mod identity;
pub mod login;

pub use config::{AuditConfig, CatalogConfig, PolicyConfig, WardenConfig};
pub use decision::{AccessDecision, ErrorKind};
pub use error::{AccessError, LoginError};
pub use guard::{AccessGuard, GuardBuilder, ResourceExtractor, Warden};
pub use identity::{IdentityResolver, RoleSource, StaticDirectory};
pub use login::LoginGate;
