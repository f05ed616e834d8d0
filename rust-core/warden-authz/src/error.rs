// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Setup-time error types.
//!
//! Everything here is raised while the catalog, role bindings and guard
//! policies are being assembled. None of these errors can occur while a
//! request is being evaluated.

use thiserror::Error;

/// A malformed policy or catalog definition.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("duplicate permission definition: {0}")]
    DuplicateDefinition(String),

    #[error("empty {kind} name in policy")]
    EmptyAtom { kind: &'static str },

    #[error("{0} combinator has no operands")]
    EmptyComposite(&'static str),

    #[error("policy references permission not in catalog: {0}")]
    UnknownPermission(String),

    #[error("invalid policy spec: {0}")]
    InvalidPolicySpec(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
