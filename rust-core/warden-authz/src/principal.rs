// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Principals and call contexts.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The roles a principal holds, as supplied by the identity layer.
pub type RoleSet = BTreeSet<String>;

/// The authenticated actor making a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identity, compared against owner parameters.
    pub id: String,
    /// Inactive principals satisfy no policy at all.
    pub active: bool,
    /// Superusers satisfy every permission atom.
    pub superuser: bool,
}

impl Principal {
    /// An active, non-privileged principal.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active: true,
            superuser: false,
        }
    }

    /// An active superuser.
    pub fn superuser(id: impl Into<String>) -> Self {
        Self {
            superuser: true,
            ..Self::new(id)
        }
    }

    /// A deactivated principal.
    pub fn inactive(id: impl Into<String>) -> Self {
        Self {
            active: false,
            ..Self::new(id)
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// The named parameters and request origin of one guarded call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Named call arguments (route parameters, form fields, ...).
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// Network origin of the request, used for origin-scoped lockout.
    #[serde(default)]
    pub origin: Option<String>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Look up a named parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
