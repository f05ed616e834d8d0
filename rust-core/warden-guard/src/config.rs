// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Warden configuration.
//!
//! Defaults:
//! - lockout: see [`LockoutConfig`] (5 attempts, 15 minute window, fail open)
//! - audit: denials audited, 250 ms sink deadline
//! - catalog: duplicate definitions overwrite
//! - policy: guard policies may name uncatalogued permissions (logged)
//!
//! Every value can be overridden from the environment (`WARDEN_*`) or loaded
//! from JSON. Invalid values are rejected here, at setup time.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_authz::{ConfigurationError, DuplicatePolicy, PermissionCatalog};
use warden_lockout::LockoutConfig;

/// Audit delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Default for guards that do not set `audit_denials` themselves.
    pub audit_denials: bool,
    /// Deadline for handing one record to the sink, in milliseconds.
    pub sink_timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            audit_denials: true,
            sink_timeout_ms: 250,
        }
    }
}

impl AuditConfig {
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }
}

/// Permission catalog settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub duplicate_policy: DuplicatePolicy,
}

impl CatalogConfig {
    /// A catalog holding the built-in definitions under this policy.
    pub fn build_catalog(&self) -> PermissionCatalog {
        PermissionCatalog::with_builtin_definitions(self.duplicate_policy)
    }
}

/// Guard policy validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Reject guard policies that name permissions missing from the catalog.
    pub strict_atoms: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub lockout: LockoutConfig,
    pub audit: AuditConfig,
    pub catalog: CatalogConfig,
    pub policy: PolicyConfig,
}

impl WardenConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a JSON document; missing sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WARDEN_*` overrides from any variable source.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.lockout
            .apply_env(&lookup)
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        if let Some(v) = parse_var(&lookup, "WARDEN_AUDIT_DENIALS")? {
            self.audit.audit_denials = v;
        }
        if let Some(v) = parse_var(&lookup, "WARDEN_AUDIT_TIMEOUT_MS")? {
            self.audit.sink_timeout_ms = v;
        }
        if let Some(strict) = parse_var::<bool, _>(&lookup, "WARDEN_STRICT_CATALOG")? {
            self.catalog.duplicate_policy = if strict {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::Overwrite
            };
        }
        if let Some(v) = parse_var(&lookup, "WARDEN_STRICT_POLICY")? {
            self.policy.strict_atoms = v;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.lockout
            .validate()
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        if self.audit.sink_timeout_ms == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "audit.sink_timeout_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigurationError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidConfig(format!("{name}={raw:?}"))),
    }
}
