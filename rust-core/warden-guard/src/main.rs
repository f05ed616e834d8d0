// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! warden-roles: inspect the built-in permission model.
//!
//! - `catalog` lists permission definitions (optionally one group).
//! - `roles` prints each default role's effective permissions.
//! - `check` evaluates a JSON policy for a principal holding given roles and
//!   prints the access decision.
//!
//! Configuration comes from `WARDEN_*` environment variables; logging from
//! `RUST_LOG` (default `info`).

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use warden_authz::{CallContext, Policy, PolicyEvaluator, Principal, RoleBindingStore, RoleSet};
use warden_guard::{AccessDecision, AccessError, WardenConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "warden-roles", version = VERSION, about = "Inspect Warden permissions and roles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List permission definitions.
    Catalog {
        /// Only this display group.
        #[arg(long)]
        group: Option<String>,
    },
    /// Show effective permissions of default roles (all if none given).
    Roles { roles: Vec<String> },
    /// Evaluate a JSON policy.
    Check {
        /// Policy in JSON form, e.g. '{"type":"has","permission":"user:read"}'.
        #[arg(long)]
        policy: String,
        /// Principal id.
        #[arg(long, default_value = "cli")]
        principal: String,
        /// Roles held by the principal.
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
        /// Call parameters as key=value.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Treat the principal as a superuser.
        #[arg(long)]
        superuser: bool,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = WardenConfig::from_env()?;
    let catalog = Arc::new(config.catalog.build_catalog());
    let bindings = Arc::new(RoleBindingStore::with_default_roles(&catalog));

    let output = match cli.command {
        Command::Catalog { group } => {
            let defs = match group {
                Some(group) => catalog.get_by_group(&group),
                None => catalog.get_all(),
            };
            serde_json::to_value(defs)?
        }
        Command::Roles { roles } => {
            let roles = if roles.is_empty() { bindings.roles() } else { roles };
            let table: BTreeMap<&str, Vec<String>> = roles
                .iter()
                .map(|role| (role.as_str(), bindings.permissions_of(role).into_iter().collect()))
                .collect();
            json!({
                "roles": table,
                "dangling": bindings.dangling_bindings(&catalog),
            })
        }
        Command::Check {
            policy,
            principal,
            roles,
            params,
            superuser,
        } => {
            let policy = Policy::from_json(&policy)?;
            let evaluator = PolicyEvaluator::new(catalog, bindings);
            evaluator.validate(&policy, config.policy.strict_atoms)?;

            let principal = if superuser {
                Principal::superuser(principal)
            } else {
                Principal::new(principal)
            };
            let roles: RoleSet = roles.into_iter().collect();
            let ctx = params
                .into_iter()
                .fold(CallContext::new(), |ctx, (k, v)| ctx.with_param(k, v));

            let evaluation = evaluator.explain(&policy, &principal, &roles, &ctx);
            let decision = if evaluation.granted {
                AccessDecision::allow()
            } else {
                AccessDecision::from(&AccessError::PermissionDenied {
                    message: format!("policy {policy} not satisfied"),
                    missing_permissions: evaluation.missing_permissions,
                    missing_roles: evaluation.missing_roles,
                })
            };
            serde_json::to_value(decision)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
