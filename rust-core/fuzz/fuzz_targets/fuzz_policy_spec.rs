// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the JSON policy parser.
// Run with: cargo +nightly fuzz run fuzz_policy_spec
//
// Arbitrary input must either be rejected with a ConfigurationError or
// produce a policy that validates and evaluates without panicking.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use warden_authz::{
    CallContext, DuplicatePolicy, PermissionCatalog, Policy, PolicyEvaluator, Principal,
    RoleBindingStore, RoleSet,
};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 4096 {
        return;
    }
    let Ok(policy) = Policy::from_json(input) else {
        return;
    };

    // Parsed policies are structurally valid by construction.
    assert!(policy.validate().is_ok());

    let catalog = Arc::new(PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite));
    let bindings = Arc::new(RoleBindingStore::with_default_roles(&catalog));
    let evaluator = PolicyEvaluator::new(catalog, bindings);
    let roles: RoleSet = ["manager".to_string()].into_iter().collect();
    let ctx = CallContext::new().with_param("user_id", "fuzz");

    let principal = Principal::new("fuzz");
    let eval = evaluator.explain(&policy, &principal, &roles, &ctx);
    assert_eq!(eval.granted, evaluator.evaluate(&policy, &principal, &roles, &ctx));
    if eval.granted {
        assert!(eval.missing_permissions.is_empty() && eval.missing_roles.is_empty());
    }
    let _ = evaluator.validate(&policy, false);
    let _ = policy.to_string();
});
