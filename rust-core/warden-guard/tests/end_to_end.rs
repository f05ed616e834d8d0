// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end guard scenarios: identity, lockout, policy and audit together

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use warden_audit::{AuditError, AuditOutcome, AuditRecord, AuditSink, MemoryAuditLog};
use warden_authz::{
    CallContext, DuplicatePolicy, Operator, PermissionCatalog, Policy, PolicyEvaluator, Predicate,
    Principal, RoleBindingStore, RoleSet,
};
use warden_cache::{FaultyCache, InMemoryCache};
use warden_guard::{
    AccessError, ErrorKind, IdentityResolver, LoginError, RoleSource, StaticDirectory, Warden,
};
use warden_lockout::{FailureMode, LockoutConfig, LockoutTracker};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Fixture {
    warden: Warden,
    directory: Arc<StaticDirectory>,
    log: MemoryAuditLog,
    cache: FaultyCache<InMemoryCache>,
}

fn fixture_with(failure_mode: FailureMode) -> Fixture {
    let catalog = Arc::new(PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite));
    let bindings = Arc::new(RoleBindingStore::new());
    bindings.assign_permission("editor", "user:update");

    let directory = Arc::new(StaticDirectory::new("subject"));
    directory.insert(Principal::new("u1"), ["editor"]);
    directory.insert(Principal::new("u2"), ["editor"]);
    directory.insert(Principal::new("u3"), Vec::<String>::new());

    let cache = FaultyCache::new(InMemoryCache::new());
    let tracker = LockoutTracker::new(
        Arc::new(cache.clone()),
        LockoutConfig {
            max_attempts: 3,
            failure_mode,
            ..LockoutConfig::default()
        },
    )
    .unwrap();

    let log = MemoryAuditLog::default();
    let warden = Warden::new(
        PolicyEvaluator::new(catalog, bindings),
        directory.clone(),
        directory.clone(),
        Arc::new(log.clone()),
    )
    .with_lockout(tracker);

    Fixture {
        warden,
        directory,
        log,
        cache,
    }
}

fn fixture() -> Fixture {
    fixture_with(FailureMode::FailOpen)
}

fn as_user(id: &str) -> CallContext {
    CallContext::new().with_param("subject", id)
}

/// Sink that always fails, optionally after a delay.
struct BrokenSink {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl AuditSink for BrokenSink {
    async fn append(&self, _record: AuditRecord) -> Result<(), AuditError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Err(AuditError::SinkUnavailable("disk full".into()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Resolver that counts how often it is consulted and never finds anyone.
#[derive(Default)]
struct Anonymous {
    resolved: AtomicUsize,
}

#[async_trait]
impl IdentityResolver for Anonymous {
    async fn current_principal(&self, _ctx: &CallContext) -> Option<Principal> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        None
    }
}

#[async_trait]
impl RoleSource for Anonymous {
    async fn roles_of(&self, _principal_id: &str) -> RoleSet {
        panic!("roles must not be looked up for an unauthenticated call");
    }
}

// ---------------------------------------------------------------------------
// Policy scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_permission_allows_and_audits_once() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .build()
        .unwrap();

    let result = guard.invoke(&as_user("u1"), |_| async { "updated" }).await;
    assert_eq!(result, Ok("updated"));

    let entries = f.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::Allowed);
    assert_eq!(entries[0].action, "user:update");
    assert_eq!(entries[0].resource_type, "user");
}

#[tokio::test]
async fn test_and_policy_reports_missing_permission() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:delete")
        .require_permissions(Operator::And, ["user:update", "user:delete"])
        .build()
        .unwrap();

    let ran = AtomicBool::new(false);
    let ran_ref = &ran;
    let err = guard
        .invoke(&as_user("u1"), move |_| async move {
            ran_ref.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap_err();

    match &err {
        AccessError::PermissionDenied {
            missing_permissions,
            ..
        } => assert_eq!(missing_permissions, &vec!["user:delete".to_string()]),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
    assert_eq!(err.status_code(), 403);
    assert!(!ran.load(Ordering::SeqCst), "operation ran without authorization");

    let decision = guard.check(&as_user("u1")).await;
    assert_eq!(decision.error_kind, Some(ErrorKind::PermissionDenied));
    assert_eq!(decision.missing_permissions, vec!["user:delete"]);
}

#[tokio::test]
async fn test_owner_or_permission() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::owner_or_permission("user_id", "user:update"))
        .resource_id_param("user_id")
        .build()
        .unwrap();

    // u3 holds nothing but owns the resource.
    let own = as_user("u3").with_param("user_id", "u3");
    assert!(guard.authorize(&own).await.is_ok());

    // u3 on someone else's resource is denied.
    let other = as_user("u3").with_param("user_id", "u1");
    assert!(matches!(
        guard.authorize(&other).await,
        Err(AccessError::PermissionDenied { .. })
    ));

    // u2 holds user:update and may act on anyone.
    assert!(guard.authorize(&as_user("u2").with_param("user_id", "u1")).await.is_ok());

    let records = f.log.entries();
    assert_eq!(records[0].resource_id.as_deref(), Some("u3"));
    assert_eq!(records[1].outcome, AuditOutcome::Denied);
}

#[tokio::test]
async fn test_conditional_policy_and_short_circuit() {
    let f = fixture();
    let bulk_only = f
        .warden
        .guard("user:delete")
        .policy(Policy::conditional(
            Predicate::param_equals("mode", "bulk"),
            Policy::has("user:delete"),
        ))
        .build()
        .unwrap();

    assert!(bulk_only
        .authorize(&as_user("u1").with_param("mode", "single"))
        .await
        .is_ok());
    assert!(bulk_only
        .authorize(&as_user("u1").with_param("mode", "bulk"))
        .await
        .is_err());

    // The predicate would panic if evaluated; the failing first operand
    // decides the AND before it is reached.
    let guarded = f
        .warden
        .guard("user:delete")
        .policy(Policy::And(vec![
            Policy::has("user:delete"),
            Policy::conditional(
                Predicate::new("explodes", |_| panic!("evaluated after decision")),
                Policy::has("user:update"),
            ),
        ]))
        .build()
        .unwrap();
    let err = guarded.authorize(&as_user("u1")).await.unwrap_err();
    assert_eq!(err.kind(), "PermissionDenied");
}

#[tokio::test]
async fn test_conditional_denial_lists_inner_permission() {
    let f = fixture();
    f.warden
        .evaluator()
        .bindings()
        .assign_permission("editor", "user:read");
    let guard = f
        .warden
        .guard("user:list")
        .policy(Policy::And(vec![
            Policy::has("user:read"),
            Policy::conditional(Predicate::param_equals("scope", "all"), Policy::has("user:list")),
        ]))
        .build()
        .unwrap();

    let err = guard
        .authorize(&as_user("u1").with_param("scope", "all"))
        .await
        .unwrap_err();
    match &err {
        AccessError::PermissionDenied {
            missing_permissions,
            ..
        } => assert_eq!(missing_permissions, &vec!["user:list".to_string()]),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }

    let decision = guard.check(&as_user("u1").with_param("scope", "all")).await;
    assert_eq!(decision.missing_permissions, vec!["user:list"]);
    assert!(guard
        .authorize(&as_user("u1").with_param("scope", "own"))
        .await
        .is_ok());
}

// ---------------------------------------------------------------------------
// Authentication and lockout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unauthenticated_never_reaches_policy() {
    let catalog = Arc::new(PermissionCatalog::new());
    let bindings = Arc::new(RoleBindingStore::new());
    let anonymous = Arc::new(Anonymous::default());
    let log = MemoryAuditLog::default();
    let warden = Warden::new(
        PolicyEvaluator::new(catalog, bindings),
        anonymous.clone(),
        anonymous.clone(),
        Arc::new(log.clone()),
    );
    let guard = warden
        .guard("user:read")
        .policy(Policy::conditional(
            Predicate::new("explodes", |_| panic!("policy evaluated")),
            Policy::has("user:read"),
        ))
        .build()
        .unwrap();

    let err = guard.authorize(&CallContext::new()).await.unwrap_err();
    assert_eq!(err, AccessError::AuthenticationRequired);
    assert_eq!(err.status_code(), 401);
    assert_eq!(anonymous.resolved.load(Ordering::SeqCst), 1);

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].actor.is_none());
    assert_eq!(entries[0].outcome, AuditOutcome::Denied);
}

#[tokio::test]
async fn test_unknown_subject_is_unauthenticated() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .build()
        .unwrap();
    f.directory.remove("u1");
    assert_eq!(
        guard.authorize(&as_user("u1")).await,
        Err(AccessError::AuthenticationRequired)
    );
}

#[tokio::test]
async fn test_locked_origin_blocks_before_policy() {
    let f = fixture();
    let gate = f.warden.login_gate().unwrap();
    for _ in 0..3 {
        let err = gate
            .attempt("attacker", Some("198.51.100.9"), || async { false })
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials { .. }));
    }

    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .check_lockout(true)
        .build()
        .unwrap();

    // u1 never failed, but shares the locked origin.
    let from_locked = as_user("u1").with_origin("198.51.100.9");
    let err = guard.authorize(&from_locked).await.unwrap_err();
    assert_eq!(err, AccessError::AccountLocked);
    assert_eq!(err.status_code(), 423);

    // Same user from a clean origin is fine.
    assert!(guard
        .authorize(&as_user("u1").with_origin("192.0.2.1"))
        .await
        .is_ok());

    // The login gate refuses the locked pair without verifying.
    assert_eq!(
        gate.attempt("u1", Some("198.51.100.9"), || async { true }).await,
        Err(LoginError::AccountLocked)
    );
}

#[tokio::test]
async fn test_cache_outage_fails_open_by_default() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .check_lockout(true)
        .build()
        .unwrap();
    f.cache.set_unavailable(true);

    assert!(guard.authorize(&as_user("u1").with_origin("o")).await.is_ok());
    let gate = f.warden.login_gate().unwrap();
    assert!(gate.attempt("u1", Some("o"), || async { true }).await.is_ok());
}

#[tokio::test]
async fn test_cache_outage_fails_closed_when_configured() {
    let f = fixture_with(FailureMode::FailClosed);
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .check_lockout(true)
        .build()
        .unwrap();
    f.cache.set_unavailable(true);

    assert_eq!(
        guard.authorize(&as_user("u1")).await,
        Err(AccessError::AccountLocked)
    );
}

// ---------------------------------------------------------------------------
// Audit isolation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_audit_failure_never_changes_decision() {
    let catalog = Arc::new(PermissionCatalog::with_builtin_definitions(DuplicatePolicy::Overwrite));
    let bindings = Arc::new(RoleBindingStore::new());
    bindings.assign_permission("editor", "user:update");
    let directory = Arc::new(StaticDirectory::new("subject"));
    directory.insert(Principal::new("u1"), ["editor"]);

    for delay in [Duration::ZERO, Duration::from_secs(30)] {
        let sink = Arc::new(BrokenSink {
            delay,
            calls: AtomicUsize::new(0),
        });
        let warden = Warden::new(
            PolicyEvaluator::new(catalog.clone(), bindings.clone()),
            directory.clone(),
            directory.clone(),
            sink.clone(),
        );
        let allow = warden
            .guard("user:update")
            .policy(Policy::has("user:update"))
            .build()
            .unwrap();
        let deny = warden
            .guard("user:delete")
            .policy(Policy::has("user:delete"))
            .build()
            .unwrap();

        assert_eq!(
            allow.invoke(&as_user("u1"), |_| async { 7 }).await,
            Ok(7)
        );
        assert!(matches!(
            deny.authorize(&as_user("u1")).await,
            Err(AccessError::PermissionDenied { .. })
        ));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }
}

#[tokio::test]
async fn test_allowed_record_committed_before_operation() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .build()
        .unwrap();

    let log = f.log.clone();
    let seen = guard
        .invoke(&as_user("u1"), move |_| async move { log.len() })
        .await
        .unwrap();
    assert_eq!(seen, 1);
}

#[tokio::test]
async fn test_concurrent_guard_invocations() {
    let f = fixture();
    let guard = f
        .warden
        .guard("user:update")
        .policy(Policy::has("user:update"))
        .build()
        .unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let guard = guard.clone();
            tokio::spawn(async move {
                let who = if i % 2 == 0 { "u1" } else { "u3" };
                guard.authorize(&as_user(who)).await.is_ok()
            })
        })
        .collect();

    let mut allowed = 0;
    for task in futures::future::join_all(tasks).await {
        if task.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 16);
    assert_eq!(f.log.len(), 32);
    assert_eq!(f.log.with_outcome(AuditOutcome::Denied).len(), 16);
}
