//! Contract Test: DreamHost Resources Under the Reconciler
//!
//! Constraints verified:
//! - A missing CNAME is created once and adopted by the next run
//! - A record stored with a trailing dot satisfies the declaration
//! - Teardown removes only ensured records and can be repeated
//! - Domain names can be found but never minted
//! - A provider failure aborts the run with nothing bound or changed

mod common;

use common::*;
use converge_core::config::DeployConfig;
use converge_core::diagnostics::{CollectingReporter, Reporter};
use converge_core::engine::{Reconciler, ReconcileEvent};
use converge_core::error::Error;
use converge_core::registry::BlankRegistry;
use converge_provider_dreamhost::{CNAME_KIND, DOMAIN_NAME_KIND, register_with_env};
use serde_json::json;
use std::sync::Arc;

fn registry_for(env: &Arc<MockEnvironment>) -> Arc<BlankRegistry> {
    let registry = BlankRegistry::new();
    register_with_env(&registry, env.clone());
    Arc::new(registry)
}

fn site(resources: serde_json::Value) -> DeployConfig {
    let doc = json!({
        "bindings": { "web_host": "host.example.net" },
        "resources": resources,
    });
    DeployConfig::from_json_str(&doc.to_string(), "site.json").unwrap()
}

fn blog() -> serde_json::Value {
    json!({
        "kind": CNAME_KIND,
        "name": "blog.example.com",
        "properties": { "PointsTo": { "$ref": "web_host" } }
    })
}

fn domain() -> serde_json::Value {
    json!({ "kind": DOMAIN_NAME_KIND, "name": "example.com", "action": "find" })
}

fn reconciler(env: &Arc<MockEnvironment>, config: DeployConfig) -> (Reconciler, Arc<CollectingReporter>) {
    let reporter = Arc::new(CollectingReporter::new());
    let (reconciler, _events) = Reconciler::new(registry_for(env), reporter.clone(), config)
        .expect("reconciler construction succeeds");
    (reconciler, reporter)
}

#[tokio::test]
async fn missing_cname_is_created_then_adopted() {
    let env = Arc::new(MockEnvironment::new());

    let (first, reporter) = reconciler(&env, site(json!([blog()])));
    let summary = first.apply().await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(env.inserts(), 1);
    assert!(!reporter.has_errors());

    let record = &env.records()[0];
    assert_eq!(record.record, "blog.example.com");
    assert_eq!(record.record_type, "CNAME");
    assert_eq!(record.value, "host.example.net");

    // A fresh run sees the record and leaves it alone
    let (second, _) = reconciler(&env, site(json!([blog()])));
    let summary = second.apply().await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.already_existed, 1);
    assert_eq!(env.inserts(), 1);
}

#[tokio::test]
async fn trailing_dot_record_is_already_converged() {
    let env = Arc::new(
        MockEnvironment::new()
            .with_record("blog.example.com", "CNAME", "host.example.net.", "example.com"),
    );

    let (reconciler, _) = reconciler(&env, site(json!([blog()])));
    let summary = reconciler.apply().await.unwrap();

    assert_eq!(summary.found, 1);
    assert_eq!(summary.already_existed, 1);
    assert_eq!(env.mutations(), 0);
}

#[tokio::test]
async fn teardown_twice_is_a_noop_the_second_time() {
    let env = Arc::new(
        MockEnvironment::new()
            .with_record("example.com", "A", "192.0.2.10", "example.com")
            .with_record("blog.example.com", "CNAME", "host.example.net.", "example.com"),
    );

    let (reconciler, _) = reconciler(&env, site(json!([domain(), blog()])));

    let summary = reconciler.tear_down().await.unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(env.deletes(), 1);

    let summary = reconciler.tear_down().await.unwrap();
    assert_eq!(summary.removed, 0);
    assert_eq!(summary.already_absent, 1);
    assert_eq!(env.deletes(), 1);

    // The found domain keeps its records
    assert_eq!(env.records().len(), 1);
    assert_eq!(env.records()[0].record_type, "A");
}

#[tokio::test]
async fn domain_is_found_with_every_record() {
    let env = Arc::new(
        MockEnvironment::new()
            .with_record("example.com", "A", "192.0.2.10", "example.com")
            .with_record("www.example.com", "CNAME", "example.com.", "example.com")
            .with_record("other.org", "A", "192.0.2.20", "other.org"),
    );
    let reporter = Arc::new(CollectingReporter::new());
    let (reconciler, mut events) =
        Reconciler::new(registry_for(&env), reporter.clone(), site(json!([domain()]))).unwrap();

    let summary = reconciler.apply().await.unwrap();
    assert_eq!(summary.found, 1);
    assert_eq!(env.mutations(), 0);

    let mut found = None;
    while let Ok(event) = events.try_recv() {
        if let ReconcileEvent::InitialDetermined { resource, found: f } = event {
            found = Some((resource, f));
        }
    }
    assert_eq!(found, Some(("dreamhost.DomainName[example.com]".to_string(), true)));
}

#[tokio::test]
async fn minting_a_domain_halts_the_run() {
    let env = Arc::new(MockEnvironment::new());
    let declared = json!([
        { "kind": DOMAIN_NAME_KIND, "name": "example.com" },
        blog(),
    ]);

    let (reconciler, reporter) = reconciler(&env, site(declared));
    let err = reconciler.apply().await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    let diagnostics = reporter.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "cannot create domain names automatically; use find"
    );
    assert_eq!(diagnostics[0].loc.to_string(), "site.json[1]");
    assert_eq!(env.mutations(), 0);
}

#[tokio::test]
async fn invalid_property_halts_before_any_insert() {
    let env = Arc::new(MockEnvironment::new());
    let declared = json!([
        {
            "kind": CNAME_KIND,
            "name": "www.example.com",
            "properties": { "PointsTo": "host.example.net", "Ttl": 300 }
        },
        blog(),
    ]);

    let (reconciler, reporter) = reconciler(&env, site(declared));
    let err = reconciler.apply().await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(reporter.len(), 1);
    assert_eq!(env.inserts(), 0);
}

#[tokio::test]
async fn provider_failure_aborts_the_run() {
    let registry = BlankRegistry::new();
    register_with_env(&registry, Arc::new(BrokenEnvironment));
    let reporter = Arc::new(CollectingReporter::new());
    let (reconciler, mut events) = Reconciler::new(
        Arc::new(registry),
        reporter.clone(),
        site(json!([domain(), blog()])),
    )
    .unwrap();

    let err = reconciler.apply().await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert!(!err.is_fatal_internal());
    assert!(!reporter.has_errors());

    // The domain lookup failed first; nothing was determined or applied
    while let Ok(event) = events.try_recv() {
        assert!(
            matches!(event, ReconcileEvent::Started { .. }),
            "unexpected event: {event:?}"
        );
    }

    let err = reconciler.tear_down().await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
}
