// # DreamHost DNS Resources
//
// This crate provides DreamHost DNS resource kinds for the converge
// reconciler:
//
// - `dreamhost.DomainName`: find-only; aggregates every record in a domain
// - `dreamhost.CNAME`: create-or-adopt CNAME records (`PointsTo` property)
//
// It also provides a named driver, `dreamhost.DreamhostEnv`, so other modules
// in the same run can assert DNS records (see [`assert_dns_record`]).
//
// ## Behavior Summary
//
// - ✅ One list request per state determination
// - ✅ Create when missing, adopt when present (existing values are never changed)
// - ✅ Trailing-dot tolerant value comparison
// - ✅ Idempotent teardown
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry or backoff (a failed call aborts the run)
// - ❌ NO value updates (a conflicting value is an error)
//
// ## Security Requirements
//
// - API key NEVER appears in logs
// - API key MUST be provided via the `DH_API_KEY` environment variable
//
// ## API Reference
//
// - DreamHost API: https://help.dreamhost.com/hc/en-us/articles/217560167-API-overview
// - DNS commands: `dns-list_records`, `dns-add_record`, `dns-remove_record`

pub mod cname;
pub mod domain;
pub mod env;
pub mod record;

pub use cname::{CnameBlank, CnameCreator, CnameModel};
pub use domain::{DomainModel, DomainNameBlank, DomainNameFinder};
pub use env::{DnsEnvironment, DreamhostEnv};
pub use record::{DnsRecord, values_equivalent};

use converge_core::{BlankRegistry, Error, Result};
use std::sync::Arc;

/// Name of the driver other modules can obtain
pub const DRIVER_NAME: &str = "dreamhost.DreamhostEnv";

/// Kind name of the domain finder
pub const DOMAIN_NAME_KIND: &str = "dreamhost.DomainName";

/// Kind name of the CNAME creator
pub const CNAME_KIND: &str = "dreamhost.CNAME";

/// Register the DreamHost module with a registry
///
/// Reads the API key from `DH_API_KEY`. Without it nothing is registered and
/// a configuration error is returned; the host should report it and carry on
/// without this module.
///
/// # Example
///
/// ```rust,no_run
/// use converge_core::BlankRegistry;
///
/// let registry = BlankRegistry::new();
/// if let Err(e) = converge_provider_dreamhost::register_with_driver(&registry) {
///     eprintln!("DreamHost module disabled: {}", e);
/// }
/// ```
pub fn register_with_driver(registry: &BlankRegistry) -> Result<()> {
    let env = DreamhostEnv::from_env()
        .map_err(|e| Error::config(format!("cannot initialize DreamHost API: {}", e)))?;
    let env = Arc::new(env);

    registry.provide_driver(DRIVER_NAME, env.clone());
    register_with_env(registry, env);
    Ok(())
}

/// Register the resource kinds over a given environment
pub fn register_with_env(registry: &BlankRegistry, env: Arc<dyn DnsEnvironment>) {
    registry.register_blank(DOMAIN_NAME_KIND, Box::new(DomainNameBlank::new(env.clone())));
    registry.register_blank(CNAME_KIND, Box::new(CnameBlank::new(env)));
}

/// Ensure `key` is a CNAME for `value` using the registered driver
pub async fn assert_dns_record(
    registry: &BlankRegistry,
    zone: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let env = registry
        .obtain_driver::<DreamhostEnv>(DRIVER_NAME)
        .ok_or_else(|| Error::config("DreamHost module is not registered"))?;
    env.assert_dns_record(zone, key, value).await
}
