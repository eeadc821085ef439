// # DreamHost Environment Client
//
// Thin adapter over the DreamHost DNS API. Every call is a single GET:
//
// ```http
// GET https://api.dreamhost.com/?key=<key>&cmd=dns-list_records&format=json
// GET https://api.dreamhost.com/?key=<key>&cmd=dns-add_record&format=json&record=<name>&type=<type>&value=<value>
// GET https://api.dreamhost.com/?key=<key>&cmd=dns-remove_record&format=json&record=<name>&type=<type>&value=<value>
// ```
//
// Responses are `{"result": "success" | ..., "data": [...] | "..."}`. A
// non-200 status or a result other than "success" is an error.
//
// ## Security Requirements
//
// - API key NEVER appears in logs or error messages
// - API key MUST be provided via the `DH_API_KEY` environment variable
//
// There is no retry or backoff here. A failure is returned to the caller,
// which aborts the run.

use async_trait::async_trait;
use converge_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::record::{DnsRecord, values_equivalent};

/// DreamHost API endpoint
pub const DREAMHOST_API_BASE: &str = "https://api.dreamhost.com/";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "DH_API_KEY";

/// Environment variable enabling dry-run mode
pub const DRY_RUN_VAR: &str = "CONVERGE_DRY_RUN";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "dreamhost";

/// Provider primitives the DNS resources are built on
///
/// `DreamhostEnv` talks to the real API; tests substitute their own.
#[async_trait]
pub trait DnsEnvironment: Send + Sync {
    /// Every record in zone `name`, or whose name ends in `name`
    async fn records_for(&self, name: &str) -> Result<Vec<DnsRecord>>;

    /// Value of the record with exactly this type and name
    async fn find_record(&self, record_type: &str, name: &str) -> Result<Option<String>> {
        let records = self.records_for(name).await?;
        Ok(records
            .into_iter()
            .find(|r| r.is(record_type, name))
            .map(|r| r.value))
    }

    /// Add a record unless an equivalent one exists
    ///
    /// A record with the same name and type but a different value is an
    /// [`Error::Conflict`]; values are never changed in place.
    async fn insert_record(&self, name: &str, record_type: &str, value: &str) -> Result<()>;

    /// Remove the record with this name and type; absent is not an error
    async fn delete_record(&self, name: &str, record_type: &str) -> Result<()>;

    /// Ensure `key` is a CNAME for `value`
    ///
    /// `key` may be given fully qualified; DreamHost wants it without the
    /// trailing dot.
    async fn assert_dns_record(&self, zone: &str, key: &str, value: &str) -> Result<()> {
        let key = key.strip_suffix('.').unwrap_or(key);
        tracing::debug!("Asserting CNAME {} -> {} in zone {}", key, value, zone);
        self.insert_record(key, "CNAME", value).await
    }
}

/// `{result, data}` wrapper around every response
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(alias = "Result")]
    result: String,
    #[serde(alias = "Data", default)]
    data: serde_json::Value,
}

impl Envelope {
    fn data_text(&self) -> String {
        match &self.data {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// DreamHost API client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all list requests
/// - Log the intended add/remove
/// - **NOT** actually modify DNS records
pub struct DreamhostEnv {
    /// DreamHost API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API endpoint
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: list normally but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for DreamhostEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DreamhostEnv")
            .field("api_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DreamhostEnv {
    /// Create a new client
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: the key is empty or the HTTP client could not
    ///   be built
    pub fn new(api_key: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("DreamHost API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            endpoint: DREAMHOST_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a client that modifies records
    pub fn new_live(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, false)
    }

    /// Create a client that only logs what it would modify
    pub fn new_dry_run(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, true)
    }

    /// Create a client from `DH_API_KEY` (and `CONVERGE_DRY_RUN`)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("no {} env var set", API_KEY_VAR);
            return Err(Error::config(format!("no {} env var set", API_KEY_VAR)));
        }

        let dry_run = matches!(
            std::env::var(DRY_RUN_VAR).unwrap_or_default().as_str(),
            "1" | "true"
        );
        if dry_run {
            tracing::warn!("DreamHost client running in DRY-RUN mode - no changes will be made");
        }

        Self::new(api_key, dry_run)
    }

    /// Point the client at another endpoint (e.g., a local test server)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Issue one API command and unwrap the envelope
    async fn call(&self, cmd: &str, params: &[(&str, &str)]) -> Result<Envelope> {
        let mut query: Vec<(&str, &str)> =
            vec![("key", self.api_key.as_str()), ("cmd", cmd), ("format", "json")];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            // The URL carries the key
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::provider(
                PROVIDER,
                format!("{} returned error status: {} - {}", cmd, status, error_text),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to read response: {}", e.without_url())))?;

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if envelope.result != "success" {
            return Err(Error::provider(
                PROVIDER,
                format!("{} failed: {}", cmd, envelope.data_text()),
            ));
        }

        Ok(envelope)
    }

    async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        let envelope = self.call("dns-list_records", &[]).await?;
        serde_json::from_value(envelope.data).map_err(|e| {
            Error::provider(PROVIDER, format!("Invalid response format: {}", e))
        })
    }
}

#[async_trait]
impl DnsEnvironment for DreamhostEnv {
    async fn records_for(&self, name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Finding records for {}", name);
        let records: Vec<DnsRecord> = self
            .list_records()
            .await?
            .into_iter()
            .filter(|r| r.belongs_to(name))
            .collect();
        tracing::debug!("{} record(s) for {}", records.len(), name);
        Ok(records)
    }

    async fn insert_record(&self, name: &str, record_type: &str, value: &str) -> Result<()> {
        let current = self.records_for(name).await?;
        if let Some(existing) = current.iter().find(|r| r.is(record_type, name)) {
            if !values_equivalent(value, &existing.value) {
                tracing::warn!(
                    "have {} but it has value {}, not {}",
                    name,
                    existing.value,
                    value
                );
                return Err(Error::conflict(name, existing.value.clone(), value));
            }
            tracing::debug!("{} {} already has value {}", record_type, name, existing.value);
            return Ok(());
        }

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would add {} {} -> {}", record_type, name, value);
            return Ok(());
        }

        self.call(
            "dns-add_record",
            &[("record", name), ("type", record_type), ("value", value)],
        )
        .await?;
        tracing::info!("Added {} {} -> {}", record_type, name, value);
        Ok(())
    }

    async fn delete_record(&self, name: &str, record_type: &str) -> Result<()> {
        let current = self.records_for(name).await?;
        let Some(existing) = current.into_iter().find(|r| r.is(record_type, name)) else {
            tracing::debug!("No {} record for {}; nothing to remove", record_type, name);
            return Ok(());
        };
        tracing::debug!(
            "matched {} {} {}",
            existing.record_type,
            existing.record,
            existing.value
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would remove {} {} ({})", record_type, name, existing.value);
            return Ok(());
        }

        self.call(
            "dns-remove_record",
            &[("record", name), ("type", record_type), ("value", existing.value.as_str())],
        )
        .await?;
        tracing::info!("Removed {} {}", record_type, name);
        Ok(())
    }
}
