//! Provider records as returned by the DreamHost API

use serde::{Deserialize, Serialize};

/// One DNS record as listed by `dns-list_records`
///
/// Field names follow the API's lowercase JSON; the capitalized forms are
/// accepted as well. Fields the API adds (account, comment, editable) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Fully qualified record name (e.g., "blog.example.com")
    #[serde(alias = "Record")]
    pub record: String,

    /// Record type (e.g., "CNAME")
    #[serde(rename = "type", alias = "Type")]
    pub record_type: String,

    /// Record value; host names may carry a trailing dot
    #[serde(alias = "Value")]
    pub value: String,

    /// Zone the record belongs to
    #[serde(alias = "Zone", default)]
    pub zone: String,
}

impl DnsRecord {
    pub fn new(
        record: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            record: record.into(),
            record_type: record_type.into(),
            value: value.into(),
            zone: zone.into(),
        }
    }

    /// Exact name and type match (single-record lookups)
    pub fn is(&self, record_type: &str, name: &str) -> bool {
        self.record_type == record_type && self.record == name
    }

    /// Zone membership or name-suffix match (domain lookups)
    pub fn belongs_to(&self, domain: &str) -> bool {
        self.zone == domain || self.record.ends_with(domain)
    }
}

/// Compare a requested value with a stored one
///
/// DreamHost stores host names fully qualified, so `foo.com` and `foo.com.`
/// are the same value. Only a single trailing dot is forgiven.
pub fn values_equivalent(requested: &str, stored: &str) -> bool {
    requested == stored
        || stored.strip_suffix('.') == Some(requested)
        || requested.strip_suffix('.') == Some(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_dot_equivalence() {
        assert!(values_equivalent("foo.com", "foo.com"));
        assert!(values_equivalent("foo.com", "foo.com."));
        assert!(values_equivalent("foo.com.", "foo.com"));

        assert!(!values_equivalent("foo.com", "bar.com"));
        assert!(!values_equivalent("foo.com", "foo.com.."));
        assert!(!values_equivalent("foo.com", "foo.co"));
    }

    #[test]
    fn test_matching_rules_differ_by_query_shape() {
        let record = DnsRecord::new("blog.example.com", "CNAME", "host.example.net.", "example.com");

        assert!(record.is("CNAME", "blog.example.com"));
        assert!(!record.is("A", "blog.example.com"));
        assert!(!record.is("CNAME", "example.com"));

        assert!(record.belongs_to("example.com"));
        assert!(record.belongs_to("blog.example.com"));
        assert!(!record.belongs_to("example.org"));
    }

    #[test]
    fn test_deserialize_both_casings() {
        let lower: DnsRecord = serde_json::from_value(serde_json::json!({
            "account_id": "1",
            "zone": "example.com",
            "record": "blog.example.com",
            "type": "CNAME",
            "value": "host.example.net.",
            "comment": "",
            "editable": "1"
        }))
        .unwrap();
        let upper: DnsRecord = serde_json::from_value(serde_json::json!({
            "Zone": "example.com",
            "Record": "blog.example.com",
            "Type": "CNAME",
            "Value": "host.example.net."
        }))
        .unwrap();

        assert_eq!(lower, upper);
        assert_eq!(lower.record_type, "CNAME");
    }
}
