// # Domain Names
//
// `dreamhost.DomainName[name]` can only be found. The model aggregates every
// record in the domain, matched by zone or by name suffix.

use async_trait::async_trait;
use converge_core::coin::CoinId;
use converge_core::diagnostics::Location;
use converge_core::error::Result;
use converge_core::expr::Properties;
use converge_core::traits::{Blank, Creator, Describable, Finder, Model, Tools, ValuePresenter};
use std::any::Any;
use std::sync::Arc;

use crate::env::DnsEnvironment;
use crate::record::DnsRecord;

/// All records DreamHost holds for a domain
#[derive(Debug, Clone)]
pub struct DomainModel {
    loc: Location,
    name: String,
    records: Vec<DnsRecord>,
}

impl DomainModel {
    pub fn new(loc: Location, name: impl Into<String>, records: Vec<DnsRecord>) -> Self {
        Self {
            loc,
            name: name.into(),
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[DnsRecord] {
        &self.records
    }

    /// Records of one type, e.g. every CNAME in the domain
    pub fn records_of_type<'a>(&'a self, record_type: &'a str) -> impl Iterator<Item = &'a DnsRecord> {
        self.records.iter().filter(move |r| r.record_type == record_type)
    }
}

impl Describable for DomainModel {
    fn loc(&self) -> &Location {
        &self.loc
    }

    fn short_description(&self) -> String {
        format!("DomainName[{}]", self.name)
    }
}

impl Model for DomainModel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory for `dreamhost.DomainName`
pub struct DomainNameBlank {
    env: Arc<dyn DnsEnvironment>,
}

impl DomainNameBlank {
    pub fn new(env: Arc<dyn DnsEnvironment>) -> Self {
        Self { env }
    }
}

impl Blank for DomainNameBlank {
    fn short_description(&self) -> String {
        "dreamhost.DomainName[]".to_string()
    }

    fn find(&self, _tools: &Tools, loc: Location, coin: CoinId, named: &str) -> Box<dyn Finder> {
        Box::new(DomainNameFinder {
            env: self.env.clone(),
            loc,
            name: named.to_string(),
            coin,
        })
    }

    fn mint(
        &self,
        tools: &Tools,
        loc: Location,
        _coin: CoinId,
        _named: &str,
        _props: Properties,
    ) -> Option<Box<dyn Creator>> {
        tools.report_at(&loc, "cannot create domain names automatically; use find");
        None
    }
}

/// Lookup of one domain
pub struct DomainNameFinder {
    env: Arc<dyn DnsEnvironment>,

    loc: Location,
    name: String,
    coin: CoinId,
}

impl Describable for DomainNameFinder {
    fn loc(&self) -> &Location {
        &self.loc
    }

    fn short_description(&self) -> String {
        format!("dreamhost.DomainName[{}]", self.name)
    }
}

#[async_trait]
impl Finder for DomainNameFinder {
    fn coin_id(&self) -> CoinId {
        self.coin
    }

    async fn determine_initial_state(&self, pres: &mut dyn ValuePresenter) -> Result<()> {
        let records = self.env.records_for(&self.name).await?;
        tracing::debug!("domain {} has {} record(s)", self.name, records.len());

        pres.present(Arc::new(DomainModel::new(
            self.loc.clone(),
            self.name.clone(),
            records,
        )));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_of_type() {
        let model = DomainModel::new(
            Location::new("site.json", 1),
            "example.com",
            vec![
                DnsRecord::new("example.com", "A", "192.0.2.10", "example.com"),
                DnsRecord::new("www.example.com", "CNAME", "example.com.", "example.com"),
                DnsRecord::new("blog.example.com", "CNAME", "host.example.net.", "example.com"),
            ],
        );

        let cnames: Vec<&str> = model
            .records_of_type("CNAME")
            .map(|r| r.record.as_str())
            .collect();
        assert_eq!(cnames, vec!["www.example.com", "blog.example.com"]);
        assert_eq!(model.records().len(), 3);
        assert_eq!(model.short_description(), "DomainName[example.com]");
    }
}
