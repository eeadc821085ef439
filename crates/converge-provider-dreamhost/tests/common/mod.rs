//! Test doubles for DreamHost resource tests
//!
//! `MockEnvironment` keeps records in memory and counts every mutation so
//! tests can assert exactly how many provider calls a lifecycle step made.

#![allow(dead_code)]

use async_trait::async_trait;
use converge_core::coin::CoinId;
use converge_core::diagnostics::{CollectingReporter, Location};
use converge_core::error::{Error, Result};
use converge_core::expr::{Bindings, Expr, Identifier, Properties};
use converge_core::state::CoinStore;
use converge_core::traits::Tools;
use converge_provider_dreamhost::{DnsEnvironment, DnsRecord, values_equivalent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockEnvironment {
    records: Mutex<Vec<DnsRecord>>,
    lists: AtomicUsize,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, name: &str, record_type: &str, value: &str, zone: &str) -> Self {
        self.records
            .lock()
            .unwrap()
            .push(DnsRecord::new(name, record_type, value, zone));
        self
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.inserts() + self.deletes()
    }
}

#[async_trait]
impl DnsEnvironment for MockEnvironment {
    async fn records_for(&self, name: &str) -> Result<Vec<DnsRecord>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.belongs_to(name))
            .cloned()
            .collect())
    }

    async fn insert_record(&self, name: &str, record_type: &str, value: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.iter().find(|r| r.is(record_type, name)) {
            if values_equivalent(value, &existing.value) {
                return Ok(());
            }
            return Err(Error::conflict(name, existing.value.clone(), value));
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        records.push(DnsRecord::new(name, record_type, value, ""));
        Ok(())
    }

    async fn delete_record(&self, name: &str, record_type: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !r.is(record_type, name));
        if records.len() != before {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Environment whose every call fails like an unreachable API
pub struct BrokenEnvironment;

#[async_trait]
impl DnsEnvironment for BrokenEnvironment {
    async fn records_for(&self, _name: &str) -> Result<Vec<DnsRecord>> {
        Err(Error::provider("dreamhost", "dns-list_records returned error status: 500"))
    }

    async fn insert_record(&self, _: &str, _: &str, _: &str) -> Result<()> {
        Err(Error::provider("dreamhost", "dns-add_record failed"))
    }

    async fn delete_record(&self, _: &str, _: &str) -> Result<()> {
        Err(Error::provider("dreamhost", "dns-remove_record failed"))
    }
}

/// Run services over a fresh store and a collecting reporter
pub fn tools(bindings: Bindings) -> (Tools, Arc<CollectingReporter>) {
    let reporter = Arc::new(CollectingReporter::new());
    let tools = Tools::new(CoinStore::new(), reporter.clone(), bindings);
    (tools, reporter)
}

pub fn loc(decl: usize) -> Location {
    Location::new("site.json", decl)
}

pub fn props(entries: &[(&str, Expr)]) -> Properties {
    entries
        .iter()
        .map(|(id, expr)| (Identifier::new(*id, loc(2).property(*id)), expr.clone()))
        .collect()
}

pub fn points_to(value: &str) -> Properties {
    props(&[("PointsTo", Expr::string(value))])
}

pub fn coin() -> CoinId {
    CoinId::mint()
}
