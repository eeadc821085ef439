// # CNAME Records
//
// `dreamhost.CNAME[name]` with a single required property, `PointsTo`.
//
// Convergence is create-or-adopt: if a CNAME with this name already exists it
// is left exactly as it is, even when it points somewhere other than the
// declaration says. Only a missing record is created.

use async_trait::async_trait;
use converge_core::coin::CoinId;
use converge_core::diagnostics::Location;
use converge_core::error::{Error, Result};
use converge_core::expr::{Expr, Properties};
use converge_core::state::Mode;
use converge_core::traits::{
    ApplyResult, Blank, Creator, Describable, Finder, Model, TearDownResult, Tools,
    ValuePresenter, model_as,
};
use std::any::Any;
use std::sync::Arc;

use crate::env::DnsEnvironment;

const CNAME: &str = "CNAME";

/// Observed or declared CNAME
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnameModel {
    loc: Location,
    name: String,
    points_to: String,
}

impl CnameModel {
    pub fn new(loc: Location, name: impl Into<String>, points_to: impl Into<String>) -> Self {
        Self {
            loc,
            name: name.into(),
            points_to: points_to.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target host, exactly as the provider or the declaration gave it
    pub fn points_to(&self) -> &str {
        &self.points_to
    }
}

impl Describable for CnameModel {
    fn loc(&self) -> &Location {
        &self.loc
    }

    fn short_description(&self) -> String {
        format!("CNAME[{} -> {}]", self.name, self.points_to)
    }
}

impl Model for CnameModel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory for `dreamhost.CNAME`
pub struct CnameBlank {
    env: Arc<dyn DnsEnvironment>,
}

impl CnameBlank {
    pub fn new(env: Arc<dyn DnsEnvironment>) -> Self {
        Self { env }
    }

    fn creator(
        &self,
        tools: &Tools,
        loc: Location,
        coin: CoinId,
        named: &str,
        props: Properties,
    ) -> CnameCreator {
        CnameCreator {
            tools: tools.clone(),
            env: self.env.clone(),
            loc,
            name: named.to_string(),
            coin,
            props,
        }
    }
}

impl Blank for CnameBlank {
    fn short_description(&self) -> String {
        "dreamhost.CNAME[]".to_string()
    }

    fn find(&self, tools: &Tools, loc: Location, coin: CoinId, named: &str) -> Box<dyn Finder> {
        Box::new(self.creator(tools, loc, coin, named, Properties::new()))
    }

    fn mint(
        &self,
        tools: &Tools,
        loc: Location,
        coin: CoinId,
        named: &str,
        props: Properties,
    ) -> Option<Box<dyn Creator>> {
        Some(Box::new(self.creator(tools, loc, coin, named, props)))
    }
}

/// Lifecycle of one declared CNAME
pub struct CnameCreator {
    tools: Tools,
    env: Arc<dyn DnsEnvironment>,

    loc: Location,
    name: String,
    coin: CoinId,
    props: Properties,
}

impl CnameCreator {
    /// Read a determined slot and cast it to a CNAME
    async fn cached(&self, mode: Mode) -> Result<Option<CnameModel>> {
        match self.tools.storage.determined(self.coin, mode).await? {
            Some(model) => Ok(Some(model_as::<CnameModel>(model.as_ref())?.clone())),
            None => Ok(None),
        }
    }
}

impl Describable for CnameCreator {
    fn loc(&self) -> &Location {
        &self.loc
    }

    fn short_description(&self) -> String {
        format!("dreamhost.CNAME[{}]", self.name)
    }
}

#[async_trait]
impl Finder for CnameCreator {
    fn coin_id(&self) -> CoinId {
        self.coin
    }

    async fn determine_initial_state(&self, pres: &mut dyn ValuePresenter) -> Result<()> {
        let points_to = self
            .env
            .find_record(CNAME, &self.name)
            .await?
            .filter(|v| !v.is_empty());

        match points_to {
            Some(points_to) => {
                tracing::debug!("CNAME {} points to {}", self.name, points_to);
                pres.present(Arc::new(CnameModel::new(
                    self.loc.clone(),
                    self.name.clone(),
                    points_to,
                )));
            }
            None => pres.not_found(),
        }
        Ok(())
    }
}

#[async_trait]
impl Creator for CnameCreator {
    async fn determine_desired_state(&self, pres: &mut dyn ValuePresenter) -> Result<()> {
        let mut points_to: Option<&Expr> = None;
        let mut seen_err = false;
        for (p, v) in &self.props {
            match p.id() {
                "PointsTo" => points_to = Some(v),
                other => {
                    self.tools
                        .report_at(p.loc(), format!("invalid property for CNAME: {}", other));
                    seen_err = true;
                }
            }
        }

        let Some(points_to) = points_to else {
            if !seen_err {
                self.tools.report_at(
                    &self.loc,
                    format!("no PointsTo property was specified for {}", self.name),
                );
            }
            return Ok(());
        };

        let points_to = self.tools.bindings.eval_as_stringer(points_to)?;
        pres.present(Arc::new(CnameModel::new(
            self.loc.clone(),
            self.name.clone(),
            points_to,
        )));
        Ok(())
    }

    async fn update_reality(&self) -> Result<ApplyResult> {
        if let Some(found) = self.cached(Mode::Initial).await? {
            tracing::info!("CNAME {} already exists", found.name());
            return Ok(ApplyResult::AlreadyExists);
        }

        tracing::info!("creating CNAME {}", self.name);
        let desired = self.cached(Mode::Desired).await?.ok_or_else(|| {
            Error::invariant(format!(
                "no desired state was determined for {}",
                self.short_description()
            ))
        })?;

        self.env
            .insert_record(desired.name(), CNAME, desired.points_to())
            .await?;

        let created = CnameModel::new(self.loc.clone(), self.name.clone(), desired.points_to());
        self.tools
            .storage
            .bind(self.coin, Mode::Initial, Arc::new(created))
            .await;
        Ok(ApplyResult::Created)
    }

    async fn tear_down(&self) -> Result<TearDownResult> {
        let Some(found) = self.cached(Mode::Initial).await? else {
            tracing::info!("CNAME {} already deleted", self.name);
            return Ok(TearDownResult::AlreadyAbsent);
        };

        tracing::info!("need to remove a CNAME record for {}", self.name);
        tracing::debug!("found DH CNAME = {:?}", found);

        self.env.delete_record(found.name(), CNAME).await?;

        self.tools
            .storage
            .bind_not_found(self.coin, Mode::Initial)
            .await;
        Ok(TearDownResult::Removed)
    }
}
