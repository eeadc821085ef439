//! Test doubles and common utilities for reconciler contract tests
//!
//! `test.Note` is a resource kind whose "provider" is an in-memory map from
//! name to text. `test.Fixed` can only be found, never minted.

#![allow(dead_code)]

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
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared fake provider with a call log
#[derive(Clone, Default)]
pub struct World {
    notes: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(self, name: &str, text: &str) -> Self {
        self.notes
            .lock()
            .unwrap()
            .insert(name.to_string(), text.to_string());
        self
    }

    pub fn note(&self, name: &str) -> Option<String> {
        self.notes.lock().unwrap().get(name).cloned()
    }

    /// Every lifecycle call, as "<method>:<name>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the calls that changed the world
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("insert:") || c.starts_with("delete:"))
            .collect()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[derive(Debug)]
pub struct NoteModel {
    loc: Location,
    name: String,
    text: String,
}

impl Describable for NoteModel {
    fn loc(&self) -> &Location {
        &self.loc
    }

    fn short_description(&self) -> String {
        format!("test.Note[{}]", self.name)
    }
}

impl Model for NoteModel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NoteBlank {
    world: World,
}

impl NoteBlank {
    pub fn new(world: World) -> Self {
        Self { world }
    }
}

impl Blank for NoteBlank {
    fn short_description(&self) -> String {
        "test.Note[]".to_string()
    }

    fn find(&self, tools: &Tools, loc: Location, coin: CoinId, named: &str) -> Box<dyn Finder> {
        Box::new(NoteCreator {
            tools: tools.clone(),
            world: self.world.clone(),
            loc,
            coin,
            name: named.to_string(),
            props: Properties::new(),
        })
    }

    fn mint(
        &self,
        tools: &Tools,
        loc: Location,
        coin: CoinId,
        named: &str,
        props: Properties,
    ) -> Option<Box<dyn Creator>> {
        Some(Box::new(NoteCreator {
            tools: tools.clone(),
            world: self.world.clone(),
            loc,
            coin,
            name: named.to_string(),
            props,
        }))
    }
}

struct NoteCreator {
    tools: Tools,
    world: World,
    loc: Location,
    coin: CoinId,
    name: String,
    props: Properties,
}

impl Describable for NoteCreator {
    fn loc(&self) -> &Location {
        &self.loc
    }

    fn short_description(&self) -> String {
        format!("test.Note[{}]", self.name)
    }
}

#[async_trait]
impl Finder for NoteCreator {
    fn coin_id(&self) -> CoinId {
        self.coin
    }

    async fn determine_initial_state(&self, pres: &mut dyn ValuePresenter) -> Result<()> {
        self.world.log(format!("initial:{}", self.name));
        match self.world.note(&self.name) {
            Some(text) => pres.present(Arc::new(NoteModel {
                loc: self.loc.clone(),
                name: self.name.clone(),
                text,
            })),
            None => pres.not_found(),
        }
        Ok(())
    }
}

#[async_trait]
impl Creator for NoteCreator {
    async fn determine_desired_state(&self, pres: &mut dyn ValuePresenter) -> Result<()> {
        self.world.log(format!("desired:{}", self.name));
        let mut text: Option<&Expr> = None;
        for (id, expr) in &self.props {
            match id.id() {
                "Text" => text = Some(expr),
                other => self
                    .tools
                    .report_at(id.loc(), format!("invalid property for Note: {}", other)),
            }
        }
        let Some(text) = text else {
            self.tools
                .report_at(&self.loc, format!("no Text for {}", self.name));
            return Ok(());
        };
        let text = self.tools.bindings.eval_as_stringer(text)?;
        pres.present(Arc::new(NoteModel {
            loc: self.loc.clone(),
            name: self.name.clone(),
            text,
        }));
        Ok(())
    }

    async fn update_reality(&self) -> Result<ApplyResult> {
        if self.tools.storage.determined(self.coin, Mode::Initial).await?.is_some() {
            return Ok(ApplyResult::AlreadyExists);
        }
        let desired = self
            .tools
            .storage
            .determined(self.coin, Mode::Desired)
            .await?
            .ok_or_else(|| Error::invariant("no desired note"))?;
        let desired = model_as::<NoteModel>(desired.as_ref())?;

        self.world.log(format!("insert:{}", self.name));
        self.world
            .notes
            .lock()
            .unwrap()
            .insert(self.name.clone(), desired.text.clone());

        let created = Arc::new(NoteModel {
            loc: self.loc.clone(),
            name: self.name.clone(),
            text: desired.text.clone(),
        });
        self.tools.storage.bind(self.coin, Mode::Initial, created).await;
        Ok(ApplyResult::Created)
    }

    async fn tear_down(&self) -> Result<TearDownResult> {
        if self.tools.storage.determined(self.coin, Mode::Initial).await?.is_none() {
            return Ok(TearDownResult::AlreadyAbsent);
        }
        self.world.log(format!("delete:{}", self.name));
        self.world.notes.lock().unwrap().remove(&self.name);
        Ok(TearDownResult::Removed)
    }
}

/// Kind that refuses to be minted
pub struct FixedBlank {
    world: World,
}

impl FixedBlank {
    pub fn new(world: World) -> Self {
        Self { world }
    }
}

impl Blank for FixedBlank {
    fn short_description(&self) -> String {
        "test.Fixed[]".to_string()
    }

    fn find(&self, tools: &Tools, loc: Location, coin: CoinId, named: &str) -> Box<dyn Finder> {
        NoteBlank::new(self.world.clone()).find(tools, loc, coin, named)
    }

    fn mint(
        &self,
        tools: &Tools,
        loc: Location,
        _coin: CoinId,
        _named: &str,
        _props: Properties,
    ) -> Option<Box<dyn Creator>> {
        tools.report_at(&loc, "cannot create fixed notes; use find");
        None
    }
}

/// Registry with both test kinds bound to `world`
pub fn registry_for(world: &World) -> Arc<converge_core::BlankRegistry> {
    let registry = converge_core::BlankRegistry::new();
    registry.register_blank("test.Note", Box::new(NoteBlank::new(world.clone())));
    registry.register_blank("test.Fixed", Box::new(FixedBlank::new(world.clone())));
    Arc::new(registry)
}
