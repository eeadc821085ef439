//! Core reconciliation engine
//!
//! The Reconciler is the host driver for one declaration file. It is
//! responsible for:
//! - Minting a resource identity per declared block
//! - Obtaining a Finder or Creator from the registered Blank
//! - Determining initial and desired state exactly once per run
//! - Converging (or tearing down) each Creator in order
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ DeployConfig  │─── declarations ───┐
//! └───────────────┘                    │
//!                                      ▼
//!                             ┌──────────────┐
//!                             │  Reconciler  │
//!                             └──────────────┘
//!                                      │
//!         ┌────────────────────────────┼────────────────────────────┐
//!         │                            │                            │
//!         ▼                            ▼                            ▼
//! ┌───────────────┐           ┌─────────────────┐           ┌──────────────┐
//! │ BlankRegistry │           │ Finder/Creator  │           │  CoinStore   │
//! │ (mint/find)   │           │ (lifecycle)     │           │  (slots)     │
//! └───────────────┘           └─────────────────┘           └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Determine: initial state for every block, desired state for creators
//! 2. Stop if configuration diagnostics were reported (when configured to)
//! 3. Apply: `update_reality` on each creator, in declaration order
//!
//! Teardown runs step 1 for creators only and then calls `tear_down` in
//! reverse declaration order. Every lifecycle call completes before the next
//! one starts. The first error aborts the run.
//!
//! ## Diagnostics and Skipped Blocks
//!
//! A Blank that refuses to mint (e.g. `ensure` on a kind that can only be
//! found) reports a diagnostic and the block is skipped. With
//! `halt_on_diagnostics` at its default of `true`, that diagnostic also stops
//! the run at step 2, so nothing else is applied either. Set it to `false` to
//! skip such blocks and converge the rest.
//!
//! Only diagnostics reported during the current run are counted; the
//! reporter may be shared across runs.

use crate::coin::CoinId;
use crate::config::{DeclAction, DeployConfig};
use crate::diagnostics::Reporter;
use crate::error::{Error, Result};
use crate::expr::Bindings;
use crate::registry::BlankRegistry;
use crate::state::{CoinStore, Mode};
use crate::traits::{
    ApplyResult, Creator, Finder, Presented, SlotPresenter, TearDownResult, Tools,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Run started
    Started {
        resources_count: usize,
    },

    /// Initial state determined
    InitialDetermined {
        resource: String,
        found: bool,
    },

    /// Desired state determined
    DesiredDetermined {
        resource: String,
        presented: bool,
    },

    /// Resource created
    Created {
        resource: String,
    },

    /// Resource already existed; nothing changed
    AlreadyExists {
        resource: String,
    },

    /// Resource removed
    Removed {
        resource: String,
    },

    /// Resource was already gone
    AlreadyAbsent {
        resource: String,
    },

    /// Block not reconciled (its kind refused to mint a creator)
    Skipped {
        resource: String,
    },

    /// Run finished
    Stopped {
        reason: String,
    },
}

/// Per-outcome counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub created: usize,
    pub already_existed: usize,
    pub removed: usize,
    pub already_absent: usize,
    pub skipped: usize,
}

/// A declared block bound to its capability
///
/// Found blocks never get a lifecycle beyond initial state determination.
enum Instance {
    Found(Box<dyn Finder>),
    Ensured(Box<dyn Creator>),
}

/// Host driver for one set of declarations
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::apply()`] or [`Reconciler::tear_down()`]
///
/// Every call is a separate run with its own identities and its own
/// [`CoinStore`]. Diagnostics accumulate in the shared reporter, but a run
/// only halts on the ones it reported itself.
pub struct Reconciler {
    /// Registered resource kinds
    registry: Arc<BlankRegistry>,

    /// Diagnostic sink shared with every resource
    reporter: Arc<dyn Reporter>,

    /// Declarations to reconcile
    config: DeployConfig,

    /// Evaluated bindings table
    bindings: Bindings,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// run events
    pub fn new(
        registry: Arc<BlankRegistry>,
        reporter: Arc<dyn Reporter>,
        config: DeployConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;
        let bindings = config.to_bindings()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity.max(1));

        let reconciler = Self {
            registry,
            reporter,
            config,
            bindings,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Converge every declared resource
    pub async fn apply(&self) -> Result<RunSummary> {
        let tools = self.fresh_tools();
        let baseline = self.reporter.diagnostics().len();
        let mut summary = RunSummary::default();

        self.emit_event(ReconcileEvent::Started {
            resources_count: self.config.resources.len(),
        });

        let instances = self.instantiate(&tools, false, &mut summary)?;

        for instance in &instances {
            match instance {
                Instance::Found(finder) => {
                    self.determine_initial(&tools, finder.as_ref(), &mut summary)
                        .await?;
                }
                Instance::Ensured(creator) => {
                    self.determine_initial(&tools, creator.as_ref(), &mut summary)
                        .await?;
                    self.determine_desired(&tools, creator.as_ref()).await?;
                }
            }
        }

        self.check_diagnostics(baseline)?;

        for instance in &instances {
            let Instance::Ensured(creator) = instance else {
                continue;
            };
            let resource = creator.short_description();
            match creator.update_reality().await? {
                ApplyResult::Created => {
                    info!("Created {}", resource);
                    summary.created += 1;
                    self.emit_event(ReconcileEvent::Created { resource });
                }
                ApplyResult::AlreadyExists => {
                    debug!("{} already exists", resource);
                    summary.already_existed += 1;
                    self.emit_event(ReconcileEvent::AlreadyExists { resource });
                }
            }
        }

        self.emit_event(ReconcileEvent::Stopped {
            reason: "apply complete".to_string(),
        });
        Ok(summary)
    }

    /// Remove every resource this configuration ensures
    ///
    /// Found resources are left alone.
    pub async fn tear_down(&self) -> Result<RunSummary> {
        let tools = self.fresh_tools();
        let baseline = self.reporter.diagnostics().len();
        let mut summary = RunSummary::default();

        self.emit_event(ReconcileEvent::Started {
            resources_count: self.config.resources.len(),
        });

        let creators: Vec<Box<dyn Creator>> = self
            .instantiate(&tools, true, &mut summary)?
            .into_iter()
            .filter_map(|instance| match instance {
                Instance::Ensured(creator) => Some(creator),
                Instance::Found(_) => None,
            })
            .collect();

        for creator in &creators {
            self.determine_initial(&tools, creator.as_ref(), &mut summary)
                .await?;
        }

        self.check_diagnostics(baseline)?;

        for creator in creators.iter().rev() {
            let resource = creator.short_description();
            match creator.tear_down().await? {
                TearDownResult::Removed => {
                    info!("Removed {}", resource);
                    summary.removed += 1;
                    self.emit_event(ReconcileEvent::Removed { resource });
                }
                TearDownResult::AlreadyAbsent => {
                    debug!("{} already absent", resource);
                    summary.already_absent += 1;
                    self.emit_event(ReconcileEvent::AlreadyAbsent { resource });
                }
            }
        }

        self.emit_event(ReconcileEvent::Stopped {
            reason: "teardown complete".to_string(),
        });
        Ok(summary)
    }

    fn fresh_tools(&self) -> Tools {
        Tools::new(
            CoinStore::new(),
            self.reporter.clone(),
            self.bindings.clone(),
        )
    }

    /// Mint a coin per declaration and obtain its Finder or Creator
    ///
    /// With `ensured_only`, find-declarations are skipped without being
    /// instantiated.
    fn instantiate(
        &self,
        tools: &Tools,
        ensured_only: bool,
        summary: &mut RunSummary,
    ) -> Result<Vec<Instance>> {
        let mut instances = Vec::with_capacity(self.config.resources.len());

        for (i, decl) in self.config.resources.iter().enumerate() {
            let blank = self.registry.blank(&decl.kind)?;
            let loc = self.config.location_of(i);
            let coin = CoinId::mint();

            match decl.action {
                DeclAction::Find => {
                    if ensured_only {
                        continue;
                    }
                    debug!("Finding {}[{}] as {}", decl.kind, decl.name, coin);
                    instances.push(Instance::Found(blank.find(tools, loc, coin, &decl.name)));
                }
                DeclAction::Ensure => {
                    let props = decl.to_properties(&loc)?;
                    debug!("Minting {}[{}] as {}", decl.kind, decl.name, coin);
                    match blank.mint(tools, loc, coin, &decl.name, props) {
                        Some(creator) => instances.push(Instance::Ensured(creator)),
                        None => {
                            warn!("{}[{}] will not be reconciled", decl.kind, decl.name);
                            summary.skipped += 1;
                            self.emit_event(ReconcileEvent::Skipped {
                                resource: format!("{}[{}]", decl.kind, decl.name),
                            });
                        }
                    }
                }
            }
        }

        Ok(instances)
    }

    /// Determine and bind initial state, unless this run already has it
    async fn determine_initial<F: Finder + ?Sized>(
        &self,
        tools: &Tools,
        finder: &F,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let coin = finder.coin_id();
        if tools.storage.is_determined(coin, Mode::Initial).await {
            return Ok(());
        }

        let mut pres = SlotPresenter::new();
        finder.determine_initial_state(&mut pres).await?;

        let found = match pres.into_outcome() {
            Some(Presented::Found(model)) => {
                tools.storage.bind(coin, Mode::Initial, model).await;
                summary.found += 1;
                true
            }
            Some(Presented::NotFound) => {
                tools.storage.bind_not_found(coin, Mode::Initial).await;
                false
            }
            None => {
                return Err(Error::invariant(format!(
                    "{} reported no initial state",
                    finder.short_description()
                )));
            }
        };

        self.emit_event(ReconcileEvent::InitialDetermined {
            resource: finder.short_description(),
            found,
        });
        Ok(())
    }

    /// Determine and bind desired state, unless this run already has it
    ///
    /// A creator that presents nothing has reported diagnostics; its slot
    /// stays pending.
    async fn determine_desired(&self, tools: &Tools, creator: &dyn Creator) -> Result<()> {
        let coin = creator.coin_id();
        if tools.storage.is_determined(coin, Mode::Desired).await {
            return Ok(());
        }

        let mut pres = SlotPresenter::new();
        creator.determine_desired_state(&mut pres).await?;

        let presented = match pres.into_outcome() {
            Some(Presented::Found(model)) => {
                tools.storage.bind(coin, Mode::Desired, model).await;
                true
            }
            Some(Presented::NotFound) => {
                tools.storage.bind_not_found(coin, Mode::Desired).await;
                false
            }
            None => false,
        };

        self.emit_event(ReconcileEvent::DesiredDetermined {
            resource: creator.short_description(),
            presented,
        });
        Ok(())
    }

    /// Stop the run if it reported diagnostics of its own
    ///
    /// The reporter outlives runs, so only what was reported after
    /// `baseline` counts.
    fn check_diagnostics(&self, baseline: usize) -> Result<()> {
        if !self.config.engine.halt_on_diagnostics {
            return Ok(());
        }

        let count = self.reporter.diagnostics().len().saturating_sub(baseline);
        if count == 0 {
            return Ok(());
        }

        self.emit_event(ReconcileEvent::Stopped {
            reason: format!("{} configuration error(s)", count),
        });
        Err(Error::config(format!(
            "{} configuration error(s) reported; nothing was changed",
            count
        )))
    }

    /// Emit a run event
    fn emit_event(&self, event: ReconcileEvent) {
        // Dropping beats blocking the run on a slow observer
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
