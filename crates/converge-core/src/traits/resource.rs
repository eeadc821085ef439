// # Resource Capabilities
//
// A resource kind exposes two capability sets over the same namespace:
//
// - [`Finder`]: lookup only. It can report what exists and nothing else.
// - [`Creator`]: everything a Finder does, plus desired state, converge and
//   tear down.
//
// A [`Blank`] hands out one or the other. Because the host only ever holds a
// `Box<dyn Finder>` for a found resource, there is no way to tear one down.
//
// ## Lifecycle
//
// ```text
// UNDETERMINED ──determine_initial_state──▶ INITIAL_KNOWN (found | not found)
//              ──determine_desired_state──▶ DESIRED_KNOWN
//              ──update_reality───────────▶ CONVERGED
//
// any state with INITIAL_KNOWN ──tear_down──▶ TORN_DOWN
// ```
//
// The host must bind both determinations into the `CoinStore` before calling
// `update_reality` or `tear_down`. Reading an undetermined slot returns
// `Error::Unsequenced`.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Describable, ValuePresenter};
use crate::coin::CoinId;
use crate::diagnostics::{Location, Reporter};
use crate::error::Result;
use crate::expr::{Bindings, Properties};
use crate::state::CoinStore;

/// Outcome of [`Creator::update_reality`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// The resource was created by this call
    Created,
    /// The resource already existed; nothing was changed
    AlreadyExists,
}

/// Outcome of [`Creator::tear_down`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TearDownResult {
    /// The resource was removed by this call
    Removed,
    /// There was nothing to remove
    AlreadyAbsent,
}

/// Shared run services handed to every Blank
#[derive(Clone)]
pub struct Tools {
    /// Cached state slots for this run
    pub storage: CoinStore,
    /// Diagnostic sink for configuration errors
    pub reporter: Arc<dyn Reporter>,
    /// Symbols declared properties are evaluated against
    pub bindings: Arc<Bindings>,
}

impl Tools {
    pub fn new(storage: CoinStore, reporter: Arc<dyn Reporter>, bindings: Bindings) -> Self {
        Self {
            storage,
            reporter,
            bindings: Arc::new(bindings),
        }
    }

    /// Report a configuration error
    pub fn report_at(&self, loc: &Location, message: impl Into<String>) {
        self.reporter.report_at(loc, message.into());
    }
}

/// Lookup-only resource capability
#[async_trait]
pub trait Finder: Describable + Send + Sync {
    /// Identity this instance was minted for
    fn coin_id(&self) -> CoinId;

    /// Report what the provider currently has
    ///
    /// Provider failures are returned as errors; nothing is presented then.
    async fn determine_initial_state(&self, pres: &mut dyn ValuePresenter) -> Result<()>;
}

/// Full lifecycle resource capability
#[async_trait]
pub trait Creator: Finder {
    /// Report the state the declarations ask for
    ///
    /// Configuration mistakes are reported through the run's reporter and do
    /// not produce an error. When the declarations are unusable nothing is
    /// presented.
    async fn determine_desired_state(&self, pres: &mut dyn ValuePresenter) -> Result<()>;

    /// Converge the provider to the desired state
    async fn update_reality(&self) -> Result<ApplyResult>;

    /// Remove the resource from the provider
    async fn tear_down(&self) -> Result<TearDownResult>;
}

/// Factory for one resource kind
pub trait Blank: Send + Sync {
    /// Kind description, e.g. `dreamhost.CNAME[]`
    fn short_description(&self) -> String;

    /// Produce a lookup-only instance
    ///
    /// Lookup needs nothing but a name, so no properties are validated.
    fn find(&self, tools: &Tools, loc: Location, coin: CoinId, named: &str) -> Box<dyn Finder>;

    /// Produce a lifecycle instance
    ///
    /// Kinds that cannot be created must report a diagnostic and return
    /// `None`; the host then leaves the block alone.
    fn mint(
        &self,
        tools: &Tools,
        loc: Location,
        coin: CoinId,
        named: &str,
        props: Properties,
    ) -> Option<Box<dyn Creator>>;
}
