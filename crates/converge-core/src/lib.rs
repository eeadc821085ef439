// # converge-core
//
// Core library for reconciling declared infrastructure resources.
//
// ## Architecture Overview
//
// This library provides the provider-independent part of reconciliation:
// - **CoinId**: Process-unique identity of one declared resource block
// - **Blank**: Factory a resource kind registers; mints Creators, finds Finders
// - **Finder / Creator**: Lookup-only and full-lifecycle capabilities
// - **CoinStore**: Cached INITIAL/DESIRED state slots for one run
// - **Reconciler**: Host driver that sequences the lifecycle for a config
// - **BlankRegistry**: Plugin-based registry for resource kinds and drivers
//
// ## Design Principles
//
// 1. **Capabilities, not checks**: a found resource cannot be torn down because
//    the host only ever holds a `Finder` for it
// 2. **Determine once**: state determination runs at most once per identity
//    and mode in a run
// 3. **Report, then refuse**: configuration mistakes are collected in one pass
//    through a `Reporter`; provider failures abort. By default any diagnostic
//    in a run (including one from a Blank that declines to mint) stops that
//    run before it changes anything; `EngineConfig::halt_on_diagnostics`
//    turns this off so unmintable blocks are just skipped
// 4. **Explicit injection**: resource kinds receive their provider client in
//    their constructor

pub mod coin;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod expr;
pub mod registry;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use coin::CoinId;
pub use config::{DeclAction, DeployConfig, EngineConfig, ResourceConfig};
pub use diagnostics::{CollectingReporter, Diagnostic, Location, Reporter};
pub use engine::{Reconciler, ReconcileEvent, RunSummary};
pub use error::{Error, Result};
pub use expr::{Bindings, Expr, Identifier, Properties, Value};
pub use registry::BlankRegistry;
pub use state::{CoinStore, Mode, Slot};
pub use traits::{
    ApplyResult, Blank, Creator, Describable, Finder, Model, TearDownResult, Tools,
    ValuePresenter,
};
