//! Core traits for the reconciler
//!
//! This module defines the abstract interfaces that resource kinds implement.
//!
//! - [`Model`]: Immutable snapshot of a resource's attributes
//! - [`ValuePresenter`]: Result channel for state determination
//! - [`Finder`]: Lookup-only capability
//! - [`Creator`]: Full lifecycle capability (observe, desire, converge, tear down)
//! - [`Blank`]: Factory producing Finders and Creators for one resource kind

pub mod model;
pub mod presenter;
pub mod resource;

pub use model::{Describable, Model, model_as};
pub use presenter::{Presented, SlotPresenter, ValuePresenter};
pub use resource::{ApplyResult, Blank, Creator, Finder, TearDownResult, Tools};
