// # Presenters
//
// State determination does not return its result; it reports it to a
// presenter, either with a model or as "not found". A failed determination
// reports nothing and returns an error instead.

use super::Model;
use std::sync::Arc;

/// Result channel used by `determine_*_state`
pub trait ValuePresenter: Send {
    /// The resource exists (or is wanted) as described by `model`
    fn present(&mut self, model: Arc<dyn Model>);

    /// The resource does not exist
    fn not_found(&mut self);
}

/// What a presenter was told
#[derive(Debug, Clone)]
pub enum Presented {
    Found(Arc<dyn Model>),
    NotFound,
}

/// Presenter that captures the outcome so the host can bind it
#[derive(Debug, Default)]
pub struct SlotPresenter {
    outcome: Option<Presented>,
}

impl SlotPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reported outcome, `None` if nothing was reported
    pub fn outcome(&self) -> Option<&Presented> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(self) -> Option<Presented> {
        self.outcome
    }

    fn record(&mut self, presented: Presented) {
        if self.outcome.is_some() {
            tracing::warn!("presenter was reported to more than once; keeping the latest");
        }
        self.outcome = Some(presented);
    }
}

impl ValuePresenter for SlotPresenter {
    fn present(&mut self, model: Arc<dyn Model>) {
        self.record(Presented::Found(model));
    }

    fn not_found(&mut self) {
        self.record(Presented::NotFound);
    }
}
