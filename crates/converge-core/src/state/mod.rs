// # Cached State Slots
//
// Every resource identity gets two slots per run: what the provider reported
// (INITIAL) and what the declarations ask for (DESIRED). A slot is determined
// at most once per run; lifecycle methods read it back instead of asking the
// provider again.

pub mod memory;

pub use memory::CoinStore;

use crate::traits::Model;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which state a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// State observed from the provider
    Initial,
    /// State computed from the declarations
    Desired,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Initial => write!(f, "INITIAL"),
            Mode::Desired => write!(f, "DESIRED"),
        }
    }
}

/// Contents of one cached state slot
#[derive(Debug, Clone)]
pub enum Slot {
    /// Never determined in this run
    Pending,
    /// Determined, and there is nothing there
    NotFound,
    /// Determined, with a model
    Bound(Arc<dyn Model>),
}

impl Slot {
    /// Whether state determination has run for this slot
    pub fn is_determined(&self) -> bool {
        !matches!(self, Slot::Pending)
    }

    /// The bound model, if any
    pub fn model(&self) -> Option<&Arc<dyn Model>> {
        match self {
            Slot::Bound(model) => Some(model),
            _ => None,
        }
    }
}
