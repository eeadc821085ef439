//! Resource identity
//!
//! A [`CoinId`] is minted once per declared resource block and stays the same
//! across every lifecycle call made for that block within a run. It is the key
//! into the [`CoinStore`](crate::state::CoinStore).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_COIN: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique resource identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinId(u64);

impl CoinId {
    /// Mint a fresh identity
    pub fn mint() -> Self {
        Self(NEXT_COIN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coin#{}", self.0)
    }
}
