// # In-memory Coin Store
//
// Holds the cached state slots for one reconciliation run. Nothing is
// persisted; the store lives exactly as long as the run that created it.
//
// ## Sharing
//
// The store is cloned into every Creator of a run. Clones share the same
// underlying map. The host drives one identity's lifecycle strictly in
// sequence, so the lock only exists to make sharing sound, never to arbitrate
// concurrent reconciliation of the same identity.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Mode, Slot};
use crate::coin::CoinId;
use crate::error::{Error, Result};
use crate::traits::Model;

/// Cached state slots keyed by (identity, mode)
///
/// # Example
///
/// ```rust,no_run
/// use converge_core::coin::CoinId;
/// use converge_core::state::{CoinStore, Mode, Slot};
///
/// #[tokio::main]
/// async fn main() {
///     let store = CoinStore::new();
///     let coin = CoinId::mint();
///
///     assert!(matches!(store.get_coin(coin, Mode::Initial).await, Slot::Pending));
///     store.bind_not_found(coin, Mode::Initial).await;
///     assert!(matches!(store.get_coin(coin, Mode::Initial).await, Slot::NotFound));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoinStore {
    inner: Arc<RwLock<HashMap<(CoinId, Mode), Slot>>>,
}

impl CoinStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a slot; slots never bound read as [`Slot::Pending`]
    pub async fn get_coin(&self, coin: CoinId, mode: Mode) -> Slot {
        let guard = self.inner.read().await;
        guard.get(&(coin, mode)).cloned().unwrap_or(Slot::Pending)
    }

    /// Read a slot that must already be determined
    ///
    /// # Returns
    ///
    /// - `Ok(Some(model))`: the slot holds a model
    /// - `Ok(None)`: the slot was determined as not found
    /// - `Err(Error::Unsequenced)`: nobody determined this slot yet
    pub async fn determined(&self, coin: CoinId, mode: Mode) -> Result<Option<Arc<dyn Model>>> {
        match self.get_coin(coin, mode).await {
            Slot::Pending => Err(Error::Unsequenced { coin, mode }),
            Slot::NotFound => Ok(None),
            Slot::Bound(model) => Ok(Some(model)),
        }
    }

    /// Bind a model into a slot, replacing whatever was there
    pub async fn bind(&self, coin: CoinId, mode: Mode, model: Arc<dyn Model>) {
        let mut guard = self.inner.write().await;
        guard.insert((coin, mode), Slot::Bound(model));
    }

    /// Record that determination found nothing
    pub async fn bind_not_found(&self, coin: CoinId, mode: Mode) {
        let mut guard = self.inner.write().await;
        guard.insert((coin, mode), Slot::NotFound);
    }

    /// Whether determination has run for a slot
    pub async fn is_determined(&self, coin: CoinId, mode: Mode) -> bool {
        self.get_coin(coin, mode).await.is_determined()
    }

    /// Number of determined slots
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Forget every slot
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
