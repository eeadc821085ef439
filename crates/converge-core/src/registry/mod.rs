//! Plugin-based blank registry
//!
//! Provider modules register their resource kinds here under namespaced type
//! names (e.g. `dreamhost.CNAME`), along with any named driver instances
//! other components in the same run may need.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use converge_core::registry::BlankRegistry;
//!
//! let registry = BlankRegistry::new();
//!
//! // In a provider module
//! registry.provide_driver("dreamhost.DreamhostEnv", env.clone());
//! registry.register_blank("dreamhost.CNAME", Box::new(CnameBlank::new(env)));
//!
//! // In the host
//! let blank = registry.blank("dreamhost.CNAME")?;
//! ```
//!
//! Drivers are looked up by name and type. Resource kinds themselves receive
//! their environment through their constructors, not through this lookup.

use crate::error::{Error, Result};
use crate::traits::Blank;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of resource kinds and named drivers
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct BlankRegistry {
    /// Registered blanks by type name
    blanks: RwLock<HashMap<String, Arc<dyn Blank>>>,

    /// Named driver instances
    drivers: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl BlankRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource kind
    ///
    /// # Parameters
    ///
    /// - `type_name`: Namespaced kind name (e.g., "dreamhost.CNAME")
    /// - `blank`: Factory for instances of that kind
    pub fn register_blank(&self, type_name: impl Into<String>, blank: Box<dyn Blank>) {
        let type_name = type_name.into();
        tracing::debug!("Registering blank {}", type_name);
        let mut blanks = self.blanks.write().unwrap();
        blanks.insert(type_name, Arc::from(blank));
    }

    /// Look up a resource kind
    ///
    /// # Returns
    ///
    /// - `Ok(blank)`: The registered factory
    /// - `Err(Error::Config)`: Nothing is registered under that name
    pub fn blank(&self, type_name: &str) -> Result<Arc<dyn Blank>> {
        let blanks = self.blanks.read().unwrap();
        blanks
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown resource kind: {}", type_name)))
    }

    /// Provide a named driver instance
    pub fn provide_driver<T: Any + Send + Sync>(&self, name: impl Into<String>, driver: Arc<T>) {
        let name = name.into();
        tracing::debug!("Providing driver {}", name);
        let mut drivers = self.drivers.write().unwrap();
        drivers.insert(name, driver);
    }

    /// Obtain a named driver instance of a known type
    ///
    /// Returns `None` if nothing is registered under `name` or it is not a `T`.
    pub fn obtain_driver<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let drivers = self.drivers.read().unwrap();
        drivers
            .get(name)
            .cloned()
            .and_then(|driver| driver.downcast::<T>().ok())
    }

    /// List all registered kind names
    pub fn list_blanks(&self) -> Vec<String> {
        let blanks = self.blanks.read().unwrap();
        blanks.keys().cloned().collect()
    }

    /// List all driver names
    pub fn list_drivers(&self) -> Vec<String> {
        let drivers = self.drivers.read().unwrap();
        drivers.keys().cloned().collect()
    }

    /// Check if a kind is registered
    pub fn has_blank(&self, type_name: &str) -> bool {
        let blanks = self.blanks.read().unwrap();
        blanks.contains_key(type_name)
    }
}
