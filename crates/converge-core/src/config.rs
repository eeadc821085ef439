//! Configuration types for the reconciler
//!
//! A declaration file is JSON:
//!
//! ```json
//! {
//!   "bindings": { "web_host": "host.example.net" },
//!   "resources": [
//!     { "kind": "dreamhost.DomainName", "name": "example.com", "action": "find" },
//!     {
//!       "kind": "dreamhost.CNAME",
//!       "name": "blog.example.com",
//!       "properties": { "PointsTo": { "$ref": "web_host" } }
//!     }
//!   ]
//! }
//! ```

use crate::diagnostics::Location;
use crate::error::{Error, Result};
use crate::expr::{Bindings, Expr, Identifier, Properties, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Main declaration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Resources to reconcile, in declaration order
    pub resources: Vec<ResourceConfig>,

    /// Symbols available to property expressions
    #[serde(default)]
    pub bindings: BTreeMap<String, serde_json::Value>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Where this configuration was read from (used in diagnostics)
    #[serde(skip, default = "default_source")]
    pub source: String,
}

impl DeployConfig {
    /// Parse a declaration document
    pub fn from_json_str(json: &str, source: impl Into<String>) -> Result<Self> {
        let mut config: DeployConfig = serde_json::from_str(json)?;
        config.source = source.into();
        Ok(config)
    }

    /// Read and parse a declaration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents, path.display().to_string())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.resources.is_empty() {
            return Err(Error::config("No resources declared"));
        }

        let mut seen = HashSet::new();
        for (i, resource) in self.resources.iter().enumerate() {
            if resource.kind.is_empty() {
                return Err(Error::config(format!(
                    "{}: resource kind cannot be empty",
                    self.location_of(i)
                )));
            }
            if resource.name.is_empty() {
                return Err(Error::config(format!(
                    "{}: resource name cannot be empty",
                    self.location_of(i)
                )));
            }
            if !seen.insert((resource.kind.as_str(), resource.name.as_str())) {
                return Err(Error::config(format!(
                    "{}: {}[{}] is declared more than once",
                    self.location_of(i),
                    resource.kind,
                    resource.name
                )));
            }
        }

        self.to_bindings()?;
        Ok(())
    }

    /// Location of the declaration at `index`
    pub fn location_of(&self, index: usize) -> Location {
        Location::new(self.source.clone(), index + 1)
    }

    /// Evaluate the bindings table
    pub fn to_bindings(&self) -> Result<Bindings> {
        let mut bindings = Bindings::new();
        for (name, json) in &self.bindings {
            let value = Value::from_json(json)
                .map_err(|e| Error::config(format!("binding {}: {}", name, e)))?;
            bindings.bind(name.clone(), value);
        }
        Ok(bindings)
    }
}

fn default_source() -> String {
    "<inline>".to_string()
}

/// What the host should do with a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclAction {
    /// Create the resource if it does not exist
    #[default]
    Ensure,
    /// Only look the resource up
    Find,
}

/// One declared resource block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource kind (e.g., "dreamhost.CNAME")
    pub kind: String,

    /// Resource name (e.g., "blog.example.com")
    pub name: String,

    /// Ensure or find
    #[serde(default)]
    pub action: DeclAction,

    /// Declared properties as unevaluated expressions
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ResourceConfig {
    /// Create a new ensure-declaration with no properties
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            action: DeclAction::Ensure,
            properties: BTreeMap::new(),
        }
    }

    /// Set the action
    pub fn with_action(mut self, action: DeclAction) -> Self {
        self.action = action;
        self
    }

    /// Add a property
    pub fn with_property(mut self, id: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(id.into(), value);
        self
    }

    /// Convert the declared properties to expressions
    ///
    /// `loc` is the block's location; each key is located within it.
    pub fn to_properties(&self, loc: &Location) -> Result<Properties> {
        let mut props = Properties::new();
        for (id, json) in &self.properties {
            let expr = Expr::from_json(json).map_err(|e| {
                Error::config(format!("{}: property {} of {}: {}", loc, id, self.name, e))
            })?;
            props.insert(Identifier::new(id.clone(), loc.property(id.clone())), expr);
        }
        Ok(props)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 100 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Refuse to mutate anything when state determination reported
    /// configuration diagnostics
    #[serde(default = "default_halt_on_diagnostics")]
    pub halt_on_diagnostics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            halt_on_diagnostics: default_halt_on_diagnostics(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_halt_on_diagnostics() -> bool {
    true
}
