//! Source locations and the diagnostic sink
//!
//! Configuration errors in declared resources (unknown properties, missing
//! required properties, kinds that can only be found) are reported here with
//! their location. Reporting does not abort anything; the host decides what to
//! do once a pass is complete.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Where a declaration came from
///
/// Declarations are addressed structurally, not by text position: the
/// declaration block's index in its source and, for property keys, the key.
/// Displays as `site.json[2]` or `site.json[2].PointsTo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Source file (or other origin) of the declaration
    pub file: String,
    /// 1-based index of the declaration block within its source
    pub decl: usize,
    /// Property key within the block, if the location is that narrow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl Location {
    /// Location of a whole declaration block
    pub fn new(file: impl Into<String>, decl: usize) -> Self {
        Self {
            file: file.into(),
            decl,
            property: None,
        }
    }

    /// Location of one property key inside this block
    pub fn property(&self, id: impl Into<String>) -> Self {
        Self {
            file: self.file.clone(),
            decl: self.decl,
            property: Some(id.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.file, self.decl)?;
        if let Some(property) = &self.property {
            write!(f, ".{}", property)?;
        }
        Ok(())
    }
}

/// A single reported configuration problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the problem was found
    pub loc: Location,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.message)
    }
}

/// Sink for configuration diagnostics
///
/// Implementations must be thread-safe; they are shared by every Blank,
/// Finder and Creator in a run.
pub trait Reporter: Send + Sync {
    /// Report a problem at a location
    fn report_at(&self, loc: &Location, message: String);

    /// Everything reported so far, in report order
    fn diagnostics(&self) -> Vec<Diagnostic>;

    /// Whether anything has been reported
    fn has_errors(&self) -> bool {
        !self.diagnostics().is_empty()
    }
}

/// Reporter that keeps every diagnostic in memory and logs it
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reported: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics reported
    pub fn len(&self) -> usize {
        self.reported.lock().unwrap().len()
    }

    /// Check if nothing has been reported
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Reporter for CollectingReporter {
    fn report_at(&self, loc: &Location, message: String) {
        tracing::error!("{}: {}", loc, message);
        self.reported.lock().unwrap().push(Diagnostic {
            loc: loc.clone(),
            message,
        });
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        self.reported.lock().unwrap().clone()
    }

    fn has_errors(&self) -> bool {
        !self.is_empty()
    }
}
