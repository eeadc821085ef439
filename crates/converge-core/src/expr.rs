//! Declared properties and their evaluation
//!
//! The declaration language itself belongs to the host. This module carries
//! the part the reconciler needs: an unevaluated [`Expr`] per property
//! [`Identifier`], and [`Bindings`] to evaluate it against.

use crate::diagnostics::Location;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An evaluated value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string
    Str(String),
    /// An integer
    Int(i64),
    /// A boolean
    Bool(bool),
    /// A list of values
    List(Vec<Value>),
}

impl Value {
    /// Canonical string for string-producing values, `None` for the rest
    pub fn as_stringer(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(_) | Value::List(_) => None,
        }
    }

    /// Convert a JSON value; objects and null have no `Value` form
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| Error::config(format!("unsupported number: {}", n))),
            serde_json::Value::Array(items) => Ok(Value::List(
                items.iter().map(Value::from_json).collect::<Result<_>>()?,
            )),
            other => Err(Error::config(format!("unsupported value: {}", other))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An unevaluated expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal value
    Literal(Value),
    /// A reference to a bound symbol
    Symbol(String),
}

impl Expr {
    /// Shorthand for a string literal
    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Value::Str(s.into()))
    }

    /// Shorthand for a symbol reference
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Convert declaration JSON; `{"$ref": "name"}` is a symbol reference
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        if let serde_json::Value::Object(map) = json {
            return match (map.len(), map.get("$ref")) {
                (1, Some(serde_json::Value::String(name))) => Ok(Expr::Symbol(name.clone())),
                _ => Err(Error::config(format!(
                    "objects are only allowed as {{\"$ref\": \"name\"}}, got {}",
                    json
                ))),
            };
        }
        Ok(Expr::Literal(Value::from_json(json)?))
    }
}

/// A property key with its source location
///
/// Equality and ordering consider only the identifier text.
#[derive(Debug, Clone)]
pub struct Identifier {
    id: String,
    loc: Location,
}

impl Identifier {
    pub fn new(id: impl Into<String>, loc: Location) -> Self {
        Self { id: id.into(), loc }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn loc(&self) -> &Location {
        &self.loc
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Declared properties of one resource block
pub type Properties = BTreeMap<Identifier, Expr>;

/// Symbol table expressions are evaluated against
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    symbols: HashMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) a symbol
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    /// Builder-style [`bind`](Self::bind)
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bind(name, value);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    /// Evaluate an expression
    pub fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Symbol(name) => self
                .lookup(name)
                .cloned()
                .ok_or_else(|| Error::eval(format!("unbound symbol: {}", name))),
        }
    }

    /// Evaluate an expression that must produce a string
    ///
    /// A non-string result means the declaration was not type checked, so it
    /// is an evaluation error rather than a diagnostic.
    pub fn eval_as_stringer(&self, expr: &Expr) -> Result<String> {
        let value = self.eval(expr)?;
        value
            .as_stringer()
            .ok_or_else(|| Error::eval(format!("not a string-producing value: {}", value)))
    }
}
