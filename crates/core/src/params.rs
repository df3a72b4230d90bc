//! Parameter mappings substituted into templates.
//!
//! Values are kept as JSON values so callers can pass strings and numbers
//! interchangeably; they are stringified only when a template is rendered.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ParamsError;
use crate::template::IDENTIFIER_PATTERN;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{IDENTIFIER_PATTERN}$")).expect("valid regex"));

/// A caller-supplied name → value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The value for `name` as it would be rendered into a template.
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name).map(value_text)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into this mapping; values from `other` win.
    pub fn merge(&mut self, other: &Params) {
        for (name, value) in other.iter() {
            self.0.insert(name.to_string(), value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Render a value the way it appears in template output.
///
/// Strings are used verbatim, numbers and booleans in their natural form,
/// and `null` renders as empty text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a `name=value` assignment, inferring numeric values.
///
/// Integers and finite floats become JSON numbers; anything else is kept as
/// a string.
pub fn parse_assignment(text: &str) -> Result<(String, Value), ParamsError> {
    let (name, raw) = text
        .split_once('=')
        .ok_or_else(|| ParamsError::NotAnAssignment(text.to_string()))?;
    let name = name.trim();
    if !IDENTIFIER_RE.is_match(name) {
        return Err(ParamsError::InvalidName(name.to_string()));
    }
    Ok((name.to_string(), infer_value(raw.trim())))
}

fn infer_value(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
