//! Plan and state values exchanged with the host, and the typed model (de)serialization around them

use core::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::OperationResult;

/// Dotted path to an attribute, e.g. `type` or `nested.field`
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AttributePath(String);

impl AttributePath {
    /// Path to a top level attribute
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Desired attributes for a resource, as computed by the host from configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Plan(Value);

impl Plan {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Decodes the plan into a resource model
    pub fn get<T: DeserializeOwned>(&self) -> OperationResult<T> {
        decode(&self.0, "invalid plan")
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn raw_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Persisted attributes for a resource. A null state means the resource does not exist.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct State(Value);

impl State {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The state of a resource that does not exist (anymore)
    pub fn null() -> Self {
        Self(Value::Null)
    }

    /// Encodes a resource model as state
    pub fn from_model<T: Serialize>(model: &T) -> OperationResult<Self> {
        let mut state = Self::null();
        state.set(model)?;
        Ok(state)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Decodes the state into a resource model
    pub fn get<T: DeserializeOwned>(&self) -> OperationResult<T> {
        decode(&self.0, "invalid state")
    }

    /// Replaces the whole state with the encoded model
    pub fn set<T: Serialize>(&mut self, model: &T) -> OperationResult<()> {
        let value = serde_json::to_value(model).map_err(|e| {
            Diagnostics::from(Diagnostic::error("invalid state", e.to_string()))
        })?;
        if !value.is_object() {
            return Err(Diagnostic::error(
                "invalid state",
                "resource state must encode as an object",
            )
            .into());
        }
        self.0 = value;
        Ok(())
    }

    /// Sets a single attribute, creating intermediate objects (and the state itself) as needed
    pub fn set_attribute(
        &mut self,
        path: &AttributePath,
        value: impl Into<Value>,
    ) -> OperationResult<()> {
        if self.0.is_null() {
            self.0 = Value::Object(Map::new());
        }
        let mut steps = path.steps().peekable();
        let mut current = &mut self.0;
        while let Some(step) = steps.next() {
            let Value::Object(map) = current else {
                return Err(Diagnostic::error(
                    "invalid state",
                    format!("cannot set `{path}`: `{step}` is not inside an object"),
                )
                .with_attribute(path.clone())
                .into());
            };
            if steps.peek().is_none() {
                map.insert(step.to_string(), value.into());
                return Ok(());
            }
            current = map
                .entry(step.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        Ok(())
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

fn decode<T: DeserializeOwned>(value: &Value, summary: &str) -> OperationResult<T> {
    T::deserialize(value)
        .map_err(|e| Diagnostics::from(Diagnostic::error(summary, e.to_string())))
}
