//! Request parameter values.
//!
//! Parameters are either a scalar, a list of scalars (joined with commas in a
//! query string), or a structured JSON value that may only travel in a JSON
//! request body.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::error::{PusherError, PusherResult};

/// Request parameters, ordered by key.
pub type Params = BTreeMap<String, ParamValue>;

/// A single scalar parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value; must be finite to be encoded.
    Float(f64),
    /// Boolean value.
    Bool(bool),
}

impl Scalar {
    /// Deterministic textual form used in canonical strings.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encoding`] for non-finite floats.
    pub fn to_canonical(&self) -> PusherResult<String> {
        match self {
            Self::Text(s) => Ok(s.clone()),
            Self::Integer(i) => Ok(i.to_string()),
            Self::Bool(b) => Ok(b.to_string()),
            Self::Float(f) if f.is_finite() => Ok(f.to_string()),
            Self::Float(f) => Err(PusherError::Encoding(format!(
                "non-finite number {f} has no textual form"
            ))),
        }
    }

    fn to_json(&self) -> PusherResult<Value> {
        match self {
            Self::Text(s) => Ok(Value::String(s.clone())),
            Self::Integer(i) => Ok(Value::from(*i)),
            Self::Bool(b) => Ok(Value::Bool(*b)),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                PusherError::Encoding(format!("non-finite number {f} cannot be JSON encoded"))
            }),
        }
    }

    fn try_from_json(value: &Value) -> PusherResult<Self> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| PusherError::Encoding(format!("unsupported number {n}"))),
            Value::Null => Err(PusherError::Encoding("null has no textual form".into())),
            Value::Array(_) | Value::Object(_) => Err(PusherError::Encoding(
                "nested structures cannot be used as scalar parameters".into(),
            )),
        }
    }
}

/// A request parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A single scalar.
    Scalar(Scalar),
    /// A list of scalars, comma-joined when canonicalized.
    List(Vec<Scalar>),
    /// Structured JSON, valid only inside a JSON request body.
    Json(Value),
}

impl ParamValue {
    /// Build a list value from anything yielding strings.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Scalar::Text(s.into())).collect())
    }

    /// Deterministic textual form used in canonical strings.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encoding`] for structured JSON values and
    /// non-finite floats.
    pub fn to_canonical(&self) -> PusherResult<String> {
        match self {
            Self::Scalar(s) => s.to_canonical(),
            Self::List(items) => Ok(items
                .iter()
                .map(Scalar::to_canonical)
                .collect::<PusherResult<Vec<_>>>()?
                .join(",")),
            Self::Json(_) => Err(PusherError::Encoding(
                "structured values cannot be encoded into a query string".into(),
            )),
        }
    }

    /// JSON form used when the parameters travel in a request body.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encoding`] for non-finite floats.
    pub fn to_json(&self) -> PusherResult<Value> {
        match self {
            Self::Scalar(s) => s.to_json(),
            Self::List(items) => Ok(Value::Array(
                items.iter().map(Scalar::to_json).collect::<PusherResult<_>>()?,
            )),
            Self::Json(v) => Ok(v.clone()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Text(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::list(value)
    }
}

impl TryFrom<&Value> for ParamValue {
    type Error = PusherError;

    /// Convert loosely-typed JSON into a query-safe parameter.
    fn try_from(value: &Value) -> PusherResult<Self> {
        match value {
            Value::Array(items) => Ok(Self::List(
                items
                    .iter()
                    .map(Scalar::try_from_json)
                    .collect::<PusherResult<_>>()?,
            )),
            other => Scalar::try_from_json(other).map(Self::Scalar),
        }
    }
}

/// Encode a parameter map as a JSON object, preserving key order.
///
/// # Errors
///
/// Returns [`PusherError::Encoding`] if any value cannot be JSON encoded.
pub fn params_to_json(params: &Params) -> PusherResult<Value> {
    let mut object = serde_json::Map::new();
    for (key, value) in params {
        object.insert(key.clone(), value.to_json()?);
    }
    Ok(Value::Object(object))
}
