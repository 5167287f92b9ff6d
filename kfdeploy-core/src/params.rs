//! Run parameters
//!
//! A parameters file is a flat YAML mapping from parameter name to scalar
//! value. It is read once and passed through to the run request.

use serde_yaml::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::dto::run::ApiParameter;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Failed to read parameters file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse parameters: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Parameters document must be a mapping of name to value")]
    NotAMapping,

    #[error("Parameter `{0}` must be a string, number or boolean")]
    NotScalar(String),
}

/// A scalar parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::Integer(i) => write!(f, "{}", i),
            // Keep a decimal point so whole floats stay floats on the other side
            ParamValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
        }
    }
}

/// Ordered mapping of parameter name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

impl Parameters {
    /// Parse a YAML parameters document
    ///
    /// An empty document yields an empty mapping. Entries keep document order.
    pub fn from_yaml(text: &str) -> Result<Self, ParamsError> {
        let value: Value = serde_yaml::from_str(text)?;

        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(m) => m,
            _ => return Err(ParamsError::NotAMapping),
        };

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(ParamsError::NotAMapping),
            };
            let value = scalar(&name, value)?;
            entries.push((name, value));
        }

        Ok(Self { entries })
    }

    /// Read and parse a parameters file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Set `name`, replacing an existing entry in place
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as the service's name/value list
    pub fn to_api_parameters(&self) -> Vec<ApiParameter> {
        self.entries
            .iter()
            .map(|(name, value)| ApiParameter {
                name: name.clone(),
                value: value.to_string(),
            })
            .collect()
    }
}

fn scalar(name: &str, value: Value) -> Result<ParamValue, ParamsError> {
    match value {
        Value::String(s) => Ok(ParamValue::String(s)),
        Value::Bool(b) => Ok(ParamValue::Bool(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ParamValue::Integer(i))
            } else if let Some(x) = n.as_f64() {
                Ok(ParamValue::Float(x))
            } else {
                Err(ParamsError::NotScalar(name.to_string()))
            }
        }
        _ => Err(ParamsError::NotScalar(name.to_string())),
    }
}
