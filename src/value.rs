//! Value
//!
//! The tagged scalar stored in every cell of a row, the target column included.
use crate::errors::ArborError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two kinds a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Integer category ids, discriminant `0`.
    #[serde(alias = "class")]
    Category,
    /// Continuous measurements, discriminant `1`.
    #[serde(alias = "value")]
    Measurement,
}

impl ValueKind {
    /// Numeric discriminant of the kind.
    pub fn discriminant(&self) -> u8 {
        match self {
            ValueKind::Category => 0,
            ValueKind::Measurement => 1,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueKind::Category => write!(f, "category"),
            ValueKind::Measurement => write!(f, "measurement"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "class" | "category" => Ok(ValueKind::Category),
            "value" | "measurement" => Ok(ValueKind::Measurement),
            _ => Err(ArborError::ParseString(
                s.to_string(),
                "ValueKind".to_string(),
                items_to_strings(vec!["class", "category", "value", "measurement"]),
            )),
        }
    }
}

/// A single cell of a row.
///
/// Values are immutable once built; read them through the accessor that
/// matches the configured kind of their column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A category id.
    Category(i64),
    /// A continuous measurement.
    Measurement(f64),
}

impl Value {
    /// The kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Category(_) => ValueKind::Category,
            Value::Measurement(_) => ValueKind::Measurement,
        }
    }

    /// Numeric discriminant, `0` for categories and `1` for measurements.
    #[inline]
    pub fn dtype(&self) -> u8 {
        self.kind().discriminant()
    }

    /// The category id of this value.
    #[inline]
    pub fn category(&self) -> Result<i64, ArborError> {
        match self {
            Value::Category(c) => Ok(*c),
            Value::Measurement(_) => Err(ArborError::TypeMismatch {
                expected: ValueKind::Category,
                found: ValueKind::Measurement,
            }),
        }
    }

    /// The measurement held by this value.
    #[inline]
    pub fn measurement(&self) -> Result<f64, ArborError> {
        match self {
            Value::Measurement(m) => Ok(*m),
            Value::Category(_) => Err(ArborError::TypeMismatch {
                expected: ValueKind::Measurement,
                found: ValueKind::Category,
            }),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Category(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Measurement(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Category(c) => write!(f, "{}", c),
            Value::Measurement(m) => write!(f, "{}", m),
        }
    }
}
