//! Numeric coercion at the collaborator boundary.
//!
//! Catalog base values, mod "plus" levels and wand charges arrive from
//! upstream either as JSON numbers or as numeric text. They are parsed once
//! here into typed values; anything unparseable becomes "absent" instead of
//! leaking loosely-typed data into the pricing pipeline.

use serde::{Deserialize, Deserializer};

/// A raw numeric field as received from upstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl NumericInput {
    /// Interpret the input as a finite decimal.
    ///
    /// Booleans are never numeric; text is trimmed before parsing.
    pub fn to_decimal(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) => n.is_finite().then_some(*n),
            NumericInput::Text(s) => parse_decimal(s),
            NumericInput::Flag(_) => None,
        }
    }

    /// Interpret the input as a whole number.
    pub fn to_integer(&self) -> Option<i64> {
        let value = self.to_decimal()?;
        if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return None;
        }
        Some(value as i64)
    }
}

/// Parse numeric text into a finite decimal.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Serde helper: optional decimal that accepts numbers or numeric strings.
///
/// `null`, a missing field and unparseable text all yield `None`.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumericInput>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.to_decimal()))
}

/// Serde helper: optional whole number that accepts numbers or numeric strings.
pub fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumericInput>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.to_integer()))
}
