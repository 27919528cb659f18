use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SubmitError;
use crate::render::format_number;

/// A field the backend has sent both as a number and as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(Value),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// `false` for `0`, `NaN`, `""` and `false`, as a JS `||` would see it.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Other(value) => !matches!(value, Value::Null | Value::Bool(false)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Shipment record as returned by the API (read-only here)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub weight: Option<FieldValue>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub created_at: Option<FieldValue>,
    #[serde(default)]
    pub tracking_number: Option<FieldValue>,
    #[serde(default)]
    pub label_path: Option<FieldValue>,
}

impl Shipment {
    /// Tracking number, or `N/A` when it is absent or empty.
    pub fn tracking_display(&self) -> String {
        match &self.tracking_number {
            Some(number) if number.is_truthy() => number.to_string(),
            _ => "N/A".to_string(),
        }
    }
}

/// Body of the create-shipment request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateShipmentRequest {
    pub recipient: String,
    pub address: String,
    pub weight: f64, // non-finite values serialize as null
    pub service: String,
}

/// Raw form input captured at submit time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentDraft {
    pub recipient: Option<String>,
    pub address: Option<String>,
    pub weight: Option<String>,
    pub service: Option<String>,
}

impl ShipmentDraft {
    pub fn new(
        recipient: impl Into<String>,
        address: impl Into<String>,
        weight: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            recipient: Some(recipient.into()),
            address: Some(address.into()),
            weight: Some(weight.into()),
            service: Some(service.into()),
        }
    }

    /// Checks that every field is present and non-empty, then builds the
    /// request. The weight is forwarded as whatever `parse_weight` yields.
    pub fn into_request(self) -> Result<CreateShipmentRequest, SubmitError> {
        let recipient = required(self.recipient, "recipient")?;
        let address = required(self.address, "address")?;
        let weight = required(self.weight, "weight")?;
        let service = required(self.service, "service")?;

        Ok(CreateShipmentRequest {
            recipient,
            address,
            weight: parse_weight(&weight),
            service,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SubmitError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SubmitError::Validation(field)),
    }
}

/// Parses the longest numeric prefix of `input`, ignoring leading whitespace.
///
/// Mirrors the lenient float parse browsers apply to form input: `"12abc"` is
/// `12`, `"-Infinity"` is negative infinity, and input with no numeric prefix
/// is `NaN`.
pub fn parse_weight(input: &str) -> f64 {
    let text = input.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    if text[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
