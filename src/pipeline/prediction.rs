use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants;
use crate::error::ParseFailure;

/// One extractable attribute as returned by the prediction service: an
/// unvalidated value, the model's confidence in it, and optionally where on
/// the page it was read from. Immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    pub raw_value: Option<String>,
    pub confidence: f64,
    pub bounding_region: Option<BoundingRegion>,
}

/// Page geometry for a field, as a polygon of `[x, y]` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub polygon: Vec<[f64; 2]>,
}

/// Locale hint block the service attaches when it detects the document's
/// language/country/currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocale {
    pub language: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub confidence: f64,
}

/// A line-item entry with its mandatory sub-fields present. Presence of the
/// sub-keys is checked structurally; the sub-values themselves may still be
/// null or malformed and are left to normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLineItem {
    pub description: RawField,
    pub quantity: RawField,
    pub unit_price: RawField,
    pub line_total: RawField,
}

/// The untrusted structured prediction for one document, after the
/// structural gate. Absent field keys are treated identically to a field
/// the service failed to read: no value, zero confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub fields: BTreeMap<String, RawField>,
    pub line_items: Vec<RawLineItem>,
    pub locale: Option<RawLocale>,
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn clamp_confidence(c: f64) -> f64 {
    c.clamp(0.0, 1.0)
}

impl RawField {
    /// Stand-in for a key the payload did not carry at all.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::Object(map) => Self {
                raw_value: map.get("value").and_then(value_to_string),
                confidence: map
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .map(clamp_confidence)
                    .unwrap_or(0.0),
                bounding_region: map.get("polygon").and_then(BoundingRegion::from_value),
            },
            // A bare scalar carries no confidence signal from the service
            other => Self {
                raw_value: value_to_string(other),
                confidence: 0.0,
                bounding_region: None,
            },
        }
    }
}

impl BoundingRegion {
    fn from_value(v: &Value) -> Option<Self> {
        let points = v.as_array()?;
        let polygon: Vec<[f64; 2]> = points
            .iter()
            .filter_map(|point| {
                let pair = point.as_array()?;
                Some([pair.first()?.as_f64()?, pair.get(1)?.as_f64()?])
            })
            .collect();
        (!polygon.is_empty()).then_some(Self { polygon })
    }
}

impl RawLocale {
    fn from_value(v: &Value) -> Self {
        Self {
            language: v.get("language").and_then(Value::as_str).map(str::to_string),
            country: v.get("country").and_then(Value::as_str).map(str::to_string),
            currency: v.get("currency").and_then(Value::as_str).map(str::to_string),
            confidence: v
                .get("confidence")
                .and_then(Value::as_f64)
                .map(clamp_confidence)
                .unwrap_or(0.0),
        }
    }
}

impl RawLineItem {
    fn from_value(entry: &Value) -> Result<Self, ParseFailure> {
        let map = entry.as_object().ok_or_else(|| {
            ParseFailure::new("line item entry is not a JSON object", entry.clone())
        })?;

        for key in constants::LINE_ITEM_KEYS {
            if !map.contains_key(key) {
                return Err(ParseFailure::new(
                    format!("line item entry is missing mandatory sub-key '{key}'"),
                    entry.clone(),
                ));
            }
        }

        Ok(Self {
            description: RawField::from_value(&map["description"]),
            quantity: RawField::from_value(&map["quantity"]),
            unit_price: RawField::from_value(&map["unit_price"]),
            line_total: RawField::from_value(&map["line_total"]),
        })
    }
}

impl RawPrediction {
    /// Structural gate over the untrusted payload. Only shape violations
    /// fail here; any readable shape comes through, however incomplete.
    pub fn from_value(payload: &Value) -> Result<Self, ParseFailure> {
        let map = payload.as_object().ok_or_else(|| {
            ParseFailure::new("prediction payload is not a JSON object", payload.clone())
        })?;
        if map.is_empty() {
            return Err(ParseFailure::new(
                "prediction payload is empty",
                payload.clone(),
            ));
        }

        let mut fields = BTreeMap::new();
        let mut line_items = Vec::new();
        let mut locale = None;

        for (key, value) in map {
            match key.as_str() {
                constants::LINE_ITEMS => {
                    let entries = value.as_array().ok_or_else(|| {
                        ParseFailure::new("line_items is not an array", value.clone())
                    })?;
                    for entry in entries {
                        line_items.push(RawLineItem::from_value(entry)?);
                    }
                }
                constants::LOCALE => locale = Some(RawLocale::from_value(value)),
                _ => {
                    fields.insert(key.clone(), RawField::from_value(value));
                }
            }
        }

        debug!(
            fields = fields.len(),
            line_items = line_items.len(),
            "structural gate accepted prediction payload"
        );
        Ok(Self {
            fields,
            line_items,
            locale,
        })
    }

    /// Field lookup with the absent-key convention applied.
    pub fn field(&self, name: &str) -> RawField {
        self.fields.get(name).cloned().unwrap_or_else(RawField::absent)
    }
}
