//! FILENAME: crosstab-engine/src/rows.rs
//! Flat-mapping input row model.
//!
//! Report inputs arrive as three collections of flat rows, the shape a
//! database driver hands back from a parameterized query: each row is a
//! mapping from field name to a scalar value. The builder never talks to
//! the data store itself; these types are the uniform entry contract the
//! rest of the engine operates on.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

// ============================================================================
// SCALAR VALUES
// ============================================================================

/// A scalar field value as delivered by the upstream data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the text content, or None for non-text values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Lenient numeric read: numbers pass through and numeric text is
    /// parsed (drivers deliver DECIMAL columns as text). Everything else,
    /// including null, is None.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Display rendering used for labels and error messages.
    /// Whole numbers drop their fractional part ("12", not "12.0").
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Number(n) => format_label_number(*n),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
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

fn format_label_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as a map key.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// A normalized, non-null scalar usable as a hash key.
///
/// Entity identity and sheet grouping both compare raw driver values for
/// equality; this is that value space with float hashing made safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Number(OrderedFloat),
    Boolean(bool),
    Text(String),
}

impl KeyValue {
    /// Normalizes a field value into a key. Null and absent values have no
    /// identity and return None.
    pub fn from_field(value: &FieldValue) -> Option<KeyValue> {
        match value {
            FieldValue::Null => None,
            FieldValue::Number(n) => Some(KeyValue::Number(OrderedFloat(*n))),
            FieldValue::Boolean(b) => Some(KeyValue::Boolean(*b)),
            FieldValue::Text(s) => Some(KeyValue::Text(s.clone())),
        }
    }

    /// Display rendering used for sheet labels.
    pub fn label(&self) -> String {
        match self {
            KeyValue::Number(n) => format_label_number(n.0),
            KeyValue::Boolean(b) => b.to_string(),
            KeyValue::Text(s) => s.clone(),
        }
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// One flat input row: a mapping from field name to scalar value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(FxHashMap<String, FieldValue>);

impl Row {
    pub fn new() -> Self {
        Row(FxHashMap::default())
    }

    /// Consuming setter, used to assemble rows field by field.
    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Looks up a field. An absent field and an explicit null are treated
    /// identically by every consumer, so callers mostly go through
    /// [`Row::field`].
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Looks up a field, mapping absence to null.
    pub fn field(&self, field: &str) -> &FieldValue {
        self.0.get(field).unwrap_or(&FieldValue::Null)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Identifies one of the three input row collections. A closed set: queries,
/// errors and logs all name collections through this enum rather than
/// caller-supplied strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSetKind {
    Metrics,
    Details,
    Annotations,
}

impl std::fmt::Display for RowSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RowSetKind::Metrics => "metrics",
            RowSetKind::Details => "category-detail",
            RowSetKind::Annotations => "annotation",
        };
        f.write_str(name)
    }
}

/// The three named flat row collections for a single reporting period.
///
/// Empty collections are valid and yield an empty report. Whether the rows
/// came from one query or three is invisible here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowSets {
    #[serde(default)]
    pub metrics: Vec<Row>,
    #[serde(default)]
    pub details: Vec<Row>,
    #[serde(default)]
    pub annotations: Vec<Row>,
}

impl RowSets {
    pub fn new() -> Self {
        RowSets::default()
    }
}

// ============================================================================
// NUMERIC COERCION
// ============================================================================

/// Coerces a field that must be numeric when present. Null and absent
/// degrade to 0.0; a present value that cannot be read as a number is a
/// structural error naming the row.
pub fn required_numeric(
    row: &Row,
    field: &str,
    collection: RowSetKind,
    index: usize,
) -> Result<f64, BuildError> {
    match row.field(field) {
        FieldValue::Null => Ok(0.0),
        value => value.numeric().ok_or_else(|| BuildError::NonNumericField {
            collection,
            index,
            field: field.to_string(),
            value: value.display(),
        }),
    }
}

/// Coerces a field that only feeds display text (e.g. an annotation
/// duration). Anything unreadable degrades to 0.0 instead of failing the
/// build.
pub fn optional_numeric(row: &Row, field: &str) -> f64 {
    row.field(field).numeric().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(FieldValue::Number(1.5).numeric(), Some(1.5));
        assert_eq!(FieldValue::Text(" 2.25 ".to_string()).numeric(), Some(2.25));
        assert_eq!(FieldValue::Text("n/a".to_string()).numeric(), None);
        assert_eq!(FieldValue::Boolean(true).numeric(), None);
        assert_eq!(FieldValue::Null.numeric(), None);
    }

    #[test]
    fn test_required_numeric_degrades_null_to_zero() {
        let row = Row::new().set("Hrs", FieldValue::Null);
        let value = required_numeric(&row, "Hrs", RowSetKind::Details, 0).unwrap();
        assert_eq!(value, 0.0);

        // Absent field behaves like null
        let value = required_numeric(&Row::new(), "Hrs", RowSetKind::Details, 0).unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_required_numeric_rejects_garbage() {
        let row = Row::new().set("Hrs", "half an hour");
        let err = required_numeric(&row, "Hrs", RowSetKind::Details, 3).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Hrs"), "error should name the field: {}", message);
        assert!(message.contains("category-detail"), "error should name the collection: {}", message);
    }

    #[test]
    fn test_key_value_null_has_no_identity() {
        assert_eq!(KeyValue::from_field(&FieldValue::Null), None);
        assert_eq!(
            KeyValue::from_field(&FieldValue::Text("A".to_string())),
            Some(KeyValue::Text("A".to_string()))
        );
    }

    #[test]
    fn test_nan_keys_collide() {
        let a = KeyValue::Number(OrderedFloat(f64::NAN));
        let b = KeyValue::Number(OrderedFloat(f64::NAN));
        assert_eq!(a, b);

        let mut map: FxHashMap<KeyValue, u32> = FxHashMap::default();
        map.insert(a, 1);
        *map.entry(b).or_insert(0) += 1;
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_label_rendering() {
        assert_eq!(KeyValue::Number(OrderedFloat(12.0)).label(), "12");
        assert_eq!(KeyValue::Number(OrderedFloat(1.5)).label(), "1.5");
        assert_eq!(KeyValue::Text("Night".to_string()).label(), "Night");
    }

    #[test]
    fn test_field_value_json_shape() {
        let row = Row::new()
            .set("PlantId", "P1")
            .set("Hrs", 1.5)
            .set("Flag", true)
            .set("Gap", FieldValue::Null);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["PlantId"], serde_json::json!("P1"));
        assert_eq!(json["Hrs"], serde_json::json!(1.5));
        assert_eq!(json["Flag"], serde_json::json!(true));
        assert!(json["Gap"].is_null());

        let back: Row = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }
}
