use serde_json::{Map, Value};

use crate::util::first_non_empty;

/// One entry from the search response's `results` array.
///
/// The catalog makes no promises about which keys an entry carries or what
/// type their values are, so the record keeps the raw JSON object and only
/// exposes typed, fallible lookups. A value is considered present when it
/// is a JSON string containing something other than whitespace; `null`,
/// numbers, arrays, and objects all read as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the string value of `field` if it is present and not blank.
    pub fn text(&self, field: &str) -> Option<&str> {
        first_non_empty([self.raw_str(field)])
    }

    /// Returns the first present, non-blank string among `fields`, in order.
    pub fn first_text(&self, fields: &[&str]) -> Option<&str> {
        first_non_empty(fields.iter().map(|field| self.raw_str(field)))
    }

    fn raw_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}
