//! Ordered option maps and the value semantics the delta engine relies on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered mapping from option name to value.
///
/// Insertion order is preserved so that deltas and printed option sets follow
/// the order of the defaults they were derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(Map<String, Value>);

impl OptionSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite entries with every entry of `other`, appending new keys.
    pub fn overlay(&mut self, other: &OptionSet) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for OptionSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Whether a requested value counts as "set".
///
/// Null, `false`, zero, empty strings and empty collections are not set and
/// leave the default in place.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Value equality where `5` and `5.0` are the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Parse a command-line value.
///
/// JSON literals (`10`, `0.5`, `true`, `null`, `[0.0, 0.2]`, `"quoted"`) keep
/// their type; anything else is taken as a bare string.
pub fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

/// Render a value as a single path component.
///
/// Numbers and booleans render as their JSON text. Strings keep ASCII
/// letters, digits, `-`, `_` and non-leading `.`; every other byte is
/// percent-encoded, so distinct strings never share a component and no
/// string can produce `.`, `..` or a path separator.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if looks_like_literal(s) => format!("%str-{}", encode_component(s)),
        Value::String(s) => encode_component(s),
        Value::Array(_) | Value::Object(_) => encode_component(&value.to_string()),
    }
}

/// Strings such as `"0.3"` or `"true"` would otherwise share a label with the
/// number or boolean they spell. [`encode_component`] never emits `%s`, so the
/// prefix keeps them apart.
fn looks_like_literal(s: &str) -> bool {
    serde_json::from_str::<Value>(s).is_ok_and(|v| !v.is_string())
}

/// Percent-encode a string for use as a directory or file name.
pub fn encode_component(raw: &str) -> String {
    if raw.is_empty() {
        return "%empty".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for (i, byte) in raw.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || byte == b'-'
            || byte == b'_'
            || (byte == b'.' && i > 0);
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
