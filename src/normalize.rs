//! Field resolution for upstream JSON objects.
//!
//! The registry has served the same record under several field names over
//! time. Each canonical field lists the upstream keys it accepts, in order of
//! preference; the first key holding a value of the expected JSON type wins.

use serde_json::{Map, Value};

/// A decoded JSON object.
pub type JsonObject = Map<String, Value>;

/// A canonical field and the upstream keys it may be read from.
pub(crate) struct Field {
    pub(crate) aliases: &'static [&'static str],
}

impl Field {
    pub(crate) const fn new(aliases: &'static [&'static str]) -> Self {
        Self { aliases }
    }

    /// First alias holding a string.
    pub(crate) fn string(&self, object: &JsonObject) -> Option<String> {
        self.aliases
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// First alias holding an integer.
    pub(crate) fn int(&self, object: &JsonObject) -> Option<i64> {
        self.aliases
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_i64))
    }

    /// Truthiness of the first alias present.
    pub(crate) fn truthy(&self, object: &JsonObject) -> bool {
        self.aliases
            .iter()
            .find_map(|key| object.get(*key))
            .is_some_and(is_truthy)
    }

    /// First alias holding an object.
    pub(crate) fn object<'a>(&self, object: &'a JsonObject) -> Option<&'a JsonObject> {
        self.aliases
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_object))
    }

    fn covers(&self, key: &str) -> bool {
        self.aliases.contains(&key)
    }
}

/// Loose truthiness: `null`, `false`, `0`, `""`, `"0"` and empty
/// collections are false, everything else is true.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Collect the open parameter bag.
///
/// Starts from `explicit` (an upstream object carrying the bag directly) and
/// adds every top-level key not claimed by any of `known`. Keys from the
/// top level override explicit entries of the same name. Returns `None` when
/// nothing was collected.
pub(crate) fn collect_unknown(
    object: &JsonObject,
    known: &[&Field],
    explicit: Option<&JsonObject>,
) -> Option<JsonObject> {
    let mut bag = explicit.cloned().unwrap_or_default();

    for (key, value) in object {
        if !known.iter().any(|field| field.covers(key)) {
            bag.insert(key.clone(), value.clone());
        }
    }

    if bag.is_empty() {
        None
    } else {
        Some(bag)
    }
}
