//! Per-language naming and casing strategy.
//!
//! A [`CodeFormatter`] is the entire surface a target language has to provide
//! to plug its naming rules into the template engine. Every method has a
//! default matching the Java-like conventions most targets share, so a
//! language target only overrides what differs.

use serde_json::Value as JsonValue;

/// Upper-case the first character, leave the rest untouched
pub fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character, leave the rest untouched
pub fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Plain text form of a template value. Missing values become empty.
pub fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        JsonValue::Bool(flag) => flag.to_string(),
        JsonValue::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

/// Extract the raw type name from a type-like value: a bare name, or an
/// object carrying `ref` (preferred) or `type`.
pub fn type_like_name(value: &JsonValue) -> Option<&str> {
    let name = match value {
        JsonValue::String(name) => Some(name.as_str()),
        JsonValue::Object(map) => ["ref", "type"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(JsonValue::as_str))
            .find(|name| !name.is_empty()),
        _ => None,
    };
    name.filter(|name| !name.is_empty())
}

fn is_falsy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(flag) => !flag,
        JsonValue::String(text) => text.is_empty(),
        JsonValue::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        _ => false,
    }
}

/// Naming strategy for one target language. Implementations are stateless and
/// shared across concurrent generation calls.
pub trait CodeFormatter: Send + Sync {
    /// Capitalized type name, or `void` when the value names no type
    fn type_name(&self, value: &JsonValue) -> String {
        match type_like_name(value) {
            Some(name) => upper_first(name),
            None => "void".to_string(),
        }
    }

    /// Variable name for a type: the type name with its first letter lowered
    fn variable(&self, value: &JsonValue) -> String {
        lower_first(&self.type_name(value))
    }

    fn constant(&self, value: &JsonValue) -> String {
        value_text(value).to_uppercase()
    }

    fn namespace(&self, value: &JsonValue) -> String {
        value_text(value).to_lowercase()
    }

    fn comment(&self, value: &JsonValue) -> String {
        value_text(value)
    }

    fn method(&self, value: &JsonValue) -> String {
        value_text(value)
    }

    fn string(&self, value: &JsonValue) -> String {
        value_text(value)
    }

    fn getter(&self, type_name: &str, property_id: &str) -> String {
        let prefix = if type_name.eq_ignore_ascii_case("boolean") {
            "is"
        } else {
            "get"
        };
        format!("{prefix}{}", upper_first(property_id))
    }

    fn setter(&self, _type_name: &str, property_id: &str) -> String {
        format!("set{}", upper_first(property_id))
    }

    fn return_type(&self, value: &JsonValue) -> String {
        if is_falsy(value) {
            return "void".to_string();
        }
        self.type_name(value)
    }

    fn arguments(&self, values: &[String]) -> String {
        values.join(", ")
    }

    fn methods(&self, values: &[String]) -> String {
        values.join("\n\n")
    }
}

/// Formatter with every default in place
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodeFormatter;

impl CodeFormatter for DefaultCodeFormatter {}
