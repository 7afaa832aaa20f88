//! Data-independent string and value helpers

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::support::{HelperTable, arg, markup, truthy, value};
use crate::formatter::{lower_first, upper_first, value_text};

fn pretty_json(json: &JsonValue) -> String {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    if json.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// `namespace/name` -> `name`; anything without a slash is returned as is
pub(crate) fn asset_name(text: &str) -> String {
    match text.split('/').nth(1) {
        Some(name) => name.to_string(),
        None => text.to_string(),
    }
}

pub(crate) fn register(table: &mut HelperTable) {
    table.add(
        "lowercase",
        markup(|p| value_text(arg(p, 0)).to_lowercase()),
    );
    table.add(
        "uppercase",
        markup(|p| value_text(arg(p, 0)).to_uppercase()),
    );
    table.add("lowerFirst", markup(|p| lower_first(&value_text(arg(p, 0)))));
    table.add("upperFirst", markup(|p| upper_first(&value_text(arg(p, 0)))));
    table.add(
        "default",
        markup(|p| match arg(p, 0) {
            JsonValue::Null => value_text(arg(p, 1)),
            present => value_text(present),
        }),
    );
    table.add(
        "json",
        markup(|p| serde_json::to_string(arg(p, 0)).unwrap_or_default()),
    );
    table.add(
        "json-string",
        markup(|p| {
            let inner = serde_json::to_string(arg(p, 0)).unwrap_or_default();
            serde_json::to_string(&inner).unwrap_or_default()
        }),
    );
    table.add("toJSON", value(|p| JsonValue::String(pretty_json(arg(p, 0)))));
    table.add("assetName", markup(|p| asset_name(&value_text(arg(p, 0)))));
    table.add(
        "dashify",
        markup(|p| value_text(arg(p, 0)).replace(['_', '/'], "-")),
    );
    table.add(
        "curly",
        value(|p| JsonValue::from(if truthy(arg(p, 1)) { "{" } else { "}" })),
    );
    table.add("kebab", markup(|p| value_text(arg(p, 0)).to_kebab_case()));
    table.add("kebabCase", markup(|p| value_text(arg(p, 0)).to_kebab_case()));
    table.add("snakeCase", markup(|p| value_text(arg(p, 0)).to_snake_case()));
    table.add(
        "camelCase",
        markup(|p| value_text(arg(p, 0)).to_lower_camel_case()),
    );
    table.add(
        "pascalCase",
        value(|p| JsonValue::String(value_text(arg(p, 0)).to_upper_camel_case())),
    );
    table.add(
        "concat",
        value(|p| JsonValue::String(value_text(arg(p, 0)) + &value_text(arg(p, 1)))),
    );
    table.add(
        "toArray",
        value(|p| JsonValue::Array(p.iter().map(|json| (*json).clone()).collect())),
    );
    table.add(
        "first",
        value(|p| {
            [arg(p, 0), arg(p, 1)]
                .into_iter()
                .find(|candidate| truthy(candidate))
                .cloned()
                .unwrap_or_else(|| JsonValue::String(String::new()))
        }),
    );
}
