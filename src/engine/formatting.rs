//! Formatter delegations and structural iteration helpers

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use serde_json::{Map, Value as JsonValue};

use super::support::{
    Bindings, HelperTable, arg, markup, param, render_to_string, render_with, truthy,
};
use crate::formatter::{CodeFormatter, value_text};

/// Key/value entries of a mapping, or index/value entries of a sequence
fn entries(items: &JsonValue) -> Vec<(JsonValue, JsonValue)> {
    match items {
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, item)| (JsonValue::String(key.clone()), item.clone()))
            .collect(),
        JsonValue::Array(list) => list
            .iter()
            .enumerate()
            .map(|(index, item)| (JsonValue::from(index), item.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Copy of `item` with `key` injected under `field`
fn with_field(item: JsonValue, field: &str, key: JsonValue) -> JsonValue {
    let mut map = match item {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    };
    map.insert(field.to_string(), key);
    JsonValue::Object(map)
}

/// `{{#eachProperty props}}`: block per entry with `propertyId` set
struct EachProperty;

impl HelperDef for EachProperty {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(template) = h.template() else {
            return Ok(());
        };
        for (key, item) in entries(param(h, 0)) {
            render_with(template, with_field(item, "propertyId", key), r, ctx, rc, out)?;
        }
        Ok(())
    }
}

/// `{{#arguments params}}`: renders each argument on a single line, required
/// ones first, and joins them through the formatter
struct Arguments {
    formatter: Arc<dyn CodeFormatter>,
}

impl HelperDef for Arguments {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(template) = h.template() else {
            return Ok(());
        };

        let mut arguments: Vec<JsonValue> = entries(param(h, 0))
            .into_iter()
            .enumerate()
            .map(|(index, (key, item))| {
                let mut map = Map::new();
                map.insert("argumentName".to_string(), key);
                map.insert("index".to_string(), JsonValue::from(index));
                if let JsonValue::Object(fields) = item {
                    map.extend(fields);
                }
                JsonValue::Object(map)
            })
            .collect();

        // stable: input order is kept within each group
        arguments.sort_by_key(|argument| truthy(&argument["optional"]));

        let mut rendered = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let text = render_to_string(template, argument, r, ctx, rc)?;
            rendered.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
        }

        out.write(&self.formatter.arguments(&rendered))?;
        Ok(())
    }
}

/// `{{#methods methods}}`: block per entry with `methodName` set, joined by the formatter
struct Methods {
    formatter: Arc<dyn CodeFormatter>,
}

impl HelperDef for Methods {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(template) = h.template() else {
            return Ok(());
        };

        let mut rendered = Vec::new();
        for (key, item) in entries(param(h, 0)) {
            let item = with_field(item, "methodName", key);
            rendered.push(render_to_string(template, item, r, ctx, rc)?);
        }

        out.write(&self.formatter.methods(&rendered))?;
        Ok(())
    }
}

pub(crate) fn register(table: &mut HelperTable, bindings: &Arc<Bindings>) {
    let formatter = &bindings.formatter;

    let f = Arc::clone(formatter);
    table.add("type", markup(move |p| f.type_name(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("constant", markup(move |p| f.constant(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("comment", markup(move |p| f.comment(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("namespace", markup(move |p| f.namespace(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("variable", markup(move |p| f.variable(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("string", markup(move |p| f.string(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("method", markup(move |p| f.method(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add("returnType", markup(move |p| f.return_type(arg(p, 0))));
    let f = Arc::clone(formatter);
    table.add(
        "getter",
        markup(move |p| f.getter(&value_text(arg(p, 0)), &value_text(arg(p, 1)))),
    );
    let f = Arc::clone(formatter);
    table.add(
        "setter",
        markup(move |p| f.setter(&value_text(arg(p, 0)), &value_text(arg(p, 1)))),
    );

    table.add("eachProperty", EachProperty);
    table.add(
        "arguments",
        Arguments {
            formatter: Arc::clone(formatter),
        },
    );
    table.add(
        "methods",
        Methods {
            formatter: Arc::clone(formatter),
        },
    );
}
