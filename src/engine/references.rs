//! Type-reference helpers bound to the document's DTO catalog

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use serde_json::{Value as JsonValue, json};

use super::support::{Bindings, HelperTable, hash, param, render_block, render_with, truthy};
use crate::formatter::value_text;
use crate::type_refs::{TypeReferenceResolver, has_type_reference};

/// `{{#eachTypeReference entity all=true}}{{name}}{{/eachTypeReference}}`
struct EachTypeReference {
    bindings: Arc<Bindings>,
}

impl HelperDef for EachTypeReference {
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

        let include_all = truthy(hash(h, "all"));
        let dsl = &self.bindings.dsl;
        let built_in = |name: &str| dsl.is_built_in_type(name);
        let resolver =
            TypeReferenceResolver::new(&self.bindings.catalog, include_all).with_built_ins(&built_in);
        resolver.resolve_with(param(h, 0), |name| {
            render_with(template, json!({ "name": name }), r, ctx, rc, out)
        })?;
        Ok(())
    }
}

/// `{{#hasTypeReference entity "Name"}}`: block when any reference names the type
struct HasTypeReference;

impl HelperDef for HasTypeReference {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let type_name = value_text(param(h, 1));
        if has_type_reference(param(h, 0), &type_name) {
            render_block(h.template(), r, ctx, rc, out)
        } else {
            render_block(h.inverse(), r, ctx, rc, out)
        }
    }
}

/// Missing, empty or explicitly `void` types
pub(crate) fn is_void(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null | JsonValue::Bool(false) => true,
        JsonValue::String(name) => name.is_empty() || name.eq_ignore_ascii_case("void"),
        JsonValue::Object(map) => ["name", "ref", "type"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(JsonValue::as_str))
            .any(|name| name.eq_ignore_ascii_case("void")),
        _ => false,
    }
}

/// `{{#ifValueType returnType}}`: block unless the type is void
struct IfValueType;

impl HelperDef for IfValueType {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        if is_void(param(h, 0)) {
            render_block(h.inverse(), r, ctx, rc, out)
        } else {
            render_block(h.template(), r, ctx, rc, out)
        }
    }
}

pub(crate) fn register(table: &mut HelperTable, bindings: &Arc<Bindings>) {
    table.add(
        "eachTypeReference",
        EachTypeReference {
            bindings: Arc::clone(bindings),
        },
    );
    table.add("hasTypeReference", HasTypeReference);
    table.add("ifValueType", IfValueType);
}
