//! Helpers bridging embedded source blocks to the DSL parser

use std::sync::Arc;

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
};
use serde_json::{Map, Value as JsonValue, json};
use tracing::{debug, warn};

use super::support::{
    Bindings, HelperTable, arg, current_value, dsl_failure, hash, param, render_block,
    render_to_string, render_with, value,
};
use crate::dsl::{
    DslConfiguration, DslError, DslParseOptions, EntityReader, entity_type, entity_type_of,
};
use crate::formatter::{upper_first, value_text};

const DEFAULT_CONTROLLER: &str = "main";

/// Parse `source.value` and reshape the entities for templates:
/// loose methods are hoisted into a controller named after `base_name`,
/// controllers without a namespace get `base_name` as theirs.
pub(crate) fn reshape_entities(entities: Vec<JsonValue>, base_name: &str) -> Vec<JsonValue> {
    let (methods, others): (Vec<JsonValue>, Vec<JsonValue>) = entities
        .into_iter()
        .partition(|entity| entity_type_of(entity) == Some(entity_type::METHOD));

    let mut reshaped: Vec<JsonValue> = others
        .into_iter()
        .map(|entity| {
            if entity_type_of(&entity) != Some(entity_type::CONTROLLER) {
                return entity;
            }
            let mut entity = entity;
            if let Some(map) = entity.as_object_mut() {
                let missing = map.get("namespace").is_none_or(JsonValue::is_null);
                if missing {
                    map.insert("namespace".to_string(), json!(base_name));
                }
            }
            entity
        })
        .collect();

    if !methods.is_empty() {
        reshaped.push(json!({
            "type": entity_type::CONTROLLER,
            "name": base_name,
            "path": "/",
            "methods": methods,
        }));
    }

    reshaped
}

/// `{{#kaplang-types source namespace="x"}}` and friends
struct ParseBlock {
    bindings: Arc<Bindings>,
    options: DslParseOptions,
}

impl ParseBlock {
    fn base_name(&self, h: &Helper<'_>, ctx: &Context) -> String {
        match hash(h, "namespace") {
            JsonValue::Null => ctx
                .data()
                .pointer("/data/metadata/name")
                .and_then(JsonValue::as_str)
                .unwrap_or(DEFAULT_CONTROLLER)
                .to_string(),
            namespace => value_text(namespace),
        }
    }

    fn parse(&self, source: &str) -> Result<Option<Vec<JsonValue>>, DslError> {
        let result = self.bindings.dsl.parse(source, &self.options)?;
        if !result.errors.is_empty() {
            return Err(DslError::Parse(result.errors.join(", ")));
        }
        Ok(result.entities)
    }
}

impl HelperDef for ParseBlock {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let source = match param(h, 0).get("value").and_then(JsonValue::as_str) {
            Some(source) if !source.is_empty() => source,
            _ => return Ok(()),
        };

        let entities = match self.parse(source) {
            Ok(Some(entities)) => entities,
            Ok(None) => return Ok(()),
            Err(error) => {
                warn!(error = %error, source = %source, "Failed to parse source code");
                return Err(dsl_failure(error));
            }
        };

        let Some(template) = h.template() else {
            return Ok(());
        };

        let base_name = self.base_name(h, ctx);
        let mut rendered = Vec::new();
        for entity in reshape_entities(entities, &base_name) {
            rendered.push(render_to_string(template, entity, r, ctx, rc)?);
        }
        out.write(&rendered.join("\n"))?;
        Ok(())
    }
}

/// `{{#kaplang-has-reference entity "Type"}}`: data types referring to a type
struct HasReference {
    bindings: Arc<Bindings>,
}

impl HelperDef for HasReference {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let entity = param(h, 0);
        let type_name = value_text(param(h, 1));
        let is_data_type = entity_type_of(entity) == Some(entity_type::DATATYPE);

        if is_data_type && self.bindings.dsl.type_has_reference(entity, &type_name) {
            render_block(h.template(), r, ctx, rc, out)
        } else {
            render_block(h.inverse(), r, ctx, rc, out)
        }
    }
}

/// `{{#kaplang-render entity}}`: skips data types native to the target language
struct RenderEntity {
    bindings: Arc<Bindings>,
}

impl HelperDef for RenderEntity {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let entity = param(h, 0);
        let is_data = matches!(
            entity_type_of(entity),
            Some(entity_type::DATATYPE) | Some(entity_type::ENUM)
        );

        if is_data && self.bindings.dsl.is_native(entity) {
            debug!(name = %value_text(&entity["name"]), "Skipping native type");
            return render_block(h.inverse(), r, ctx, rc, out);
        }
        render_block(h.template(), r, ctx, rc, out)
    }
}

/// `{{#kaplang-reader-datatype}}`: block with the reader view of `this`
/// (or of the first parameter, when given)
struct ReadEntity {
    bindings: Arc<Bindings>,
    reader: EntityReader,
}

impl ReadEntity {
    fn target<'reg: 'rc, 'rc>(
        h: &Helper<'rc>,
        ctx: &'rc Context,
        rc: &RenderContext<'reg, 'rc>,
    ) -> Result<JsonValue, RenderError> {
        match h.param(0) {
            Some(entity) => Ok(entity.value().clone()),
            None => current_value(ctx, rc),
        }
    }
}

impl HelperDef for ReadEntity {
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
        let entity = Self::target(h, ctx, rc)?;
        let view = self
            .bindings
            .dsl
            .read(self.reader, &entity)
            .map_err(dsl_failure)?;
        render_with(template, view, r, ctx, rc, out)
    }
}

/// `Namespace` + `Name` unless they are the same word
pub(crate) fn controller_name(entity: &Map<String, JsonValue>) -> String {
    let name = entity.get("name").map(value_text).unwrap_or_default();
    match entity.get("namespace").map(value_text) {
        Some(namespace) if !namespace.is_empty() && !namespace.eq_ignore_ascii_case(&name) => {
            format!("{}{}", upper_first(&namespace), upper_first(&name))
        }
        _ => upper_first(&name),
    }
}

pub(crate) fn register(table: &mut HelperTable, bindings: &Arc<Bindings>) {
    for (name, options) in [
        (
            "kaplang-config",
            DslParseOptions::new(DslConfiguration::Config),
        ),
        (
            "kaplang-types",
            DslParseOptions::new(DslConfiguration::DataTypes),
        ),
        (
            "kaplang-methods",
            DslParseOptions::new(DslConfiguration::Methods).with_rest(false),
        ),
        (
            "kaplang-rest-methods",
            DslParseOptions::new(DslConfiguration::Methods).with_rest(true),
        ),
    ] {
        table.add(
            name,
            ParseBlock {
                bindings: Arc::clone(bindings),
                options,
            },
        );
    }

    table.add(
        "kaplang-has-reference",
        HasReference {
            bindings: Arc::clone(bindings),
        },
    );
    table.add(
        "kaplang-render",
        RenderEntity {
            bindings: Arc::clone(bindings),
        },
    );

    for (name, reader) in [
        ("kaplang-reader-rest-method", EntityReader::RestMethod),
        ("kaplang-reader-rest-controller", EntityReader::RestController),
        ("kaplang-reader-datatype", EntityReader::DataType),
        ("kaplang-reader-enum", EntityReader::Enum),
    ] {
        table.add(
            name,
            ReadEntity {
                bindings: Arc::clone(bindings),
                reader,
            },
        );
    }

    table.add(
        "controller-name",
        value(|p| match arg(p, 0) {
            JsonValue::Object(entity) => JsonValue::String(controller_name(entity)),
            _ => JsonValue::String(String::new()),
        }),
    );
}
