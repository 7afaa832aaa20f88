//! Kind-matching helpers over `context.spec.consumers` / `context.spec.providers`

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use serde_json::Value as JsonValue;

use super::support::{Bindings, HelperTable, param, render_block, render_to_string};
use crate::formatter::value_text;
use crate::kind::{KindQuery, KindUri};

/// Which resource list of the document context a helper reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resources {
    Consumers,
    Providers,
}

impl Resources {
    fn pointer(self) -> &'static str {
        match self {
            Resources::Consumers => "/spec/consumers",
            Resources::Providers => "/spec/providers",
        }
    }

    /// `None` when the context has no such collection
    pub(crate) fn of(self, context: &JsonValue) -> Option<&Vec<JsonValue>> {
        context.pointer(self.pointer()).and_then(JsonValue::as_array)
    }
}

/// `{{#consumes "kind"}}` / `{{#provides "kind"}}`: block when any resource matches
struct Uses {
    bindings: Arc<Bindings>,
    resources: Resources,
}

impl HelperDef for Uses {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let query = KindQuery::new(&value_text(param(h, 0)));
        let found = self
            .resources
            .of(&self.bindings.context)
            .is_some_and(|resources| resources.iter().any(|resource| query.matches_resource(resource)));

        if found {
            render_block(h.template(), r, ctx, rc, out)
        } else {
            render_block(h.inverse(), r, ctx, rc, out)
        }
    }
}

/// `{{#consumers-of-type "kind"}}`: block once per matching resource.
/// The `-joined` variants take the separator as second parameter.
struct OfType {
    bindings: Arc<Bindings>,
    resources: Resources,
    joined: bool,
}

impl HelperDef for OfType {
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
        let Some(resources) = self.resources.of(&self.bindings.context) else {
            return Ok(());
        };

        let query = KindQuery::new(&value_text(param(h, 0)));
        let separator = if self.joined {
            value_text(param(h, 1))
        } else {
            "\n".to_string()
        };

        let mut rendered = Vec::new();
        for resource in resources.iter().filter(|resource| query.matches_resource(resource)) {
            rendered.push(render_to_string(template, resource.clone(), r, ctx, rc)?);
        }

        out.write(&rendered.join(&separator))?;
        Ok(())
    }
}

/// `{{#usesAnyOf (toArray "a/b" "c/d")}}`: block when any consumer or provider
/// shares the full name of any listed kind
struct UsesAnyOf {
    bindings: Arc<Bindings>,
}

impl UsesAnyOf {
    fn uses(&self, kind: &str) -> bool {
        let Ok(wanted) = kind.parse::<KindUri>() else {
            return false;
        };
        let full_name = wanted.full_name();

        [Resources::Consumers, Resources::Providers]
            .into_iter()
            .filter_map(|resources| resources.of(&self.bindings.context))
            .flatten()
            .filter_map(|resource| resource.get("kind").and_then(JsonValue::as_str))
            .filter_map(|kind| kind.parse::<KindUri>().ok())
            .any(|candidate| candidate.full_name() == full_name)
    }
}

impl HelperDef for UsesAnyOf {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let kinds: Vec<String> = match param(h, 0) {
            JsonValue::Array(kinds) => kinds.iter().map(value_text).collect(),
            JsonValue::Null => Vec::new(),
            single => vec![value_text(single)],
        };

        if kinds.iter().any(|kind| self.uses(kind)) {
            render_block(h.template(), r, ctx, rc, out)
        } else {
            render_block(h.inverse(), r, ctx, rc, out)
        }
    }
}

pub(crate) fn register(table: &mut HelperTable, bindings: &Arc<Bindings>) {
    for (name, resources) in [
        ("consumes", Resources::Consumers),
        ("provides", Resources::Providers),
    ] {
        table.add(
            name,
            Uses {
                bindings: Arc::clone(bindings),
                resources,
            },
        );
    }

    for (name, resources, joined) in [
        ("consumers-of-type", Resources::Consumers, false),
        ("consumers-of-type-joined", Resources::Consumers, true),
        ("providers-of-type", Resources::Providers, false),
        ("providers-of-type-joined", Resources::Providers, true),
    ] {
        table.add(
            name,
            OfType {
                bindings: Arc::clone(bindings),
                resources,
                joined,
            },
        );
    }

    table.add(
        "usesAnyOf",
        UsesAnyOf {
            bindings: Arc::clone(bindings),
        },
    );
}
