//! Shared plumbing for helper implementations

use std::sync::Arc;

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, JsonTruthy, Output,
    RenderContext, RenderError, RenderErrorReason, Renderable, ScopedJson, Template,
};
use serde_json::Value as JsonValue;

use crate::dsl::{DslError, DslParser};
use crate::formatter::CodeFormatter;
use crate::type_refs::DtoCatalog;

static NULL_VALUE: JsonValue = JsonValue::Null;

/// Everything a helper may read, bound once per engine instance
pub(crate) struct Bindings {
    pub context: JsonValue,
    pub catalog: DtoCatalog,
    pub formatter: Arc<dyn CodeFormatter>,
    pub dsl: Arc<dyn DslParser>,
}

pub(crate) type BoxedHelper = Box<dyn HelperDef + Send + Sync + 'static>;

/// Ordered name -> handler table installed into a fresh registry
#[derive(Default)]
pub(crate) struct HelperTable {
    entries: Vec<(&'static str, BoxedHelper)>,
}

impl HelperTable {
    pub fn add<H>(&mut self, name: &'static str, helper: H)
    where
        H: HelperDef + Send + Sync + 'static,
    {
        debug_assert!(
            self.entries.iter().all(|(existing, _)| *existing != name),
            "helper {name} registered twice"
        );
        self.entries.push((name, Box::new(helper)));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    pub fn install(self, registry: &mut Handlebars<'static>) {
        for (name, helper) in self.entries {
            registry.register_helper(name, helper);
        }
    }
}

/// Output sink collecting into a string
#[derive(Default)]
pub(crate) struct BufferOutput(String);

impl BufferOutput {
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Output for BufferOutput {
    fn write(&mut self, seg: &str) -> Result<(), std::io::Error> {
        self.0.push_str(seg);
        Ok(())
    }
}

/// Positional parameter values; missing ones read as null
pub(crate) fn params<'a>(h: &'a Helper<'_>) -> Vec<&'a JsonValue> {
    h.params().iter().map(|param| param.value()).collect()
}

pub(crate) fn arg<'a>(params: &[&'a JsonValue], index: usize) -> &'a JsonValue {
    params.get(index).copied().unwrap_or(&NULL_VALUE)
}

pub(crate) fn param<'a>(h: &'a Helper<'_>, index: usize) -> &'a JsonValue {
    h.param(index).map(|param| param.value()).unwrap_or(&NULL_VALUE)
}

pub(crate) fn hash<'a>(h: &'a Helper<'_>, key: &str) -> &'a JsonValue {
    h.hash_get(key).map(|value| value.value()).unwrap_or(&NULL_VALUE)
}

pub(crate) fn truthy(value: &JsonValue) -> bool {
    value.is_truthy(false)
}

pub(crate) fn dsl_failure(error: DslError) -> RenderError {
    RenderErrorReason::Other(error.to_string()).into()
}

/// Render the block against the current `this`
pub(crate) fn render_block<'reg: 'rc, 'rc>(
    template: Option<&'rc Template>,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    match template {
        Some(template) => template.render(r, ctx, rc, out),
        None => Ok(()),
    }
}

/// Render the block with `value` as the new `this`
pub(crate) fn render_with<'reg: 'rc, 'rc>(
    template: &'rc Template,
    value: JsonValue,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let mut block = BlockContext::new();
    block.set_base_value(value);
    rc.push_block(block);
    let result = template.render(r, ctx, rc, out);
    rc.pop_block();
    result
}

/// Render the block with `value` as `this` and capture the text
pub(crate) fn render_to_string<'reg: 'rc, 'rc>(
    template: &'rc Template,
    value: JsonValue,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
) -> Result<String, RenderError> {
    let mut buffer = BufferOutput::default();
    render_with(template, value, r, ctx, rc, &mut buffer)?;
    Ok(buffer.into_string())
}

/// The current `this` value
pub(crate) fn current_value<'reg: 'rc, 'rc>(
    ctx: &'rc Context,
    rc: &RenderContext<'reg, 'rc>,
) -> Result<JsonValue, RenderError> {
    Ok(rc.evaluate(ctx, "this")?.as_json().clone())
}

/// Helper writing unescaped markup computed from its parameters
pub(crate) struct MarkupHelper<F>(F);

pub(crate) fn markup<F>(f: F) -> MarkupHelper<F>
where
    F: Fn(&[&JsonValue]) -> String + Send + Sync,
{
    MarkupHelper(f)
}

impl<F> HelperDef for MarkupHelper<F>
where
    F: Fn(&[&JsonValue]) -> String + Send + Sync,
{
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let text = (self.0)(&params(h));
        out.write(&text)?;
        Ok(())
    }
}

/// Helper producing a JSON value; escaped when printed, usable as a subexpression
pub(crate) struct ValueHelper<F>(F);

pub(crate) fn value<F>(f: F) -> ValueHelper<F>
where
    F: Fn(&[&JsonValue]) -> JsonValue + Send + Sync,
{
    ValueHelper(f)
}

impl<F> HelperDef for ValueHelper<F>
where
    F: Fn(&[&JsonValue]) -> JsonValue + Send + Sync,
{
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        Ok(ScopedJson::Derived((self.0)(&params(h))))
    }
}
