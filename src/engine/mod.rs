//! Template engine bound to one generation call.
//!
//! A [`TemplateEngine`] owns a fresh handlebars registry with the full helper
//! surface installed. Helpers close over the document context, the DTO catalog,
//! the target's [`CodeFormatter`] and its [`DslParser`]; nothing is shared with
//! other engine instances, so concurrent generation calls cannot observe each
//! other's partials or switch state.
//!
//! Helper groups:
//! - `casing`: string and value utilities (`lowercase`, `kebabCase`, `toJSON`, ...)
//! - `kinds`: kind matching over `context.spec.consumers` / `providers`
//! - `formatting`: [`CodeFormatter`] delegations and `eachProperty` / `arguments` / `methods`
//! - `references`: `eachTypeReference`, `hasTypeReference`, `ifValueType`
//! - `switch`: `switch` / `case` and `when`
//! - `kaplang`: DSL bridging helpers

mod casing;
mod formatting;
mod kaplang;
mod kinds;
mod references;
mod support;
mod switch;

use std::path::Path;
use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::dsl::DslParser;
use crate::error::{Error, Result};
use crate::formatter::CodeFormatter;
use crate::type_refs::DtoCatalog;
use support::{Bindings, HelperTable};

/// Isolated helper registry for one `generate` call
pub struct TemplateEngine {
    registry: Handlebars<'static>,
    helpers: Vec<&'static str>,
}

impl TemplateEngine {
    /// Build an engine for `data` rendered within `context`.
    ///
    /// Fails when either value is absent (`null`).
    pub fn create(
        data: &JsonValue,
        context: &JsonValue,
        formatter: Arc<dyn CodeFormatter>,
        dsl: Arc<dyn DslParser>,
    ) -> Result<Self> {
        if data.is_null() {
            return Err(Error::config("Missing data"));
        }
        if context.is_null() {
            return Err(Error::config("Missing context"));
        }

        let bindings = Arc::new(Bindings {
            catalog: DtoCatalog::from_context(context),
            context: context.clone(),
            formatter,
            dsl,
        });

        let mut table = HelperTable::default();
        casing::register(&mut table);
        kinds::register(&mut table, &bindings);
        formatting::register(&mut table, &bindings);
        references::register(&mut table, &bindings);
        switch::register(&mut table);
        kaplang::register(&mut table, &bindings);

        let helpers = table.names();
        let mut registry = Handlebars::new();
        table.install(&mut registry);

        debug!(
            helpers = helpers.len(),
            dtos = !bindings.catalog.is_empty(),
            "Created template engine"
        );

        Ok(Self { registry, helpers })
    }

    /// Names of all installed helpers, in registration order
    pub fn helper_names(&self) -> &[&'static str] {
        &self.helpers
    }

    /// Make `source` available to every template as `{{> name}}`
    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<()> {
        self.registry
            .register_partial(name, source)
            .map_err(|e| Error::render(name, e.to_string()))
    }

    /// Render a template source against `scope`; failures carry `path`
    pub fn render<T: Serialize>(&self, path: &Path, source: &str, scope: &T) -> Result<String> {
        self.registry
            .render_template(source, scope)
            .map_err(|e| Error::render(path, e.to_string()))
    }
}
