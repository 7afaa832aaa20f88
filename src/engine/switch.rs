//! `switch` / `case` and `when` block helpers

use std::sync::{Arc, Mutex, MutexGuard};

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};

use super::support::{BufferOutput, HelperTable, hash, param, render_block};
use crate::formatter::value_text;

/// Values of the enclosing `switch` blocks, innermost last. One stack per
/// engine instance.
#[derive(Default)]
pub(crate) struct SwitchScope(Mutex<Vec<String>>);

impl SwitchScope {
    fn values(&self) -> MutexGuard<'_, Vec<String>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, value: String) {
        self.values().push(value);
    }

    fn pop(&self) {
        self.values().pop();
    }

    fn current_matches(&self, value: &str) -> bool {
        self.values().last().is_some_and(|current| current == value)
    }
}

struct Switch {
    scope: Arc<SwitchScope>,
}

impl HelperDef for Switch {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.scope.push(value_text(param(h, 0)));
        let result = render_block(h.template(), r, ctx, rc, out);
        self.scope.pop();
        result
    }
}

struct Case {
    scope: Arc<SwitchScope>,
}

impl HelperDef for Case {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        if self.scope.current_matches(&value_text(param(h, 0))) {
            render_block(h.template(), r, ctx, rc, out)
        } else {
            Ok(())
        }
    }
}

/// `{{#when value type="x"}}yes||no{{/when}}`: left side when the `type`
/// hash equals the parameter, right side (or nothing) otherwise
struct When;

impl HelperDef for When {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let mut buffer = BufferOutput::default();
        render_block(h.template(), r, ctx, rc, &mut buffer)?;
        let inner = buffer.into_string();

        let mut branches = inner.split("||");
        let when_true = branches.next().unwrap_or_default();
        let when_false = branches.next().unwrap_or_default();

        let selected = if hash(h, "type") == param(h, 0) {
            when_true
        } else {
            when_false
        };
        out.write(selected)?;
        Ok(())
    }
}

pub(crate) fn register(table: &mut HelperTable) {
    let scope = Arc::new(SwitchScope::default());
    table.add(
        "switch",
        Switch {
            scope: Arc::clone(&scope),
        },
    );
    table.add("case", Case { scope });
    table.add("when", When);
}
