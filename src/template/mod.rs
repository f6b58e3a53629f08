//! Tolerant rendering of Jinja recipes.
//!
//! Recipes reference build-time helpers (`compiler('c')`, `pin_compatible(...)`,
//! `environ[...]`) that do not exist when we only want to read a name. Before
//! rendering, every name the template reads but never binds is supplied as a
//! [`Placeholder`], which renders as the text of the expression built on it.

mod namespace;
mod placeholder;

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use minijinja::Value;

pub use minijinja::Error as TemplateError;
pub use namespace::os_namespace;
pub use placeholder::Placeholder;

/// Functions the engine defines itself; binding placeholders to these names
/// would shadow them.
const BUILTIN_FUNCTIONS: &[&str] = &["range", "dict", "namespace", "debug"];

const RECIPE_TEMPLATE: &str = "recipe";

/// Rendering environment shared by every recipe of a run.
#[derive(Debug, Clone)]
pub struct Environment {
    inner: minijinja::Environment<'static>,
    globals: BTreeSet<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        let mut inner = minijinja::Environment::new();
        inner.set_keep_trailing_newline(true);
        inner.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);
        inner.add_filter("default", default_filter);
        inner.add_filter("d", default_filter);
        inner.add_test("defined", is_defined);
        inner.add_test("undefined", is_undefined);
        Self {
            inner,
            globals: BTreeSet::new(),
        }
    }

    pub fn with_global(mut self, name: &str, value: Value) -> Self {
        self.inner.add_global(name.to_string(), value);
        self.globals.insert(name.to_string());
        self
    }

    /// Renders `source`, binding a [`Placeholder`] to each free name that is
    /// neither a global nor an engine builtin.
    #[tracing::instrument(skip_all)]
    pub fn render_str(&self, source: &str) -> Result<String, TemplateError> {
        // the shared environment only takes 'static sources
        let mut env = self.inner.clone();
        env.add_template_owned(RECIPE_TEMPLATE, source.to_string())?;
        let template = env.get_template(RECIPE_TEMPLATE)?;
        let context: BTreeMap<String, Value> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|name| {
                !self.globals.contains(name) && !BUILTIN_FUNCTIONS.contains(&name.as_str())
            })
            .map(|name| {
                let value = Placeholder::value(name.as_str());
                (name, value)
            })
            .collect();
        debug!("Unbound template names: {:?}", context.keys().collect::<Vec<_>>());

        let rendered = template.render(Value::from(context))?;
        debug!("Rendered template ({} -> {} bytes)", source.len(), rendered.len());
        Ok(rendered)
    }
}

fn is_missing(value: &Value) -> bool {
    value.is_undefined() || Placeholder::is_placeholder(value)
}

/// `default(value, default_value='', boolean=false)`, treating placeholders
/// as undefined.
fn default_filter(value: Value, other: Option<Value>, boolean: Option<bool>) -> Value {
    if is_missing(&value) || (boolean.unwrap_or(false) && !value.is_true()) {
        other.unwrap_or_else(|| Value::from(""))
    } else {
        value
    }
}

fn is_defined(value: Value) -> bool {
    !is_missing(&value)
}

fn is_undefined(value: Value) -> bool {
    is_missing(&value)
}
