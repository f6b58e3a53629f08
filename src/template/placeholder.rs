use std::fmt;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr};
use minijinja::value::ValueKind;
use minijinja::{Error, State, Value};

/// Stands in for a name the recipe uses but the context never binds.
///
/// Every attribute, item, call or method on a placeholder yields another
/// placeholder carrying the longer path, and rendering prints that path, so
/// `{{ compiler('c') }}` renders as `compiler('c')`. It is falsy and iterates
/// as an empty sequence, which keeps `{% if %}`, `{% for %}` and slicing on
/// unbound names from failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    path: String,
}

impl Placeholder {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Wraps a new placeholder into a template value.
    pub fn value(path: impl Into<String>) -> Value {
        Value::from_object(Self::new(path))
    }

    pub fn is_placeholder(value: &Value) -> bool {
        value.downcast_object_ref::<Placeholder>().is_some()
    }
}

impl Object for Placeholder {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Seq
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        Some(Placeholder::value(format!("{}{}", self.path, accessor(key))))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Empty
    }

    fn is_true(self: &Arc<Self>) -> bool {
        false
    }

    fn call(self: &Arc<Self>, _state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        Ok(Placeholder::value(format!("{}({})", self.path, call_args(args))))
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        Ok(Placeholder::value(format!(
            "{}.{}({})",
            self.path,
            method,
            call_args(args)
        )))
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Path suffix for looking `key` up on a placeholder: `.name` for identifier
/// keys, `["some key"]` for other strings and `[0]` for anything else.
///
/// The engine hands attribute and item lookups to objects the same way, so
/// `environ["PREFIX"]` and `environ.PREFIX` both extend to `environ.PREFIX`.
pub(crate) fn accessor(key: &Value) -> String {
    match key.as_str() {
        Some(name) if is_identifier(name) => format!(".{}", name),
        Some(name) => format!("[\"{}\"]", name),
        None => format!("[{}]", python_repr(key)),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Arguments as they would be written in the recipe: `'numpy', max_pin='x.x'`.
fn call_args(args: &[Value]) -> String {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        if arg.is_kwargs() {
            if let Ok(keys) = arg.try_iter() {
                for key in keys {
                    let value = arg.get_item(&key).unwrap_or(Value::UNDEFINED);
                    parts.push(format!("{}={}", key, python_repr(&value)));
                }
            }
        } else {
            parts.push(python_repr(arg));
        }
    }
    parts.join(", ")
}

/// Python-style literal for a template value.
pub(crate) fn python_repr(value: &Value) -> String {
    if Placeholder::is_placeholder(value) {
        return value.to_string();
    }
    match value.kind() {
        ValueKind::None | ValueKind::Undefined => "None".to_string(),
        ValueKind::Bool if value.is_true() => "True".to_string(),
        ValueKind::Bool => "False".to_string(),
        ValueKind::String => format!("'{}'", value.as_str().unwrap_or_default()),
        ValueKind::Seq => {
            let items: Vec<String> = value
                .try_iter()
                .map(|iter| iter.map(|item| python_repr(&item)).collect())
                .unwrap_or_default();
            format!("[{}]", items.join(", "))
        }
        ValueKind::Map => {
            let items: Vec<String> = value
                .try_iter()
                .map(|keys| {
                    keys.map(|key| {
                        let item = value.get_item(&key).unwrap_or(Value::UNDEFINED);
                        format!("{}: {}", python_repr(&key), python_repr(&item))
                    })
                    .collect()
                })
                .unwrap_or_default();
            format!("{{{}}}", items.join(", "))
        }
        _ => value.to_string(),
    }
}
