use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr};
use minijinja::{Error, State, Value};

use super::placeholder::{Placeholder, accessor};

/// A read-only mapping with a dotted path, like `os.environ`. Missing keys
/// resolve to a [`Placeholder`] below that path, and the dict methods
/// recipes call (`get`, `keys`, `values`, `items`) are supported.
#[derive(Debug)]
pub struct Namespace {
    path: String,
    entries: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new(path: impl Into<String>, entries: BTreeMap<String, Value>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    fn lookup(&self, key: &Value) -> Option<Value> {
        key.as_str().and_then(|k| self.entries.get(k)).cloned()
    }

    fn keys(&self) -> Vec<Value> {
        self.entries.keys().map(|k| Value::from(k.as_str())).collect()
    }
}

impl Object for Namespace {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.lookup(key)
            .or_else(|| Some(Placeholder::value(format!("{}{}", self.path, accessor(key)))))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.keys())
    }

    fn call_method(
        self: &Arc<Self>,
        state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        Ok(match method {
            "get" => args
                .first()
                .and_then(|key| self.lookup(key))
                .or_else(|| args.get(1).cloned())
                .unwrap_or(Value::from(())),
            "keys" => Value::from(self.keys()),
            "values" => Value::from(self.entries.values().cloned().collect::<Vec<_>>()),
            "items" => Value::from(
                self.entries
                    .iter()
                    .map(|(k, v)| Value::from(vec![Value::from(k.as_str()), v.clone()]))
                    .collect::<Vec<_>>(),
            ),
            _ => {
                let target = Placeholder::value(format!("{}.{}", self.path, method));
                target.call(state, args)?
            }
        })
    }
}

/// Builds the `os` global: `os.environ` holding `environ`, plus `os.sep`,
/// `os.pathsep` and `os.name` for a POSIX host. Anything else below `os`
/// (`os.path.join(...)`) renders as a placeholder.
pub fn os_namespace(environ: BTreeMap<String, String>) -> Value {
    let environ = environ
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect();

    Value::from_object(Namespace::new(
        "os",
        BTreeMap::from([
            (
                "environ".to_string(),
                Value::from_object(Namespace::new("os.environ", environ)),
            ),
            ("sep".to_string(), Value::from("/")),
            ("pathsep".to_string(), Value::from(":")),
            ("name".to_string(), Value::from("posix")),
        ]),
    ))
}
