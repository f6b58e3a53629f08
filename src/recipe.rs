//! Package-name extraction from templated `meta.yaml` recipes.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::Deserialize;

use crate::template::{Environment, TemplateError, os_namespace};

/// Location of the recipe inside a feedstock repository.
pub const META_YAML_PATH: &str = "recipe/meta.yaml";

/// Reasons a recipe did not yield a package name.
#[derive(Debug)]
pub enum ExtractionError {
    /// The file is not valid UTF-8.
    Decode(std::str::Utf8Error),
    /// The template could not be rendered.
    Template(TemplateError),
    /// The rendered text is not a YAML mapping.
    Yaml(serde_yaml::Error),
    /// A key on the `package.name` path is absent.
    MissingKey(&'static str),
    /// `package.name` is present but not a string.
    InvalidName(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Decode(e) => write!(f, "recipe is not valid UTF-8: {}", e),
            ExtractionError::Template(e) => write!(f, "failed to render recipe: {}", e),
            ExtractionError::Yaml(e) => write!(f, "failed to parse rendered recipe: {}", e),
            ExtractionError::MissingKey(key) => write!(f, "recipe has no '{}' key", key),
            ExtractionError::InvalidName(kind) => {
                write!(f, "package.name is a {}, expected a string", kind)
            }
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Decode(e) => Some(e),
            ExtractionError::Template(e) => Some(e),
            ExtractionError::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TemplateError> for ExtractionError {
    fn from(e: TemplateError) -> Self {
        ExtractionError::Template(e)
    }
}

/// Only the `package` section is read; everything else is ignored.
#[derive(Deserialize, Debug)]
struct RecipeDocument {
    package: Option<serde_yaml::Value>,
}

/// Builds the environment recipes are rendered in. The `os` namespace has an
/// empty `environ`, so lookups fall back to their defaults and extraction does
/// not depend on the host.
pub fn recipe_environment() -> Environment {
    Environment::new().with_global("os", os_namespace(BTreeMap::new()))
}

/// Extracts the lowercase `package.name` from raw `meta.yaml` bytes.
#[tracing::instrument(skip_all)]
pub fn extract_package_name(env: &Environment, meta: &[u8]) -> Result<String, ExtractionError> {
    let source = std::str::from_utf8(meta).map_err(ExtractionError::Decode)?;
    let rendered = env.render_str(source)?;
    debug!("Rendered recipe:\n{}", rendered);

    let document: RecipeDocument =
        serde_yaml::from_str(&rendered).map_err(ExtractionError::Yaml)?;
    let package = document
        .package
        .filter(|p| !p.is_null())
        .ok_or(ExtractionError::MissingKey("package"))?;
    let name = package
        .get("name")
        .filter(|n| !n.is_null())
        .ok_or(ExtractionError::MissingKey("package.name"))?;

    match name {
        serde_yaml::Value::String(name) => Ok(name.to_lowercase()),
        serde_yaml::Value::Bool(_) => Err(ExtractionError::InvalidName("boolean".into())),
        serde_yaml::Value::Number(_) => Err(ExtractionError::InvalidName("number".into())),
        serde_yaml::Value::Sequence(_) => Err(ExtractionError::InvalidName("sequence".into())),
        serde_yaml::Value::Mapping(_) => Err(ExtractionError::InvalidName("mapping".into())),
        _ => Err(ExtractionError::InvalidName("tagged value".into())),
    }
}
