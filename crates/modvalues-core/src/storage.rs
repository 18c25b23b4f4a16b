//! Loading of OpenAPI values schemas from disk
//!
//! A module keeps its schemas in `openapi/`:
//! - `config-values.yaml`: user-facing settings (stored as `config`)
//! - `values.yaml`: the full values schema (stored as `values`), usually
//!   pulling in `config-values.yaml` through `x-extend`

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::schema::{EXTEND_KEY, SchemaNode};

pub const OPENAPI_DIR: &str = "openapi";
pub const CONFIG_VALUES_FILE: &str = "config-values.yaml";
pub const VALUES_FILE: &str = "values.yaml";

/// Key of the values schema in a [`SchemaStorage`]
pub const VALUES_SCHEMA: &str = "values";
/// Key of the config values schema in a [`SchemaStorage`]
pub const CONFIG_SCHEMA: &str = "config";

/// Named schemas of one module (or of the global scope)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaStorage {
    pub schemas: BTreeMap<String, SchemaNode>,
}

impl SchemaStorage {
    /// Load the schemas under `dir/openapi`
    ///
    /// Returns `Ok(None)` when the directory holds neither schema file. When
    /// only `config-values.yaml` exists it also serves as the values schema.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let openapi = dir.as_ref().join(OPENAPI_DIR);
        let config_path = openapi.join(CONFIG_VALUES_FILE);
        let values_path = openapi.join(VALUES_FILE);

        let mut schemas = BTreeMap::new();

        if config_path.is_file() {
            schemas.insert(CONFIG_SCHEMA.to_string(), read_schema(&config_path)?);
        }

        if values_path.is_file() {
            let mut values = read_schema(&values_path)?;
            apply_extend(&mut values, &openapi)?;
            schemas.insert(VALUES_SCHEMA.to_string(), values);
        } else if let Some(config) = schemas.get(CONFIG_SCHEMA).cloned() {
            schemas.insert(VALUES_SCHEMA.to_string(), config);
        }

        if schemas.is_empty() {
            debug!(dir = %openapi.display(), "no openapi schemas found");
            return Ok(None);
        }

        Ok(Some(Self { schemas }))
    }

    /// Load a single schema file as the values schema
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut values = read_schema(path)?;
        if let Some(dir) = path.parent() {
            apply_extend(&mut values, dir)?;
        }

        let mut schemas = BTreeMap::new();
        schemas.insert(VALUES_SCHEMA.to_string(), values);
        Ok(Self { schemas })
    }

    /// Load from a directory containing `openapi/` or from a single file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::from_file(path).map(Some)
        }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    /// The schema stored under `values`
    pub fn values(&self) -> Option<&SchemaNode> {
        self.get(VALUES_SCHEMA)
    }
}

/// Parse a YAML or JSON schema file, by extension
fn read_schema(path: &Path) -> Result<SchemaNode> {
    let load_error = |message: String| CoreError::SchemaLoad {
        path: path.display().to_string(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let is_json = path.extension().map(|e| e == "json").unwrap_or(false);

    if is_json {
        serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))
    } else {
        serde_yaml::from_str(&content).map_err(|e| load_error(e.to_string()))
    }
}

/// Resolve `x-extend: {schema: <file>}` against sibling files in `dir`
///
/// Properties of the extended schema are added where `node` does not declare
/// them itself; its `type` is inherited when `node` has none.
fn apply_extend(node: &mut SchemaNode, dir: &Path) -> Result<()> {
    let Some(extend) = node.extensions.shift_remove(EXTEND_KEY) else {
        return Ok(());
    };

    let Some(file) = extend.get("schema").and_then(JsonValue::as_str) else {
        return Err(CoreError::SchemaLoad {
            path: dir.display().to_string(),
            message: format!("{} must name a schema file", EXTEND_KEY),
        });
    };

    let parent = read_schema(&dir.join(file))?;
    debug!(schema = file, properties = parent.properties.len(), "extending values schema");

    for (key, property) in parent.properties {
        node.properties.entry(key).or_insert(property);
    }
    if node.types.is_empty() {
        node.types = parent.types;
    }

    Ok(())
}
