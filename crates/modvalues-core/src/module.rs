//! Module identity and the module-level values entry point

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::context::RenderContext;
use crate::digests::{DigestSource, apply_digests};
use crate::error::{CoreError, Result};
use crate::generator::{GeneratorConfig, ValuesGenerator};
use crate::schema::SchemaNode;
use crate::storage::SchemaStorage;
use crate::values::Values;

pub const CHART_FILE: &str = "Chart.yaml";
pub const MODULE_FILE: &str = "module.yaml";
pub const NAMESPACE_FILE: &str = ".namespace";

/// Key of the global schema in the combined root schema
pub const GLOBAL_KEY: &str = "global";

/// Chart metadata, read from `Chart.yaml` and exposed to templates as `.Chart`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"))]
pub struct ChartMetadata {
    #[serde(
        default,
        rename(serialize = "APIVersion", deserialize = "apiVersion"),
        skip_serializing_if = "Option::is_none"
    )]
    pub api_version: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// The parts of `module.yaml` used for identity
#[derive(Debug, Default, Deserialize)]
struct ModuleDefinition {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    namespace: Option<String>,
}

/// A module: identity plus where it lives
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub namespace: String,
    pub path: PathBuf,
    pub chart: ChartMetadata,
}

impl Module {
    /// Discover a module from its directory
    ///
    /// The name comes from `module.yaml`, then `Chart.yaml`, then the
    /// directory name without its numeric ordering prefix (`040-`). The
    /// namespace comes from `.namespace`, then `module.yaml`, and defaults to
    /// `d8-<name>`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref();
        if !path.is_dir() {
            return Err(CoreError::InvalidModule {
                message: format!("{} is not a directory", path.display()),
            });
        }

        let mut chart: ChartMetadata = read_yaml(&path.join(CHART_FILE))?.unwrap_or_default();
        let definition: ModuleDefinition = read_yaml(&path.join(MODULE_FILE))?.unwrap_or_default();

        let name = non_empty(definition.name)
            .or_else(|| non_empty(Some(chart.name.clone())))
            .or_else(|| dir_module_name(path))
            .ok_or_else(|| CoreError::InvalidModule {
                message: format!("cannot determine module name for {}", path.display()),
            })?;

        let namespace_file = path.join(NAMESPACE_FILE);
        let namespace_override = if namespace_file.is_file() {
            non_empty(Some(std::fs::read_to_string(&namespace_file)?))
        } else {
            None
        };
        let namespace = namespace_override
            .or_else(|| non_empty(definition.namespace))
            .unwrap_or_else(|| format!("d8-{}", name));

        if chart.name.is_empty() {
            chart.name = name.clone();
        }

        debug!(module = %name, namespace = %namespace, path = %path.display(), "discovered module");

        Ok(Self {
            name,
            namespace,
            path: path.to_path_buf(),
            chart,
        })
    }

    /// Key of this module's values in the combined tree (`cert-manager` -> `certManager`)
    pub fn values_key(&self) -> String {
        to_lower_camel(&self.name)
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_yaml::from_str(&content)?))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Numeric ordering prefix of a module directory (`040-`)
static ORDER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-").expect("valid regex"));

fn dir_module_name(path: &Path) -> Option<String> {
    let dir_name = path.file_name()?.to_str()?;
    non_empty(Some(ORDER_PREFIX.replace(dir_name, "").into_owned()))
}

/// Convert a module name to lowerCamelCase
///
/// Words are split on `-`, `_`, `.` and whitespace. The first word gets a
/// lowercase initial, every following word an uppercase one; the rest of
/// each word is kept as is.
pub fn to_lower_camel(name: &str) -> String {
    let mut result = String::with_capacity(name.len());

    let words = name
        .split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty());

    for (i, word) in words.enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                result.extend(first.to_lowercase());
            } else {
                result.extend(first.to_uppercase());
            }
            result.push_str(chars.as_str());
        }
    }

    result
}

/// Generates a module's values and render context from its schemas
#[derive(Debug, Clone)]
pub struct ValuesComposer<'a> {
    module: &'a Module,
    module_schemas: Option<&'a SchemaStorage>,
    global_schemas: Option<&'a SchemaStorage>,
    config: GeneratorConfig,
}

impl<'a> ValuesComposer<'a> {
    /// `module_schemas` is `None` for a module without OpenAPI schemas
    pub fn new(module: &'a Module, module_schemas: Option<&'a SchemaStorage>) -> Self {
        Self {
            module,
            module_schemas,
            global_schemas: None,
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_global(mut self, global_schemas: &'a SchemaStorage) -> Self {
        self.global_schemas = Some(global_schemas);
        self
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The root schema combining the module and global values schemas
    ///
    /// Returns `Ok(None)` when the module has no schemas at all.
    pub fn combined_schema(&self) -> Result<Option<SchemaNode>> {
        let Some(storage) = self.module_schemas else {
            return Ok(None);
        };

        let module_schema = storage
            .values()
            .ok_or_else(|| CoreError::MissingValuesSchema {
                module: self.module.name.clone(),
            })?;

        let global_schema = match self.global_schemas {
            Some(global) => Some(global.values().ok_or_else(|| {
                CoreError::MissingValuesSchema {
                    module: GLOBAL_KEY.to_string(),
                }
            })?),
            None => None,
        };

        let mut combined = SchemaNode::default();
        combined
            .properties
            .insert(self.module.values_key(), with_empty_default(Some(module_schema)));
        combined
            .properties
            .insert(GLOBAL_KEY.to_string(), with_empty_default(global_schema));

        Ok(Some(combined))
    }

    /// Generate the module's values
    ///
    /// Returns `Ok(None)` when the module has no schemas at all.
    pub fn compose_values(&self) -> Result<Option<Values>> {
        let Some(combined) = self.combined_schema()? else {
            debug!(module = %self.module.name, "module has no openapi schemas");
            return Ok(None);
        };

        ValuesGenerator::new(&combined)
            .with_config(self.config)
            .generate()
            .map(Some)
            .map_err(|e| CoreError::generate(&self.module.name, e))
    }

    /// Generate values, overlay `digests` and wrap them for the template engine
    ///
    /// Digests are only loaded once values have been generated, so a module
    /// without schemas never touches its digest file.
    pub fn render_context(
        &self,
        digests: impl Into<DigestSource>,
    ) -> Result<Option<RenderContext>> {
        let Some(mut values) = self.compose_values()? else {
            return Ok(None);
        };

        apply_digests(&mut values, digests.into().load()?);
        Ok(Some(RenderContext::assemble(self.module, values)))
    }
}

/// Copy of `schema` (or an empty schema) whose default is an empty mapping
fn with_empty_default(schema: Option<&SchemaNode>) -> SchemaNode {
    let mut schema = schema.cloned().unwrap_or_default();
    schema.default = Some(JsonValue::Object(Map::new()));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digests::{DIGESTS_PATH, default_digests};
    use crate::storage::{CONFIG_SCHEMA, VALUES_SCHEMA};
    use insta::assert_snapshot;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn storage(name: &str, schema: JsonValue) -> SchemaStorage {
        let mut storage = SchemaStorage::default();
        storage
            .schemas
            .insert(name.to_string(), SchemaNode::from_value(schema).unwrap());
        storage
    }

    fn module(name: &str) -> Module {
        Module {
            name: name.to_string(),
            namespace: format!("d8-{}", name),
            path: PathBuf::from(name),
            chart: ChartMetadata {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_to_lower_camel() {
        assert_eq!(to_lower_camel("cert-manager"), "certManager");
        assert_eq!(to_lower_camel("node-local-dns"), "nodeLocalDns");
        assert_eq!(to_lower_camel("user_authn"), "userAuthn");
        assert_eq!(to_lower_camel("prometheus"), "prometheus");
        assert_eq!(to_lower_camel("Upmeter"), "upmeter");
        assert_eq!(to_lower_camel("cni-cilium"), "cniCilium");
        assert_eq!(to_lower_camel("--a--b--"), "aB");
        assert_eq!(to_lower_camel(""), "");
    }

    #[test]
    fn test_compose_values() {
        let module = module("cert-manager");
        let module_schemas = storage(
            VALUES_SCHEMA,
            json!({
                "type": "object",
                "properties": {
                    "logLevel": {"type": "string", "enum": ["Info", "Debug"]},
                    "internal": {"type": "object", "properties": {"ca": {"type": "string"}}}
                }
            }),
        );
        let global_schemas = storage(
            VALUES_SCHEMA,
            json!({
                "type": "object",
                "properties": {
                    "clusterConfiguration": {"type": "object", "properties": {"clusterDomain": {"default": "cluster.local"}}}
                }
            }),
        );

        let values = ValuesComposer::new(&module, Some(&module_schemas))
            .with_global(&global_schemas)
            .compose_values()
            .unwrap()
            .unwrap();

        assert_eq!(
            values.into_inner(),
            json!({
                "certManager": {"logLevel": "Info", "internal": {}},
                "global": {"clusterConfiguration": {"clusterDomain": "cluster.local"}}
            })
        );
    }

    #[test]
    fn test_untyped_schemas_fall_back_to_empty_mapping() {
        let module = module("upmeter");
        let module_schemas = storage(VALUES_SCHEMA, json!({"properties": {"a": {"default": 1}}}));

        let values = ValuesComposer::new(&module, Some(&module_schemas))
            .compose_values()
            .unwrap()
            .unwrap();

        assert_eq!(values.into_inner(), json!({"upmeter": {}, "global": {}}));
    }

    #[test]
    fn test_input_schemas_untouched() {
        let module = module("upmeter");
        let module_schemas = storage(VALUES_SCHEMA, json!({"type": "object"}));
        let before = module_schemas.clone();

        ValuesComposer::new(&module, Some(&module_schemas))
            .compose_values()
            .unwrap();

        assert_eq!(module_schemas, before);
        assert!(module_schemas.values().unwrap().default.is_none());
    }

    #[test]
    fn test_no_schemas_no_values() {
        let module = module("upmeter");
        assert!(ValuesComposer::new(&module, None).compose_values().unwrap().is_none());
        assert!(
            ValuesComposer::new(&module, None)
                .render_context(default_digests())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_missing_values_schema() {
        let module = module("upmeter");
        let module_schemas = storage(CONFIG_SCHEMA, json!({"type": "object"}));

        let err = ValuesComposer::new(&module, Some(&module_schemas))
            .compose_values()
            .unwrap_err();

        assert_snapshot!(err.to_string(), @"cannot find openapi values schema for module upmeter");
    }

    #[test]
    fn test_global_without_values_schema() {
        let module = module("upmeter");
        let module_schemas = storage(VALUES_SCHEMA, json!({"type": "object"}));
        let global_schemas = SchemaStorage::default();

        let err = ValuesComposer::new(&module, Some(&module_schemas))
            .with_global(&global_schemas)
            .compose_values()
            .unwrap_err();

        assert_snapshot!(err.to_string(), @"cannot find openapi values schema for module global");
    }

    #[test]
    fn test_generation_error_wrapped() {
        let module = module("upmeter");
        let module_schemas = storage(
            VALUES_SCHEMA,
            json!({"type": "object", "properties": {"smokeMini": {"type": "object", "x-examples": ["bad"]}}}),
        );

        let err = ValuesComposer::new(&module, Some(&module_schemas))
            .compose_values()
            .unwrap_err();

        assert!(matches!(err, CoreError::Generate { .. }));
        assert_snapshot!(err.to_string(), @"generate values: module upmeter: property upmeter.smokeMini: x-examples value must be a mapping for an object schema");
    }

    #[test]
    fn test_render_context_default_digests() {
        let module = module("upmeter");
        let module_schemas = storage(VALUES_SCHEMA, json!({"type": "object"}));

        let ctx = ValuesComposer::new(&module, Some(&module_schemas))
            .render_context(default_digests())
            .unwrap()
            .unwrap();

        assert_eq!(
            ctx.values.get(DIGESTS_PATH).unwrap(),
            &JsonValue::Object(default_digests())
        );
        assert_eq!(ctx.release.name, "upmeter");
        assert_eq!(ctx.release.namespace, "d8-upmeter");
    }

    #[test]
    fn test_render_context_supplied_digests_replace_default() {
        let module = module("upmeter");
        let module_schemas = storage(VALUES_SCHEMA, json!({"type": "object"}));
        let digests = json!({"img": "sha256:abc"}).as_object().unwrap().clone();

        let ctx = ValuesComposer::new(&module, Some(&module_schemas))
            .render_context(digests)
            .unwrap()
            .unwrap();

        assert_eq!(ctx.values.get(DIGESTS_PATH), Some(&json!({"img": "sha256:abc"})));
    }

    #[test]
    fn test_digests_not_loaded_without_schemas() {
        let root = TempDir::new().unwrap();
        let broken = root.path().join("images_digests.json");
        fs::write(&broken, "{broken").unwrap();
        let module = module("upmeter");

        let ctx = ValuesComposer::new(&module, None)
            .render_context(DigestSource::File(broken))
            .unwrap();

        assert!(ctx.is_none());
    }

    #[test]
    fn test_generation_error_reported_before_digests() {
        let root = TempDir::new().unwrap();
        let broken = root.path().join("images_digests.json");
        fs::write(&broken, "{broken").unwrap();
        let module = module("upmeter");
        let module_schemas = storage(
            VALUES_SCHEMA,
            json!({"type": "object", "properties": {"smokeMini": {"type": "object", "x-examples": ["bad"]}}}),
        );

        let err = ValuesComposer::new(&module, Some(&module_schemas))
            .render_context(DigestSource::File(broken))
            .unwrap_err();

        assert!(matches!(err, CoreError::Generate { .. }));
    }

    #[test]
    fn test_module_from_dir_defaults() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("040-node-manager");
        fs::create_dir(&dir).unwrap();

        let module = Module::from_dir(&dir).unwrap();

        assert_eq!(module.name, "node-manager");
        assert_eq!(module.namespace, "d8-node-manager");
        assert_eq!(module.chart.name, "node-manager");
        assert_eq!(module.values_key(), "nodeManager");
    }

    #[test]
    fn test_module_from_dir_files() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("030-cloud-provider-aws");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join(CHART_FILE),
            "apiVersion: v2\nname: cloud-provider-aws\nversion: 0.1.0\nkeywords: [aws]\n",
        )
        .unwrap();
        fs::write(dir.join(NAMESPACE_FILE), "d8-cloud-provider-aws\n").unwrap();

        let module = Module::from_dir(&dir).unwrap();

        assert_eq!(module.name, "cloud-provider-aws");
        assert_eq!(module.namespace, "d8-cloud-provider-aws");
        assert_eq!(module.chart.api_version.as_deref(), Some("v2"));
        assert_eq!(module.chart.version.as_deref(), Some("0.1.0"));
        assert_eq!(module.chart.keywords, vec!["aws"]);
    }

    #[test]
    fn test_module_yaml_name_wins() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("some-dir");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(CHART_FILE), "name: chart-name\n").unwrap();
        fs::write(dir.join(MODULE_FILE), "name: module-name\nnamespace: custom\n").unwrap();

        let module = Module::from_dir(&dir).unwrap();

        assert_eq!(module.name, "module-name");
        assert_eq!(module.namespace, "custom");
        assert_eq!(module.chart.name, "chart-name");
    }

    #[test]
    fn test_module_from_missing_dir() {
        let root = TempDir::new().unwrap();
        let err = Module::from_dir(root.path().join("nope")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidModule { .. }));
    }
}
