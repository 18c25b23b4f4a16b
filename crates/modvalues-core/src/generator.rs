//! Values synthesis from OpenAPI schemas
//!
//! [`ValuesGenerator`] walks the properties of a root schema and asks
//! [`PropertyResolver`] for one representative value per property. The
//! resolver picks its value source by a fixed precedence over whichever
//! keywords a node carries:
//!
//! 1. `x-examples` (first example, or the mapping itself)
//! 2. `enum` (the `default` if set, else the first member)
//! 3. `type: object` (recurse into `properties`)
//! 4. `default`
//! 5. `type: array` with `items` (the item default, or the item properties)
//! 6. `oneOf` (branches merged, then resolved as an object)
//! 7. `anyOf` (same as `oneOf`)
//!
//! A property matching none of these, including one that only has `allOf`,
//! produces no value and is left out of its parent mapping.

use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::merge::merge_schemas;
use crate::schema::{EXAMPLES_KEY, SchemaNode};
use crate::values::Values;

/// Default limit on schema nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Generation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Deepest property nesting accepted before giving up
    pub max_depth: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The keyword a property's value is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Examples,
    Enum,
    Object,
    Default,
    Array,
    OneOf,
    AnyOf,
}

impl ValueSource {
    /// Pick the value source for `prop`, first match wins
    pub fn select(prop: &SchemaNode) -> Option<Self> {
        if examples(prop).is_some() {
            Some(Self::Examples)
        } else if !prop.enum_values.is_empty() {
            Some(Self::Enum)
        } else if prop.is_object() {
            Some(Self::Object)
        } else if prop.default.is_some() {
            Some(Self::Default)
        } else if prop.is_array() && prop.items.is_some() {
            Some(Self::Array)
        } else if !prop.one_of.is_empty() {
            Some(Self::OneOf)
        } else if !prop.any_of.is_empty() {
            Some(Self::AnyOf)
        } else {
            None
        }
    }
}

fn examples(prop: &SchemaNode) -> Option<&JsonValue> {
    prop.extension(EXAMPLES_KEY).filter(|v| !v.is_null())
}

/// Generates a full value tree for a root schema
#[derive(Debug, Clone)]
pub struct ValuesGenerator<'a> {
    root: &'a SchemaNode,
    config: GeneratorConfig,
}

impl<'a> ValuesGenerator<'a> {
    pub fn new(root: &'a SchemaNode) -> Self {
        Self {
            root,
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve every property of the root schema
    ///
    /// Properties that produce no value are omitted, so a schema without
    /// properties yields empty values.
    pub fn generate(&self) -> Result<Values> {
        let resolver = PropertyResolver::new(self.config);
        resolver.properties(self.root, "", 0).map(Values::from)
    }
}

/// Resolves a single schema property into a value
#[derive(Debug, Clone, Default)]
pub struct PropertyResolver {
    config: GeneratorConfig,
}

impl PropertyResolver {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Resolve property `key` described by `prop`
    ///
    /// `Ok(None)` means the property produces no value.
    pub fn resolve(&self, key: &str, prop: &SchemaNode) -> Result<Option<JsonValue>> {
        self.resolve_at(key, prop, 1)
    }

    fn resolve_at(&self, path: &str, prop: &SchemaNode, depth: usize) -> Result<Option<JsonValue>> {
        if depth > self.config.max_depth {
            return Err(CoreError::DepthExceeded {
                path: path.to_string(),
                limit: self.config.max_depth,
            });
        }

        let Some(source) = ValueSource::select(prop) else {
            trace!(path, "no value source, skipping");
            return Ok(None);
        };
        trace!(path, ?source, "resolving property");

        match source {
            ValueSource::Examples => self.resolve_examples(path, prop, depth),
            ValueSource::Enum => Ok(prop
                .default
                .clone()
                .or_else(|| prop.enum_values.first().cloned())),
            ValueSource::Object => self.object(prop, path, depth).map(Some),
            ValueSource::Default => Ok(prop.default.clone()),
            ValueSource::Array => self.resolve_array(path, prop, depth),
            ValueSource::OneOf => {
                let merged = merge_schemas(prop, &prop.one_of);
                self.object(&merged, path, depth).map(Some)
            }
            ValueSource::AnyOf => {
                let merged = merge_schemas(prop, &prop.any_of);
                self.object(&merged, path, depth).map(Some)
            }
        }
    }

    fn resolve_examples(
        &self,
        path: &str,
        prop: &SchemaNode,
        depth: usize,
    ) -> Result<Option<JsonValue>> {
        let candidate = match examples(prop) {
            Some(JsonValue::Array(items)) => items.first(),
            Some(example @ JsonValue::Object(_)) => Some(example),
            _ => None,
        };
        let Some(candidate) = candidate.filter(|c| !c.is_null()) else {
            trace!(path, "x-examples holds no usable example");
            return Ok(None);
        };

        if !prop.is_object() {
            return Ok(Some(candidate.clone()));
        }

        let JsonValue::Object(example) = candidate else {
            return Err(CoreError::ExampleShape {
                path: path.to_string(),
            });
        };

        let mut values = Values::from(self.properties(prop, path, depth)?);
        values.overlay(example);
        Ok(Some(values.into_inner()))
    }

    fn resolve_array(&self, path: &str, prop: &SchemaNode, depth: usize) -> Result<Option<JsonValue>> {
        let Some(items) = prop.items.as_deref() else {
            return Ok(None);
        };

        // The item default stands in for the whole array, unwrapped
        if let Some(default) = &items.default {
            return Ok(Some(default.clone()));
        }

        let resolved = self.properties(items, path, depth + 1)?;
        if resolved.is_empty() {
            Ok(None)
        } else {
            Ok(Some(JsonValue::Object(resolved)))
        }
    }

    fn object(&self, node: &SchemaNode, path: &str, depth: usize) -> Result<JsonValue> {
        self.properties(node, path, depth).map(JsonValue::Object)
    }

    fn properties(
        &self,
        node: &SchemaNode,
        path: &str,
        depth: usize,
    ) -> Result<Map<String, JsonValue>> {
        let mut result = Map::new();

        for (key, prop) in &node.properties {
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };

            if let Some(value) = self.resolve_at(&child_path, prop, depth + 1)? {
                result.insert(key.clone(), value);
            }
        }

        Ok(result)
    }
}
