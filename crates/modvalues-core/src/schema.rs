//! OpenAPI schema model for values synthesis
//!
//! A [`SchemaNode`] is a plain record of optional keywords. Nothing on the
//! node says what "kind" of schema it is: the resolver in
//! [`crate::generator`] decides by looking at which keywords are populated.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Vendor extension carrying example values
pub const EXAMPLES_KEY: &str = "x-examples";

/// Vendor extension pulling another schema file into this one
pub const EXTEND_KEY: &str = "x-extend";

pub const OBJECT_TYPE: &str = "object";
pub const ARRAY_TYPE: &str = "array";

/// The `type` keyword: a single name or a list of names
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaTypes(Vec<String>);

impl SchemaTypes {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for SchemaTypes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            Some(OneOrMany::One(t)) => Self(vec![t]),
            Some(OneOrMany::Many(types)) => Self(types),
            None => Self::default(),
        })
    }
}

/// A node of a values schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSchemaNode", rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "type", skip_serializing_if = "SchemaTypes::is_empty")]
    pub types: SchemaTypes,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,

    /// `None` when the keyword is absent or explicitly `null`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    /// `x-` prefixed keywords only
    #[serde(flatten)]
    pub extensions: IndexMap<String, JsonValue>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,

    /// Parsed but never resolved
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
}

impl SchemaNode {
    /// Parse a schema from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Build a schema from an already parsed JSON value
    pub fn from_value(value: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn extension(&self, key: &str) -> Option<&JsonValue> {
        self.extensions.get(key)
    }

    pub fn is_object(&self) -> bool {
        self.types.contains(OBJECT_TYPE)
    }

    pub fn is_array(&self) -> bool {
        self.types.contains(ARRAY_TYPE)
    }

    /// Drop `oneOf`, `anyOf` and `allOf`
    pub fn clear_compositions(&mut self) {
        self.one_of.clear();
        self.any_of.clear();
        self.all_of.clear();
    }
}

/// Wire form of a schema node; unknown keywords land in `rest`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchemaNode {
    #[serde(rename = "type", default)]
    types: SchemaTypes,

    #[serde(default)]
    properties: Option<IndexMap<String, SchemaNode>>,

    #[serde(default)]
    items: Option<RawItems>,

    #[serde(rename = "enum", default)]
    enum_values: Option<Vec<JsonValue>>,

    #[serde(default)]
    default: Option<JsonValue>,

    #[serde(default)]
    one_of: Option<Vec<SchemaNode>>,

    #[serde(default)]
    any_of: Option<Vec<SchemaNode>>,

    #[serde(default)]
    all_of: Option<Vec<SchemaNode>>,

    #[serde(flatten)]
    rest: IndexMap<String, JsonValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItems {
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

impl From<RawSchemaNode> for SchemaNode {
    fn from(raw: RawSchemaNode) -> Self {
        let items = match raw.items {
            Some(RawItems::Single(schema)) => Some(schema),
            Some(RawItems::Tuple(schemas)) => {
                tracing::warn!(
                    count = schemas.len(),
                    "tuple-form items are not supported, ignoring"
                );
                None
            }
            None => None,
        };

        Self {
            types: raw.types,
            properties: raw.properties.unwrap_or_default(),
            items,
            enum_values: raw.enum_values.unwrap_or_default(),
            default: raw.default,
            extensions: raw
                .rest
                .into_iter()
                .filter(|(key, _)| key.starts_with("x-"))
                .collect(),
            one_of: raw.one_of.unwrap_or_default(),
            any_of: raw.any_of.unwrap_or_default(),
            all_of: raw.all_of.unwrap_or_default(),
        }
    }
}
