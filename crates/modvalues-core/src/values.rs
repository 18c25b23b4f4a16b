//! Generated value trees

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};

/// A mapping-rooted value tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub Map<String, JsonValue>);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse values from a YAML string; the document must be a mapping
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::try_from(value)
    }

    /// Parse values from a JSON string; the document must be a mapping
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Overlay the keys of `other` on top of these values
    ///
    /// Each key of `other` replaces the same key here wholesale; nested
    /// mappings are not merged. Keys absent from `other` are kept.
    pub fn overlay(&mut self, other: &Map<String, JsonValue>) {
        for (key, value) in other {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Set a value by dotted path (e.g., "global.modulesImages.digests")
    ///
    /// Missing or non-mapping intermediate levels become mappings; sibling
    /// keys along the path are preserved.
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let mut parts = path.split('.');
        let first = self.0.get(parts.next()?)?;
        parts.try_fold(first, |value, key| value.as_object()?.get(key))
    }

    /// Convert to a JSON value
    pub fn into_inner(self) -> JsonValue {
        JsonValue::Object(self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, JsonValue>> for Values {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl TryFrom<JsonValue> for Values {
    type Error = CoreError;

    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            JsonValue::Null => Ok(Self::new()),
            other => Err(CoreError::ValuesShape {
                kind: kind_of(&other),
            }),
        }
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "mapping",
    }
}

fn set_nested(map: &mut Map<String, JsonValue>, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        return;
    };

    if remaining.is_empty() {
        map.insert(key.to_string(), new_value);
        return;
    }

    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if !entry.is_object() {
        *entry = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(child) = entry {
        set_nested(child, remaining, new_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_is_shallow() {
        let mut base = Values::from_yaml(
            r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#,
        )
        .unwrap();

        let overlay = json!({"image": {"tag": "2.0"}, "debug": true});
        base.overlay(overlay.as_object().unwrap());

        assert_eq!(base.get("image"), Some(&json!({"tag": "2.0"})));
        assert_eq!(base.get("replicas").unwrap(), 1);
        assert_eq!(base.get("debug").unwrap(), true);
    }

    #[test]
    fn test_set_nested_creates_levels() {
        let mut values = Values::new();
        values.set("global.modulesImages.digests", json!({"a": "b"}));

        assert_eq!(values.get("global.modulesImages.digests.a").unwrap(), "b");
    }

    #[test]
    fn test_set_nested_keeps_siblings() {
        let mut values = Values::from_json(
            r#"{"global": {"clusterDomain": "cluster.local", "modulesImages": {"registry": "r", "digests": {"old": "x"}}}}"#,
        )
        .unwrap();

        values.set("global.modulesImages.digests", json!({"new": "y"}));

        assert_eq!(values.get("global.clusterDomain").unwrap(), "cluster.local");
        assert_eq!(values.get("global.modulesImages.registry").unwrap(), "r");
        assert_eq!(
            values.get("global.modulesImages.digests"),
            Some(&json!({"new": "y"}))
        );
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut values = Values::from_json(r#"{"global": "oops"}"#).unwrap();
        values.set("global.modulesImages.digests", json!({}));

        assert_eq!(values.get("global"), Some(&json!({"modulesImages": {"digests": {}}})));
    }

    #[test]
    fn test_get_missing_path() {
        let values = Values::from_yaml("a:\n  b: 1\n").unwrap();
        assert!(values.get("a.c").is_none());
        assert!(values.get("a.b.c").is_none());
        assert!(values.get("z").is_none());
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        let err = Values::from_yaml("- a\n- b\n").unwrap_err();
        assert!(matches!(err, CoreError::ValuesShape { kind: "sequence" }));
        assert_eq!(err.to_string(), "values document must be a mapping, got sequence");

        assert!(matches!(
            Values::from_json("42"),
            Err(CoreError::ValuesShape { kind: "number" })
        ));
        assert!(Values::from_yaml("~").unwrap().is_empty());
    }
}
