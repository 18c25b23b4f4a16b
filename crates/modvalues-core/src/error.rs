//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("cannot find openapi values schema for module {module}")]
    MissingValuesSchema { module: String },

    #[error("generate values: module {module}: {source}")]
    Generate {
        module: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("schemas load: {path}: {message}")]
    SchemaLoad { path: String, message: String },

    #[error("property {path}: x-examples value must be a mapping for an object schema")]
    ExampleShape { path: String },

    #[error("property {path}: schema nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { path: String, limit: usize },

    #[error("values document must be a mapping, got {kind}")]
    ValuesShape { kind: &'static str },

    #[error("images digests {path}: {message}")]
    Digests { path: String, message: String },

    #[error("Invalid module: {message}")]
    InvalidModule { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Wrap an error raised while generating values for `module`
    pub fn generate(module: &str, source: CoreError) -> Self {
        Self::Generate {
            module: module.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
