//! modvalues core - representative Helm values from module OpenAPI schemas
//!
//! This crate synthesizes a values document for a template dry run:
//! - `SchemaNode`: OpenAPI values schema model
//! - `ValuesGenerator` / `PropertyResolver`: one value per schema property
//! - `merge_schemas`: `oneOf`/`anyOf` flattening
//! - `apply_digests`: image digests under `global.modulesImages.digests`
//! - `RenderContext`: `Chart`, `Capabilities`, `Release` and `Values` for templates
//! - `Module` / `ValuesComposer`: module discovery and the module-level entry point

pub mod context;
pub mod digests;
pub mod error;
pub mod generator;
pub mod merge;
pub mod module;
pub mod schema;
pub mod storage;
pub mod values;

pub use context::{Capabilities, KubeVersion, ReleaseInfo, RenderContext};
pub use digests::{
    DigestSource, DigestTable, apply_digests, default_digests, resolve_digests,
};
pub use error::{CoreError, Result};
pub use generator::{GeneratorConfig, PropertyResolver, ValueSource, ValuesGenerator};
pub use merge::merge_schemas;
pub use module::{ChartMetadata, Module, ValuesComposer, to_lower_camel};
pub use schema::{SchemaNode, SchemaTypes};
pub use storage::SchemaStorage;
pub use values::Values;
