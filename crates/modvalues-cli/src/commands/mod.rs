//! CLI commands

pub mod context;
pub mod values;

use clap::{Args, ValueEnum};
use console::style;
use modvalues_core::generator::DEFAULT_MAX_DEPTH;
use modvalues_core::{
    DigestSource, GeneratorConfig, Module, RenderContext, SchemaStorage, ValuesComposer,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{CliError, Result};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Where a module's schemas and digests come from
#[derive(Debug, Args)]
pub struct ModuleArgs {
    /// Module directory
    pub module: PathBuf,

    /// Global values schema: a directory containing openapi/ or a schema file
    #[arg(long, env = "MODVALUES_GLOBAL_SCHEMA")]
    pub global: Option<PathBuf>,

    /// Images digests file (default: images_digests.json next to the module)
    #[arg(long)]
    pub digests: Option<PathBuf>,

    /// Maximum schema nesting depth
    #[arg(long, env = "MODVALUES_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

/// Load the module and build its render context
///
/// Returns `Ok(None)` after printing a warning when the module has no
/// OpenAPI schemas.
pub fn build_context(args: &ModuleArgs) -> Result<Option<RenderContext>> {
    let module = Module::from_dir(&args.module)?;
    debug!(module = %module.name, namespace = %module.namespace, "loaded module");

    let module_schemas = SchemaStorage::load_dir(&module.path)?;
    let global_schemas = match &args.global {
        Some(path) => Some(SchemaStorage::load(path)?.ok_or_else(|| {
            CliError::schema_with_help(
                format!("no global schemas found in {}", path.display()),
                "point --global at a directory containing openapi/ or at a schema file",
            )
        })?),
        None => None,
    };

    let digests = match &args.digests {
        Some(path) => DigestSource::File(path.clone()),
        None => DigestSource::ModuleDir(module.path.clone()),
    };

    let mut composer = ValuesComposer::new(&module, module_schemas.as_ref()).with_config(
        GeneratorConfig {
            max_depth: args.max_depth,
        },
    );
    if let Some(global) = &global_schemas {
        composer = composer.with_global(global);
    }

    let context = composer.render_context(digests)?;
    if context.is_none() {
        eprintln!(
            "{} Module {} has no openapi schemas, nothing to generate",
            style("⚠").yellow(),
            style(&module.name).bold()
        );
    }

    Ok(context)
}

/// Print `value` to stdout in the requested format
pub fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| CliError::internal(e.to_string()))?
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| CliError::internal(e.to_string()))?
        }
    };

    println!("{}", rendered.trim_end());
    Ok(())
}
