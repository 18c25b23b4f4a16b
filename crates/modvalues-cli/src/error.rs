//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use modvalues_core::CoreError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Schemas missing or not resolvable to values
    #[error("Schema error: {message}")]
    #[diagnostic(code(modvalues::cli::schema))]
    Schema {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Module directory or identity error
    #[error("Module error: {message}")]
    #[diagnostic(code(modvalues::cli::module))]
    Module {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, unreadable digests, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(modvalues::cli::io))]
    Io { message: String },

    /// Internal error (serialization, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(modvalues::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Schema { .. } => exit_codes::SCHEMA_ERROR,
            CliError::Module { .. } => exit_codes::MODULE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a schema error with help text
    pub fn schema_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::MissingValuesSchema { .. } => CliError::schema_with_help(
                message,
                "add openapi/values.yaml (or openapi/config-values.yaml) to the module",
            ),
            CoreError::Generate { ref source, .. }
                if matches!(**source, CoreError::DepthExceeded { .. }) =>
            {
                CliError::schema_with_help(message, "check the schema for cycles or raise --max-depth")
            }
            CoreError::DepthExceeded { .. } => CliError::schema_with_help(
                message,
                "check the schema for cycles or raise --max-depth",
            ),
            CoreError::Generate { .. }
            | CoreError::SchemaLoad { .. }
            | CoreError::ExampleShape { .. }
            | CoreError::ValuesShape { .. } => CliError::Schema {
                message,
                help: None,
            },
            CoreError::InvalidModule { .. } | CoreError::YamlParse(_) => CliError::Module {
                message,
                help: None,
            },
            CoreError::Digests { .. } | CoreError::Io(_) => CliError::Io { message },
            CoreError::JsonParse(_) => CliError::Internal { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
