//! Image digests overlay
//!
//! Rendered templates look image references up under
//! `global.modulesImages.digests.<module>.<image>`. The digests come from an
//! `images_digests.json` file next to the module when one exists, and from a
//! built-in table of placeholders otherwise.

use phf::phf_map;
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::values::Values;

/// Digest file looked up next to a module
pub const IMAGES_DIGESTS_FILE: &str = "images_digests.json";

/// Where digests are placed inside the values tree
pub const DIGESTS_PATH: &str = "global.modulesImages.digests";

/// Image logical name to digest reference, grouped by module
pub type DigestTable = Map<String, JsonValue>;

static DEFAULT_IMAGES_DIGESTS: phf::Map<&'static str, phf::Map<&'static str, &'static str>> = phf_map! {
    "common" => phf_map! {
        "alpine" => "imageHash-common-alpine",
        "checkKernelVersion" => "imageHash-common-checkKernelVersion",
        "csiExternalAttacher" => "imageHash-common-csiExternalAttacher",
        "csiExternalProvisioner" => "imageHash-common-csiExternalProvisioner",
        "csiExternalResizer" => "imageHash-common-csiExternalResizer",
        "csiExternalSnapshotter" => "imageHash-common-csiExternalSnapshotter",
        "csiLivenessProbe" => "imageHash-common-csiLivenessProbe",
        "csiNodeDriverRegistrar" => "imageHash-common-csiNodeDriverRegistrar",
        "distroless" => "imageHash-common-distroless",
        "init" => "imageHash-common-init",
        "kubeRbacProxy" => "imageHash-common-kubeRbacProxy",
        "pause" => "imageHash-common-pause",
        "shellOperator" => "imageHash-common-shellOperator",
        "vpaUpdater" => "imageHash-common-vpaUpdater",
    },
};

/// The built-in digest table
pub fn default_digests() -> DigestTable {
    DEFAULT_IMAGES_DIGESTS
        .entries()
        .map(|(group, images)| {
            let images: Map<String, JsonValue> = images
                .entries()
                .map(|(name, digest)| (name.to_string(), JsonValue::String(digest.to_string())))
                .collect();
            (group.to_string(), JsonValue::Object(images))
        })
        .collect()
}

/// Find a non-empty digest file for the module in `module_dir`
///
/// The module directory is searched first, then its parent (the directory
/// holding a collection of modules).
pub fn locate_digests_file(module_dir: &Path) -> Option<PathBuf> {
    let candidates = std::iter::once(module_dir.to_path_buf())
        .chain(module_dir.parent().map(Path::to_path_buf))
        .map(|dir| dir.join(IMAGES_DIGESTS_FILE));

    for candidate in candidates {
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => return Some(candidate),
            Ok(_) => debug!(path = %candidate.display(), "digest file is empty, skipping"),
            Err(err) => debug!(path = %candidate.display(), error = %err, "no digest file"),
        }
    }

    None
}

/// Load a digest file; it must hold a JSON object
pub fn load_digests_file(path: &Path) -> Result<DigestTable> {
    let digests_error = |message: String| CoreError::Digests {
        path: path.display().to_string(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| digests_error(e.to_string()))?;
    let value: JsonValue =
        serde_json::from_str(&content).map_err(|e| digests_error(e.to_string()))?;

    match value {
        JsonValue::Object(digests) => Ok(digests),
        _ => Err(digests_error("expected a JSON object".to_string())),
    }
}

/// Digests for the module in `module_dir`
///
/// A missing or empty digest file is not an error: the built-in table is
/// returned instead. A file that exists but cannot be read or parsed is.
pub fn resolve_digests(module_dir: &Path) -> Result<DigestTable> {
    match locate_digests_file(module_dir) {
        Some(path) => {
            debug!(path = %path.display(), "loading images digests");
            load_digests_file(&path)
        }
        None => {
            debug!(module = %module_dir.display(), "using built-in images digests");
            Ok(default_digests())
        }
    }
}

/// Where a module's digests come from
///
/// Nothing is read until [`DigestSource::load`] is called.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestSource {
    /// A table already in memory
    Table(DigestTable),
    /// An explicit digest file
    File(PathBuf),
    /// `images_digests.json` around a module directory, see [`resolve_digests`]
    ModuleDir(PathBuf),
}

impl DigestSource {
    pub fn load(self) -> Result<DigestTable> {
        match self {
            Self::Table(digests) => Ok(digests),
            Self::File(path) => load_digests_file(&path),
            Self::ModuleDir(dir) => resolve_digests(&dir),
        }
    }
}

impl From<DigestTable> for DigestSource {
    fn from(digests: DigestTable) -> Self {
        Self::Table(digests)
    }
}

/// Place `digests` at `global.modulesImages.digests`
///
/// Other keys under `global` and `global.modulesImages` are kept; a prior
/// `digests` value is replaced as a whole.
pub fn apply_digests(values: &mut Values, digests: DigestTable) {
    values.set(DIGESTS_PATH, JsonValue::Object(digests));
}
