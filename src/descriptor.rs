//! Modularization descriptor loading.
//!
//! The descriptor is a JSON array with one record per archive:
//!
//! ```json
//! [
//!   { "name": "core.jar", "module": { "name": "core" } },
//!   {
//!     "name": "app.jar",
//!     "module": {
//!       "name": "app",
//!       "exportsPackages": ["com.app.api"],
//!       "requiresModules": ["core", "java.sql"]
//!     }
//!   }
//! ]
//! ```
//!
//! Records are deduplicated by archive name; the first declaration wins.

use crate::entity::{Artifact, ArtifactSet, Module, ModuleName};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a modularization descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor file could not be read.
    #[error("failed to read modularization descriptor {path}: {source}")]
    Read {
        /// Path of the descriptor file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid JSON or does not match the record shape.
    #[error("error parsing modularization descriptor: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record parsed but carries an unusable value.
    #[error("invalid descriptor entry #{index}: {reason}")]
    InvalidEntry {
        /// Zero-based position of the record in the array.
        index: usize,
        /// What is wrong with the record.
        reason: String,
    },

    /// The descriptor declares no artifacts.
    #[error("empty descriptor: no artifacts declared")]
    Empty,

    /// A descriptor file was read but its contents were rejected.
    #[error("invalid modularization descriptor {path}: {source}")]
    Invalid {
        /// Path of the descriptor file.
        path: Utf8PathBuf,
        /// Why the contents were rejected.
        #[source]
        source: Box<DescriptorError>,
    },
}

/// Result type alias using [`DescriptorError`].
pub type Result<T> = std::result::Result<T, DescriptorError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactRecord {
    name: String,
    module: ModuleRecord,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ModuleRecord {
    name: String,
    #[serde(default)]
    exports_packages: Option<Vec<String>>,
    #[serde(default)]
    requires_modules: Option<Vec<ModuleName>>,
}

/// Reads and parses the descriptor at `path`.
///
/// # Errors
///
/// Returns [`DescriptorError::Read`] when the file cannot be read, and
/// [`DescriptorError::Invalid`] wrapping the [`parse_descriptor`] error when
/// its contents are rejected.
pub fn load_descriptor(path: &Utf8Path) -> Result<ArtifactSet> {
    let contents = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
        path: path.to_owned(),
        source,
    })?;
    debug!("loaded modularization descriptor {path} ({} bytes)", contents.len());
    parse_descriptor(&contents).map_err(|source| DescriptorError::Invalid {
        path: path.to_owned(),
        source: Box::new(source),
    })
}

/// Parses descriptor JSON into a deduplicated [`ArtifactSet`].
///
/// # Examples
///
/// ```
/// use jarmod::descriptor::parse_descriptor;
///
/// let set = parse_descriptor(r#"[
///     {"name": "b.jar", "module": {"name": "b"}},
///     {"name": "a.jar", "module": {"name": "a", "requiresModules": ["b"]}}
/// ]"#)?;
/// assert_eq!(set.len(), 2);
/// # Ok::<(), jarmod::descriptor::DescriptorError>(())
/// ```
///
/// # Errors
///
/// Returns [`DescriptorError::Parse`] for malformed JSON or unknown keys,
/// [`DescriptorError::InvalidEntry`] for blank names, and
/// [`DescriptorError::Empty`] when no artifact is declared.
pub fn parse_descriptor(text: &str) -> Result<ArtifactSet> {
    let records: Vec<ArtifactRecord> = serde_json::from_str(text)?;
    if records.is_empty() {
        return Err(DescriptorError::Empty);
    }

    let mut set = ArtifactSet::new();
    for (index, record) in records.into_iter().enumerate() {
        let artifact = into_artifact(index, record)?;
        let name = artifact.name().to_owned();
        if !set.insert(artifact) {
            warn!("artifact '{name}' is declared more than once; keeping the first declaration");
        }
    }
    Ok(set)
}

fn into_artifact(index: usize, record: ArtifactRecord) -> Result<Artifact> {
    let invalid = |reason: &str| DescriptorError::InvalidEntry {
        index,
        reason: reason.to_owned(),
    };

    if record.name.trim().is_empty() {
        return Err(invalid("archive name is empty"));
    }
    let module = record.module;
    if module.name.trim().is_empty() {
        return Err(invalid("module name is empty"));
    }
    if module
        .exports_packages
        .iter()
        .flatten()
        .any(|package| package.trim().is_empty())
    {
        return Err(invalid("exportsPackages contains an empty package name"));
    }
    if module
        .requires_modules
        .iter()
        .flatten()
        .any(|required| required.as_str().trim().is_empty())
    {
        return Err(invalid("requiresModules contains an empty module name"));
    }

    Ok(Artifact::new(
        record.name,
        Module::new(
            module.name,
            module.exports_packages,
            module.requires_modules,
        ),
    ))
}
