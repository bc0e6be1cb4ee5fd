//! Per-archive modularization pipeline.
//!
//! Each archive goes through the same steps: reject archives that already
//! carry a descriptor, extract everything into a private scratch directory,
//! generate `module-info.java`, compile it against the module path, and
//! write a modular copy of the archive into the destination. The scratch
//! directory is removed whatever the outcome.

use crate::archive::{
    class_packages, extract_all, has_module_descriptor, open_archive, patch_archive,
};
use crate::compiler::{DescriptorCompiler, module_search_path};
use crate::error::ArtifactError;
use crate::module_info::{MODULE_INFO_CLASS, MODULE_INFO_SOURCE, render_module_info};
use camino::{Utf8Path, Utf8PathBuf};
use jarmod::Artifact;
use log::{debug, warn};
use std::fs::File;
use zip::ZipArchive;

/// Turns one legacy archive into a modular one.
pub struct ArtifactPipeline<'a> {
    compiler: &'a dyn DescriptorCompiler,
    destination: &'a Utf8Path,
    module_path: String,
}

impl<'a> ArtifactPipeline<'a> {
    /// Creates a pipeline writing into `destination`.
    ///
    /// Declarations are compiled against the destination, so archives
    /// modularized earlier in the run satisfy later `requires`, followed by
    /// `extra_module_path` when given.
    #[must_use]
    pub fn new(
        compiler: &'a dyn DescriptorCompiler,
        destination: &'a Utf8Path,
        extra_module_path: Option<&str>,
    ) -> Self {
        Self {
            compiler,
            destination,
            module_path: module_search_path(destination, extra_module_path),
        }
    }

    /// Returns the module path handed to the compiler.
    #[must_use]
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Returns the directory modular archives are written to.
    #[must_use]
    pub fn destination(&self) -> &Utf8Path {
        self.destination
    }

    /// Modularizes `archive_path` as `artifact` and returns the path of the
    /// modular copy.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] describing the first step that failed. The
    /// source archive is never modified and no partial copy is left in the
    /// destination.
    pub fn modularize(
        &self,
        archive_path: &Utf8Path,
        artifact: &Artifact,
    ) -> Result<Utf8PathBuf, ArtifactError> {
        let archive_name = archive_path.file_name().unwrap_or(artifact.name()).to_owned();

        let mut archive = open_archive(archive_path).map_err(|source| ArtifactError::OpenArchive {
            archive: archive_name.clone(),
            source,
        })?;
        if has_module_descriptor(&archive) {
            return Err(ArtifactError::AlreadyModular {
                archive: archive_name,
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix(&format!("{archive_name}-"))
            .tempdir()
            .map_err(|source| ArtifactError::ScratchDir {
                archive: archive_name.clone(),
                source,
            })?;
        let outcome = match Utf8Path::from_path(scratch.path()) {
            Some(dir) => self.build_in(dir, &mut archive, archive_path, &archive_name, artifact),
            None => Err(ArtifactError::ScratchDir {
                archive: archive_name.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("path {} is not valid UTF-8", scratch.path().display()),
                ),
            }),
        };

        if let Err(err) = scratch.close() {
            warn!("cannot remove scratch directory for '{archive_name}': {err}");
        }
        outcome
    }

    fn build_in(
        &self,
        scratch: &Utf8Path,
        archive: &mut ZipArchive<File>,
        archive_path: &Utf8Path,
        archive_name: &str,
        artifact: &Artifact,
    ) -> Result<Utf8PathBuf, ArtifactError> {
        debug!("extracting '{archive_name}' into {scratch}");
        let report = extract_all(archive, scratch).map_err(|source| ArtifactError::Extraction {
            archive: archive_name.to_owned(),
            source,
        })?;
        for skipped in &report.skipped {
            warn!(
                "entry '{}' of '{archive_name}' was not extracted ({}); the archive may fail to modularize",
                skipped.name, skipped.reason
            );
        }

        let source = render_module_info(artifact.module(), &class_packages(archive));
        let source_path = scratch.join(MODULE_INFO_SOURCE);
        std::fs::write(&source_path, source).map_err(|err| ArtifactError::WriteSource {
            path: source_path.clone(),
            source: err,
        })?;

        self.compiler
            .compile(scratch, &self.module_path)
            .map_err(|source| ArtifactError::Compile {
                archive: archive_name.to_owned(),
                source,
            })?;

        let class_path = scratch.join(MODULE_INFO_CLASS);
        let descriptor = std::fs::read(&class_path).map_err(|source| ArtifactError::ReadDescriptor {
            path: class_path.clone(),
            source,
        })?;

        patch_archive(archive_path, self.destination, &descriptor).map_err(|source| {
            ArtifactError::Patch {
                archive: archive_name.to_owned(),
                source,
            }
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
