//! Writing the modular copy of an archive.
//!
//! The source archive is never touched. Its bytes are copied verbatim into
//! the destination directory and the compiled descriptor is appended to the
//! copy as a new `module-info.class` entry.

use crate::module_info::MODULE_INFO_CLASS;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use thiserror::Error;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

/// Suffix appended to the source file name to name the modular copy.
pub const MODULAR_SUFFIX: &str = "-mod.jar";

/// Errors raised while writing the modular copy.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The source path has no file name.
    #[error("source archive {path} has no file name")]
    NoFileName {
        /// Source archive path.
        path: Utf8PathBuf,
    },

    /// The source archive could not be copied.
    #[error("cannot copy {source_path} to {target}: {source}")]
    Copy {
        /// Source archive path.
        source_path: Utf8PathBuf,
        /// Destination path of the copy.
        target: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor entry could not be appended to the copy.
    #[error("cannot append module-info.class to {target}: {source}")]
    Append {
        /// Destination path of the copy.
        target: Utf8PathBuf,
        /// Underlying ZIP failure.
        #[source]
        source: ZipError,
    },
}

/// Returns the file name of the modular copy of `file_name`.
///
/// # Examples
///
/// ```
/// use jarmod_modularizer::archive::modular_archive_name;
///
/// assert_eq!(modular_archive_name("commons-io.jar"), "commons-io.jar-mod.jar");
/// ```
#[must_use]
pub fn modular_archive_name(file_name: &str) -> String {
    format!("{file_name}{MODULAR_SUFFIX}")
}

/// Copies `source` into `dest_dir` under its modular name and appends
/// `descriptor` as the `module-info.class` entry. Returns the path of the
/// copy.
///
/// A copy left behind by a failed append is removed.
///
/// # Errors
///
/// Returns [`PatchError`] when the copy or the append fails.
pub fn patch_archive(
    source: &Utf8Path,
    dest_dir: &Utf8Path,
    descriptor: &[u8],
) -> Result<Utf8PathBuf, PatchError> {
    let file_name = source.file_name().ok_or_else(|| PatchError::NoFileName {
        path: source.to_owned(),
    })?;
    let target = dest_dir.join(modular_archive_name(file_name));

    fs::copy(source, &target).map_err(|err| PatchError::Copy {
        source_path: source.to_owned(),
        target: target.clone(),
        source: err,
    })?;

    if let Err(err) = append_descriptor(&target, descriptor) {
        if let Err(remove_err) = fs::remove_file(&target) {
            warn!("cannot remove partial archive {target}: {remove_err}");
        }
        return Err(PatchError::Append {
            target,
            source: err,
        });
    }

    debug!("wrote {target} ({} byte descriptor)", descriptor.len());
    Ok(target)
}

fn append_descriptor(target: &Utf8Path, descriptor: &[u8]) -> Result<(), ZipError> {
    let file = OpenOptions::new().read(true).write(true).open(target)?;
    let mut writer = ZipWriter::new_append(file)?;
    writer.start_file(MODULE_INFO_CLASS, SimpleFileOptions::default())?;
    writer.write_all(descriptor)?;
    writer.finish()?;
    Ok(())
}
