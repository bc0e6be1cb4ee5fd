//! Error types for the modularizer.
//!
//! Errors come in two tiers. [`ModularizerError`] aborts the whole run: bad
//! arguments, an unusable descriptor, no archives, no JDK. [`ArtifactError`]
//! fails a single archive; the run records it and moves on to the next one.

use crate::archive::extraction::ExtractionError;
use crate::archive::patching::PatchError;
use crate::compiler::CompileError;
use camino::Utf8PathBuf;
use jarmod::{DescriptorError, OrderError};
use thiserror::Error;

/// Errors that abort a modularization run.
#[derive(Debug, Error)]
pub enum ModularizerError {
    /// The descriptor path does not exist.
    #[error("descriptor file does not exist ({path})")]
    DescriptorMissing {
        /// Path given on the command line.
        path: Utf8PathBuf,
    },

    /// The descriptor path exists but is not a regular file.
    #[error("descriptor is not a file ({path})")]
    DescriptorNotFile {
        /// Path given on the command line.
        path: Utf8PathBuf,
    },

    /// The source directory does not exist.
    #[error("source directory does not exist ({path})")]
    SourceMissing {
        /// Path given on the command line.
        path: Utf8PathBuf,
    },

    /// The source path exists but is not a directory.
    #[error("source is not a directory ({path})")]
    SourceNotDirectory {
        /// Path given on the command line.
        path: Utf8PathBuf,
    },

    /// The destination exists but is not a directory.
    #[error("destination is not a directory ({path})")]
    DestinationNotDirectory {
        /// Destination path.
        path: Utf8PathBuf,
    },

    /// The destination directory could not be created.
    #[error("cannot create destination directory {path}: {source}")]
    DestinationUnavailable {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor could not be loaded.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Declared modules could not be ordered.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The source directory could not be listed.
    #[error("cannot read source directory {path}: {source}")]
    SourceUnreadable {
        /// Source directory.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The source directory contains no `.jar` files.
    #[error("there are no JAR files in source directory {path}")]
    NoArchives {
        /// Source directory.
        path: Utf8PathBuf,
    },

    /// No usable JDK could be located.
    #[error("no usable JDK: {reason}")]
    ToolchainUnavailable {
        /// Why the JDK could not be used.
        reason: String,
    },

    /// A path on the command line or in the environment is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },
}

/// Result type alias using [`ModularizerError`].
pub type Result<T> = std::result::Result<T, ModularizerError>;

/// Errors that fail a single archive without stopping the run.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The archive could not be opened or is not a valid ZIP file.
    #[error("cannot open '{archive}': {source}")]
    OpenArchive {
        /// Archive file name.
        archive: String,
        /// Underlying ZIP failure.
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive already carries a module descriptor.
    #[error("'{archive}' already contains at least one module definition")]
    AlreadyModular {
        /// Archive file name.
        archive: String,
    },

    /// The archive contents could not be read during extraction.
    #[error("cannot extract '{archive}': {source}")]
    Extraction {
        /// Archive file name.
        archive: String,
        /// Underlying extraction failure.
        #[source]
        source: ExtractionError,
    },

    /// The scratch directory could not be created.
    #[error("cannot create scratch directory for '{archive}': {source}")]
    ScratchDir {
        /// Archive file name.
        archive: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The module declaration source could not be written.
    #[error("cannot write module declaration {path}: {source}")]
    WriteSource {
        /// Path of the source file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The compiler rejected the module declaration or could not run.
    #[error("cannot compile module declaration for '{archive}': {source}")]
    Compile {
        /// Archive file name.
        archive: String,
        /// Underlying compiler failure.
        #[source]
        source: CompileError,
    },

    /// The compiled descriptor could not be read back.
    #[error("cannot read compiled descriptor {path}: {source}")]
    ReadDescriptor {
        /// Expected path of the compiled descriptor.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The modular copy of the archive could not be written.
    #[error("cannot patch '{archive}': {source}")]
    Patch {
        /// Archive file name.
        archive: String,
        /// Underlying patch failure.
        #[source]
        source: PatchError,
    },
}
