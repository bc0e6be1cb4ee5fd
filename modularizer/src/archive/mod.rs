//! JAR archive handling.
//!
//! - [`inspect`] opens archives and reads what the pipeline needs from their
//!   entry names.
//! - [`extraction`] unpacks every entry into a scratch directory.
//! - [`patching`] writes the modular copy of an archive.

pub mod extraction;
pub mod inspect;
pub mod patching;

pub use extraction::{ExtractionError, ExtractionReport, SkipReason, SkippedEntry, extract_all};
pub use inspect::{class_packages, has_module_descriptor, open_archive};
pub use patching::{PatchError, modular_archive_name, patch_archive};
