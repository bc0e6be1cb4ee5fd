//! Read-only queries over archive entry names.

use crate::module_info::MODULE_INFO_CLASS;
use camino::Utf8Path;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek};
use zip::ZipArchive;
use zip::result::ZipResult;

/// Opens the archive at `path` for reading.
///
/// # Errors
///
/// Returns a [`zip::result::ZipError`] when the file cannot be opened or is
/// not a valid ZIP archive.
pub fn open_archive(path: &Utf8Path) -> ZipResult<ZipArchive<File>> {
    let file = File::open(path)?;
    ZipArchive::new(file)
}

/// Returns true when any entry is a compiled module descriptor, including
/// multi-release entries under `META-INF/versions/`.
#[must_use]
pub fn has_module_descriptor<R: Read + Seek>(archive: &ZipArchive<R>) -> bool {
    archive
        .file_names()
        .any(|name| final_segment(name) == MODULE_INFO_CLASS)
}

/// Returns the sorted, de-duplicated packages that hold at least one class.
///
/// Classes in the unnamed package, module descriptors and anything under
/// `META-INF/` contribute no package.
///
/// # Examples
///
/// ```
/// use jarmod_modularizer::archive::class_packages;
/// use std::io::{Cursor, Write};
/// use zip::write::SimpleFileOptions;
///
/// let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
/// for name in ["com/acme/A.class", "com/acme/B.class", "Main.class", "com/acme/res.txt"] {
///     writer.start_file(name, SimpleFileOptions::default())?;
///     writer.write_all(b"x")?;
/// }
/// let archive = zip::ZipArchive::new(writer.finish()?)?;
///
/// assert_eq!(class_packages(&archive), vec!["com.acme".to_owned()]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn class_packages<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    archive
        .file_names()
        .filter(|name| name.ends_with(".class") && !name.starts_with("META-INF/"))
        .filter(|name| final_segment(name) != MODULE_INFO_CLASS)
        .filter_map(|name| name.rsplit_once('/'))
        .map(|(directory, _)| directory.replace('/', "."))
        .filter(|package| !package.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn final_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
