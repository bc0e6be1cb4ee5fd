//! Archive extraction into a scratch directory.
//!
//! Every entry is written below the destination directory. Entries whose
//! path would escape it, and entries the filesystem refuses (a component
//! too long for the platform, for example), are skipped and reported rather
//! than failing the whole extraction. Only an unreadable archive is fatal.

use camino::{Utf8Component, Utf8Path};
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors that stop extraction altogether.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive directory could not be read.
    #[error("cannot read archive entry #{index}: {source}")]
    Entry {
        /// Position of the entry in the archive directory.
        index: usize,
        /// Underlying ZIP failure.
        #[source]
        source: ZipError,
    },

    /// An entry's compressed data could not be read.
    #[error("cannot read contents of entry '{name}': {source}")]
    Contents {
        /// Entry name.
        name: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Why an entry was not written.
#[derive(Debug)]
pub enum SkipReason {
    /// The entry path is absolute or climbs out of the destination.
    UnsafePath,
    /// The filesystem rejected the destination path.
    Filesystem(std::io::Error),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsafePath => f.write_str("path escapes the extraction directory"),
            Self::Filesystem(err) => write!(f, "{err}"),
        }
    }
}

/// An entry that extraction left behind.
#[derive(Debug)]
pub struct SkippedEntry {
    /// Entry name as stored in the archive.
    pub name: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Outcome of a completed extraction.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Number of entries written, directories included.
    pub extracted: usize,
    /// Entries that were not written.
    pub skipped: Vec<SkippedEntry>,
}

/// Extracts every entry of `archive` below `dest`.
///
/// # Errors
///
/// Returns [`ExtractionError`] when the archive itself cannot be read.
/// Entries the filesystem rejects are reported in
/// [`ExtractionReport::skipped`] instead.
pub fn extract_all<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Utf8Path,
) -> Result<ExtractionReport, ExtractionError> {
    let mut report = ExtractionReport::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ExtractionError::Entry { index, source })?;
        let name = entry.name().to_owned();

        let Some(relative) = validate_entry_path(&name) else {
            report.skipped.push(SkippedEntry {
                name,
                reason: SkipReason::UnsafePath,
            });
            continue;
        };
        let target = dest.join(relative);

        let written = if entry.is_dir() {
            std::fs::create_dir_all(&target)
        } else {
            stream_entry(&mut entry, &target, &name)?
        };

        match written {
            Ok(()) => report.extracted += 1,
            Err(err) => {
                debug!("skipping entry '{name}': {err}");
                report.skipped.push(SkippedEntry {
                    name,
                    reason: SkipReason::Filesystem(err),
                });
            }
        }
    }

    Ok(report)
}

/// Copies one entry to `target` without trusting its declared size.
///
/// The outer error means the archive could not be read; the inner one means
/// the filesystem refused the write.
fn stream_entry(
    entry: &mut impl Read,
    target: &Utf8Path,
    name: &str,
) -> Result<std::io::Result<()>, ExtractionError> {
    let mut file = match create_file(target) {
        Ok(file) => file,
        Err(err) => return Ok(Err(err)),
    };
    let mut reader = TrackedReader::new(entry);
    match std::io::copy(&mut reader, &mut file) {
        Ok(_) => Ok(Ok(())),
        Err(source) if reader.failed => Err(ExtractionError::Contents {
            name: name.to_owned(),
            source,
        }),
        Err(err) => Ok(Err(err)),
    }
}

fn create_file(target: &Utf8Path) -> std::io::Result<File> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::create(target)
}

/// Remembers whether a read failed, so copy errors can be attributed.
struct TrackedReader<'r, R> {
    inner: &'r mut R,
    failed: bool,
}

impl<'r, R: Read> TrackedReader<'r, R> {
    fn new(inner: &'r mut R) -> Self {
        Self {
            inner,
            failed: false,
        }
    }
}

impl<R: Read> Read for TrackedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = self.inner.read(buf);
        if let Err(err) = &read {
            self.failed = err.kind() != ErrorKind::Interrupted;
        }
        read
    }
}

/// Returns the entry path when it stays inside the extraction directory.
fn validate_entry_path(name: &str) -> Option<&Utf8Path> {
    let path = Utf8Path::new(name);
    let safe = path
        .components()
        .all(|component| matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir));
    (safe && !name.is_empty()).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::JarBuilder;
    use rstest::{fixture, rstest};
    use std::io::Cursor;
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn utf8(dir: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(dir.path()).expect("temp dir should be UTF-8")
    }

    fn archive(builder: JarBuilder) -> ZipArchive<Cursor<Vec<u8>>> {
        let bytes = builder.to_bytes().expect("build archive");
        ZipArchive::new(Cursor::new(bytes)).expect("read archive")
    }

    #[rstest]
    #[case::relative("com/acme/Foo.class", true)]
    #[case::current_dir("./com/Foo.class", true)]
    #[case::parent_dir("../evil.class", false)]
    #[case::nested_parent("com/../../evil.class", false)]
    #[case::absolute("/etc/passwd", false)]
    #[case::empty("", false)]
    fn entry_paths_must_stay_inside(#[case] name: &str, #[case] safe: bool) {
        assert_eq!(validate_entry_path(name).is_some(), safe);
    }

    #[rstest]
    fn writes_files_and_directories(scratch: TempDir) {
        let mut jar = archive(
            JarBuilder::new()
                .directory("com/acme/")
                .class("com/acme/Foo.class")
                .entry("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
        );
        let dest = utf8(&scratch);

        let report = extract_all(&mut jar, dest).expect("extraction should succeed");

        assert_eq!(report.extracted, 3);
        assert!(report.skipped.is_empty());
        assert!(dest.join("com/acme").is_dir());
        assert!(dest.join("com/acme/Foo.class").is_file());
        let manifest =
            std::fs::read_to_string(dest.join("META-INF/MANIFEST.MF")).expect("read manifest");
        assert_eq!(manifest, "Manifest-Version: 1.0\n");
    }

    /// A single empty stored entry whose central directory claims a zip64
    /// uncompressed size of 2^62 bytes.
    fn oversized_claim_jar(name: &str) -> Vec<u8> {
        const ZIP64_MARKER: u32 = u32::MAX;
        const CLAIMED_SIZE: u64 = 1 << 62;
        const DOS_DATE_1980_01_01: u16 = 0x21;
        let name_len = u16::try_from(name.len()).expect("short entry name");

        let mut bytes = Vec::new();
        // Local file header.
        bytes.extend_from_slice(&0x0403_4b50_u32.to_le_bytes());
        bytes.extend_from_slice(&45_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&name_len.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());

        let directory_offset = u32::try_from(bytes.len()).expect("small archive");
        // Central directory header with a zip64 extra field.
        bytes.extend_from_slice(&0x0201_4b50_u32.to_le_bytes());
        bytes.extend_from_slice(&45_u16.to_le_bytes());
        bytes.extend_from_slice(&45_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&ZIP64_MARKER.to_le_bytes());
        bytes.extend_from_slice(&name_len.to_le_bytes());
        bytes.extend_from_slice(&12_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&0x0001_u16.to_le_bytes());
        bytes.extend_from_slice(&8_u16.to_le_bytes());
        bytes.extend_from_slice(&CLAIMED_SIZE.to_le_bytes());
        let directory_size =
            u32::try_from(bytes.len()).expect("small archive") - directory_offset;

        // End of central directory record.
        bytes.extend_from_slice(&0x0605_4b50_u32.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&directory_size.to_le_bytes());
        bytes.extend_from_slice(&directory_offset.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
        bytes
    }

    #[rstest]
    fn declared_entry_size_is_not_trusted(scratch: TempDir) {
        let bytes = oversized_claim_jar("com/acme/Huge.class");
        let mut jar = ZipArchive::new(Cursor::new(bytes)).expect("read archive");
        assert_eq!(
            jar.by_index(0).expect("entry").size(),
            1 << 62,
            "archive should carry the oversized claim"
        );
        let dest = utf8(&scratch);

        // Extraction must finish rather than reserve memory for the claim.
        match extract_all(&mut jar, dest) {
            Ok(report) => {
                assert_eq!(report.extracted, 1);
                let written = std::fs::metadata(dest.join("com/acme/Huge.class"))
                    .expect("entry written");
                assert_eq!(written.len(), 0);
            }
            Err(err) => assert!(
                matches!(err, ExtractionError::Contents { .. }),
                "unexpected failure: {err}"
            ),
        }
    }

    #[rstest]
    fn unsafe_entries_are_skipped(scratch: TempDir) {
        let mut jar = archive(
            JarBuilder::new()
                .entry("../escape.txt", b"nope")
                .class("com/acme/Foo.class"),
        );
        let dest = utf8(&scratch).join("inner");
        std::fs::create_dir_all(&dest).expect("create dest");

        let report = extract_all(&mut jar, &dest).expect("extraction should continue");

        assert_eq!(report.extracted, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped.first().map(|entry| &entry.reason),
            Some(SkipReason::UnsafePath)
        ));
        assert!(!utf8(&scratch).join("escape.txt").exists());
    }

    #[cfg(unix)]
    #[rstest]
    fn over_long_paths_are_skipped(scratch: TempDir) {
        let long_package = format!("com/{}/", "a".repeat(300));
        let long_class = format!("{long_package}Foo.class");
        let mut jar = archive(
            JarBuilder::new()
                .class(&long_class)
                .class("com/acme/Bar.class"),
        );

        let report = extract_all(&mut jar, utf8(&scratch)).expect("extraction should continue");

        assert_eq!(report.extracted, 1);
        let skipped = report.skipped.first().expect("long entry skipped");
        assert_eq!(skipped.name, long_class);
        let SkipReason::Filesystem(err) = &skipped.reason else {
            panic!("expected a filesystem rejection");
        };
        assert_eq!(err.raw_os_error(), Some(libc::ENAMETOOLONG));
    }
}
