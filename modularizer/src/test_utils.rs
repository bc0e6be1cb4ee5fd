//! Shared test utilities for the modularizer crate.
//!
//! Builders for archives and JDK installations, command output helpers, and
//! [`FakeCompiler`], which stands in for `javac` so pipelines can run
//! without a JDK.

use crate::archive::inspect::open_archive;
use crate::compiler::{CompileError, DescriptorCompiler, MODULE_PATH_SEPARATOR};
use crate::module_info::{MODULE_INFO_CLASS, MODULE_INFO_SOURCE};
use crate::toolchain::JAVA_HOME;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::process::{ExitStatus, Output};
use zip::ZipWriter;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Bytes [`FakeCompiler`] writes as the compiled descriptor of `module`.
#[must_use]
pub fn fake_descriptor(module: &str) -> Vec<u8> {
    format!("module {module}").into_bytes()
}

/// Minimal class file body; only the magic number is meaningful.
const CLASS_BYTES: &[u8] = &[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x37];

#[derive(Debug, Clone)]
enum JarEntry {
    File { name: String, contents: Vec<u8> },
    Directory(String),
}

/// Builds JAR archives for tests.
///
/// # Examples
///
/// ```
/// use jarmod_modularizer::test_utils::JarBuilder;
///
/// let bytes = JarBuilder::new()
///     .directory("com/acme/")
///     .class("com/acme/Foo.class")
///     .to_bytes()?;
/// assert!(!bytes.is_empty());
/// # Ok::<(), zip::result::ZipError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct JarBuilder {
    entries: Vec<JarEntry>,
}

impl JarBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a compiled class entry.
    #[must_use]
    pub fn class(self, name: &str) -> Self {
        self.entry(name, CLASS_BYTES)
    }

    /// Adds a file entry with the given contents.
    #[must_use]
    pub fn entry(mut self, name: &str, contents: &[u8]) -> Self {
        self.entries.push(JarEntry::File {
            name: name.to_owned(),
            contents: contents.to_vec(),
        });
        self
    }

    /// Adds a directory entry; `name` should end with `/`.
    #[must_use]
    pub fn directory(mut self, name: &str) -> Self {
        self.entries.push(JarEntry::Directory(name.to_owned()));
        self
    }

    /// Adds a root `module-info.class` naming `module`.
    #[must_use]
    pub fn module_descriptor(self, module: &str) -> Self {
        self.entry(MODULE_INFO_CLASS, &fake_descriptor(module))
    }

    /// Returns the archive bytes.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the ZIP writer.
    pub fn to_bytes(&self) -> ZipResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for entry in &self.entries {
            match entry {
                JarEntry::File { name, contents } => {
                    writer.start_file(name.as_str(), options)?;
                    writer.write_all(contents)?;
                }
                JarEntry::Directory(name) => writer.add_directory(name.as_str(), options)?,
            }
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Writes the archive to `path`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while building or writing the archive.
    pub fn write_to(&self, path: &Utf8Path) -> ZipResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// A `javac` stand-in that writes the compiled descriptor when it would
/// compile and reports a diagnostic otherwise.
pub const ACCEPTING_JAVAC_SCRIPT: &str = r#"#!/bin/sh
# Invoked as: javac -d <dir> --module-path <path> <dir>/module-info.java
module=$(sed -n 's/^module \([^ ]*\) {$/\1/p' "$5")
printf 'module %s' "$module" > "$2/module-info.class"
"#;

/// A `javac` stand-in that always fails with a diagnostic.
pub const REJECTING_JAVAC_SCRIPT: &str = r#"#!/bin/sh
echo "$5:2: error: module not found: missing.module" >&2
exit 1
"#;

/// Creates a JDK home at `home` whose `bin/javac` runs `script`.
///
/// # Errors
///
/// Returns any I/O error raised while creating the files.
pub fn fake_jdk_home(home: &Utf8Path, script: &str) -> std::io::Result<Utf8PathBuf> {
    let bin = home.join("bin");
    std::fs::create_dir_all(&bin)?;
    let javac = bin.join(if cfg!(windows) { "javac.exe" } else { "javac" });
    std::fs::write(&javac, script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(&javac, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(home.to_owned())
}

/// Runs `f` with `JAVA_HOME` set to `home`, or unset when `home` is `None`.
pub fn with_java_home<R>(home: Option<&Utf8Path>, f: impl FnOnce() -> R) -> R {
    temp_env::with_var(JAVA_HOME, home.map(Utf8Path::as_str), f)
}

/// One invocation recorded by [`FakeCompiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCall {
    /// Module named in the declaration.
    pub module: String,
    /// Module path the compiler was given.
    pub module_path: String,
    /// Directory holding the declaration source.
    pub source_dir: Utf8PathBuf,
}

/// A [`DescriptorCompiler`] that checks a declaration the way `javac` would
/// without running one.
///
/// Every exported package must exist as a non-empty directory next to the
/// source. Every required module outside `java.*` and `jdk.*` must be
/// provided by an archive on the module path; archives are recognised by a
/// `module-info.class` written by [`fake_descriptor`]. On success the
/// descriptor is written next to the source.
#[derive(Debug, Default)]
pub struct FakeCompiler {
    calls: RefCell<Vec<CompileCall>>,
}

impl FakeCompiler {
    /// Creates a compiler with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded invocations in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CompileCall> {
        self.calls.borrow().clone()
    }

    /// Returns the modules compiled so far, in invocation order.
    #[must_use]
    pub fn compiled_modules(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|call| call.module.clone()).collect()
    }
}

struct Declaration {
    name: String,
    exports: Vec<String>,
    requires: Vec<String>,
}

fn parse_declaration(source: &str) -> Option<Declaration> {
    let mut lines = source.lines().map(str::trim).filter(|line| !line.is_empty());
    let name = lines
        .next()?
        .strip_prefix("module ")?
        .strip_suffix('{')?
        .trim()
        .to_owned();

    let mut declaration = Declaration {
        name,
        exports: Vec::new(),
        requires: Vec::new(),
    };
    for line in lines {
        let directive = line.strip_suffix(';');
        if let Some(package) = directive.and_then(|d| d.strip_prefix("exports ")) {
            declaration.exports.push(package.trim().to_owned());
        } else if let Some(module) = directive.and_then(|d| d.strip_prefix("requires ")) {
            declaration.requires.push(module.trim().to_owned());
        }
    }
    Some(declaration)
}

fn is_platform_module(module: &str) -> bool {
    module.starts_with("java.") || module.starts_with("jdk.")
}

fn has_entries(dir: &Utf8Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

fn archives_on_path(module_path: &str) -> Vec<Utf8PathBuf> {
    let mut archives = Vec::new();
    for entry in module_path.split(MODULE_PATH_SEPARATOR).map(Utf8Path::new) {
        if entry.is_file() {
            archives.push(entry.to_owned());
        } else if let Ok(listing) = entry.read_dir_utf8() {
            archives.extend(
                listing
                    .filter_map(Result::ok)
                    .map(|item| item.path().to_owned())
                    .filter(|path| path.extension() == Some("jar")),
            );
        }
    }
    archives
}

fn declared_module(archive: &Utf8Path) -> Option<String> {
    let mut zip = open_archive(archive).ok()?;
    let mut descriptor = String::new();
    zip.by_name(MODULE_INFO_CLASS)
        .ok()?
        .read_to_string(&mut descriptor)
        .ok()?;
    descriptor.strip_prefix("module ").map(str::to_owned)
}

fn modules_on_path(module_path: &str) -> HashSet<String> {
    archives_on_path(module_path)
        .iter()
        .filter_map(|archive| declared_module(archive))
        .collect()
}

impl DescriptorCompiler for FakeCompiler {
    fn compile(&self, source_dir: &Utf8Path, module_path: &str) -> Result<(), CompileError> {
        let source_path = source_dir.join(MODULE_INFO_SOURCE);
        let reject = |diagnostic: String| CompileError::Rejected {
            command: format!(
                "fake-javac -d {source_dir} --module-path {module_path} {source_path}"
            ),
            diagnostic,
        };

        let source = std::fs::read_to_string(&source_path)
            .map_err(|err| reject(format!("error: file not found: {source_path}: {err}")))?;
        let declaration = parse_declaration(&source)
            .ok_or_else(|| reject("error: malformed module declaration".to_owned()))?;
        self.calls.borrow_mut().push(CompileCall {
            module: declaration.name.clone(),
            module_path: module_path.to_owned(),
            source_dir: source_dir.to_owned(),
        });

        for package in &declaration.exports {
            if !has_entries(&source_dir.join(package.replace('.', "/"))) {
                return Err(reject(format!(
                    "error: package is empty or does not exist: {package}"
                )));
            }
        }

        let available = modules_on_path(module_path);
        if let Some(missing) = declaration
            .requires
            .iter()
            .find(|module| !is_platform_module(module) && !available.contains(*module))
        {
            return Err(reject(format!("error: module not found: {missing}")));
        }

        std::fs::write(
            source_dir.join(MODULE_INFO_CLASS),
            fake_descriptor(&declaration.name),
        )
        .map_err(|err| reject(format!("error: cannot write descriptor: {err}")))
    }
}
