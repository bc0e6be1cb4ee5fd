//! Compilation of module declarations.
//!
//! [`DescriptorCompiler`] is the seam between the pipeline and the JDK: it
//! turns the `module-info.java` in a directory into `module-info.class` next
//! to it. [`Javac`] is the production implementation and shells out through a
//! [`CommandExecutor`] so it can be exercised without a JDK.

use crate::module_info::MODULE_INFO_SOURCE;
use crate::toolchain::Jdk;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::process::{Command, Output};
use thiserror::Error;

/// Separator between entries of a module path on this platform.
#[cfg(windows)]
pub const MODULE_PATH_SEPARATOR: char = ';';
/// Separator between entries of a module path on this platform.
#[cfg(not(windows))]
pub const MODULE_PATH_SEPARATOR: char = ':';

/// Errors raised while compiling a module declaration.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler ran and rejected the declaration.
    #[error("compilation failed\nCommand: {command}\n{diagnostic}")]
    Rejected {
        /// Full command line that was run.
        command: String,
        /// Compiler diagnostic output.
        diagnostic: String,
    },

    /// The compiler could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Compiler executable.
        program: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Compiles the `module-info.java` found in a directory.
pub trait DescriptorCompiler {
    /// Compiles `source_dir/module-info.java` into
    /// `source_dir/module-info.class`, resolving required modules against
    /// `module_path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Rejected`] with the compiler diagnostic when
    /// compilation fails, or [`CompileError::Spawn`] when the compiler cannot
    /// be started.
    fn compile(&self, source_dir: &Utf8Path, module_path: &str) -> Result<(), CompileError>;
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `program` with `args` and returns its captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while spawning the process.
    fn run(&self, program: &Utf8Path, args: &[String]) -> std::io::Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &Utf8Path, args: &[String]) -> std::io::Result<Output> {
        Command::new(program).args(args).output()
    }
}

/// Compiles module declarations with the JDK's `javac`.
///
/// The call blocks until `javac` exits.
#[derive(Debug, Clone)]
pub struct Javac<E = SystemCommandExecutor> {
    program: Utf8PathBuf,
    executor: E,
}

impl Javac {
    /// Creates a compiler that runs the `javac` of `jdk`.
    #[must_use]
    pub fn new(jdk: &Jdk) -> Self {
        Self::with_executor(jdk.javac(), SystemCommandExecutor)
    }
}

impl<E: CommandExecutor> Javac<E> {
    /// Creates a compiler that runs `program` through `executor`.
    #[must_use]
    pub fn with_executor(program: &Utf8Path, executor: E) -> Self {
        Self {
            program: program.to_owned(),
            executor,
        }
    }

    fn arguments(source_dir: &Utf8Path, module_path: &str) -> Vec<String> {
        vec![
            "-d".to_owned(),
            source_dir.to_string(),
            "--module-path".to_owned(),
            module_path.to_owned(),
            source_dir.join(MODULE_INFO_SOURCE).into_string(),
        ]
    }

    fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<E: CommandExecutor> DescriptorCompiler for Javac<E> {
    fn compile(&self, source_dir: &Utf8Path, module_path: &str) -> Result<(), CompileError> {
        let args = Self::arguments(source_dir, module_path);
        let command = self.command_line(&args);
        debug!("running {command}");

        let output = self
            .executor
            .run(&self.program, &args)
            .map_err(|source| CompileError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CompileError::Rejected {
                command,
                diagnostic: diagnostic(&output),
            })
        }
    }
}

/// Builds the module path handed to the compiler: the destination directory,
/// followed by the user-supplied path when there is one.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use jarmod_modularizer::compiler::{MODULE_PATH_SEPARATOR, module_search_path};
///
/// let path = module_search_path(Utf8Path::new("mods"), Some("libs"));
/// assert_eq!(path, format!("mods{MODULE_PATH_SEPARATOR}libs"));
/// assert_eq!(module_search_path(Utf8Path::new("mods"), None), "mods");
/// ```
#[must_use]
pub fn module_search_path(destination: &Utf8Path, extra: Option<&str>) -> String {
    match extra.filter(|path| !path.is_empty()) {
        Some(extra) => format!("{destination}{MODULE_PATH_SEPARATOR}{extra}"),
        None => destination.to_string(),
    }
}

fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_owned();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_owned();
    }
    "unknown error".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure_output, success_output};
    use mockall::predicate::{always, eq, function};
    use rstest::rstest;

    const JAVAC: &str = "/opt/jdk/bin/javac";

    fn expected_args() -> Vec<String> {
        vec![
            "-d".to_owned(),
            "/tmp/scratch".to_owned(),
            "--module-path".to_owned(),
            "/out/mods".to_owned(),
            "/tmp/scratch/module-info.java".to_owned(),
        ]
    }

    #[test]
    fn passes_output_dir_module_path_and_source() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .with(
                eq(Utf8Path::new(JAVAC)),
                function(|args: &[String]| args == expected_args().as_slice()),
            )
            .times(1)
            .returning(|_, _| Ok(success_output()));

        let javac = Javac::with_executor(Utf8Path::new(JAVAC), executor);
        javac
            .compile(Utf8Path::new("/tmp/scratch"), "/out/mods")
            .expect("compilation should succeed");
    }

    #[test]
    fn rejection_carries_command_and_diagnostic() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .with(always(), always())
            .returning(|_, _| Ok(failure_output("  error: module not found: b\n")));

        let javac = Javac::with_executor(Utf8Path::new(JAVAC), executor);
        let err = javac
            .compile(Utf8Path::new("/tmp/scratch"), "/out/mods")
            .expect_err("compilation should fail");

        let CompileError::Rejected {
            command,
            diagnostic,
        } = &err
        else {
            panic!("expected a rejection, got {err:?}");
        };
        assert_eq!(
            command,
            "/opt/jdk/bin/javac -d /tmp/scratch --module-path /out/mods /tmp/scratch/module-info.java"
        );
        assert_eq!(diagnostic, "error: module not found: b");
        assert!(err.to_string().contains("Command: /opt/jdk/bin/javac"));
    }

    #[test]
    fn spawn_failure_names_the_program() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .returning(|_, _| Err(std::io::Error::from(std::io::ErrorKind::NotFound)));

        let javac = Javac::with_executor(Utf8Path::new(JAVAC), executor);
        let err = javac
            .compile(Utf8Path::new("/tmp/scratch"), "/out/mods")
            .expect_err("spawn should fail");
        assert!(matches!(err, CompileError::Spawn { ref program, .. } if program == JAVAC));
    }

    #[rstest]
    #[case::stderr_preferred(b"", b"boom\n", "boom")]
    #[case::stdout_fallback(b"from stdout", b"  ", "from stdout")]
    #[case::silent(b"", b"", "unknown error")]
    fn diagnostic_picks_first_non_empty_stream(
        #[case] stdout: &[u8],
        #[case] stderr: &[u8],
        #[case] expected: &str,
    ) {
        let output = Output {
            stdout: stdout.to_vec(),
            stderr: stderr.to_vec(),
            ..failure_output("")
        };
        assert_eq!(diagnostic(&output), expected);
    }

    #[rstest]
    #[case::destination_only(None, "mods")]
    #[case::empty_extra(Some(""), "mods")]
    #[case::with_extra(Some("libs"), "mods{sep}libs")]
    fn search_path_joins_with_platform_separator(
        #[case] extra: Option<&str>,
        #[case] expected: &str,
    ) {
        let expected = expected.replace("{sep}", &MODULE_PATH_SEPARATOR.to_string());
        assert_eq!(module_search_path(Utf8Path::new("mods"), extra), expected);
    }
}
