//! JDK location and validation.
//!
//! A directory is a usable JDK home when `bin/javac` (`bin\javac.exe` on
//! Windows) exists, is a regular file and, on Unix, carries an execute bit.
//! An explicit `--jdk-home` that fails this check is reported as a warning
//! and the `JAVA_HOME` default is used instead.

use crate::error::{ModularizerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::path::PathBuf;

/// Environment variable naming the default JDK home.
pub const JAVA_HOME: &str = "JAVA_HOME";

#[cfg(windows)]
const JAVAC: &str = "javac.exe";
#[cfg(not(windows))]
const JAVAC: &str = "javac";

/// A validated JDK installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jdk {
    home: Utf8PathBuf,
    javac: Utf8PathBuf,
}

impl Jdk {
    /// Returns the JDK rooted at `home` when it holds an executable `javac`.
    #[must_use]
    pub fn at(home: &Utf8Path) -> Option<Self> {
        let javac = javac_path(home);
        is_executable_file(&javac).then(|| Self {
            home: home.to_owned(),
            javac,
        })
    }

    /// Chooses the JDK for a run.
    ///
    /// `explicit` wins when it is a valid JDK home. Otherwise the run falls
    /// back to `java_home`, logging a warning if `explicit` was rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use jarmod_modularizer::toolchain::Jdk;
    ///
    /// let err = Jdk::resolve(Some(Utf8Path::new("/nonexistent/jdk")), None)
    ///     .expect_err("neither home is usable");
    /// assert!(err.to_string().contains("JAVA_HOME"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ModularizerError::ToolchainUnavailable`] when the fallback
    /// is unset or is not a valid JDK home.
    pub fn resolve(explicit: Option<&Utf8Path>, java_home: Option<&Utf8Path>) -> Result<Self> {
        if let Some(home) = explicit {
            if let Some(jdk) = Self::at(home) {
                return Ok(jdk);
            }
            warn!("invalid JDK home '{home}'; the {JAVA_HOME} default will be used");
        }

        let Some(home) = java_home else {
            return Err(ModularizerError::ToolchainUnavailable {
                reason: format!("{JAVA_HOME} environment variable is not defined"),
            });
        };
        let jdk = Self::at(home).ok_or_else(|| ModularizerError::ToolchainUnavailable {
            reason: format!(
                "{JAVA_HOME} '{home}' does not contain an executable bin/{JAVAC}"
            ),
        })?;
        debug!("using JDK from {JAVA_HOME}: {home}");
        Ok(jdk)
    }

    /// Chooses the JDK for a run using the `JAVA_HOME` environment variable
    /// as the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ModularizerError::NonUtf8Path`] when `JAVA_HOME` is not
    /// UTF-8, plus any error from [`Jdk::resolve`].
    pub fn from_env(explicit: Option<&Utf8Path>) -> Result<Self> {
        let java_home = match std::env::var_os(JAVA_HOME) {
            Some(value) if !value.is_empty() => Some(
                Utf8PathBuf::from_path_buf(PathBuf::from(value)).map_err(|path| {
                    ModularizerError::NonUtf8Path {
                        path: path.display().to_string(),
                    }
                })?,
            ),
            _ => None,
        };
        Self::resolve(explicit, java_home.as_deref())
    }

    /// Returns the JDK home directory.
    #[must_use]
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    /// Returns the path of the `javac` executable.
    #[must_use]
    pub fn javac(&self) -> &Utf8Path {
        &self.javac
    }
}

/// Returns true when `home` looks like a usable JDK home.
#[must_use]
pub fn is_valid_jdk_home(home: &Utf8Path) -> bool {
    Jdk::at(home).is_some()
}

fn javac_path(home: &Utf8Path) -> Utf8PathBuf {
    home.join("bin").join(JAVAC)
}

#[cfg(unix)]
fn is_executable_file(path: &Utf8Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Utf8Path) -> bool {
    path.is_file()
}
