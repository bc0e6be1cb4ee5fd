//! CLI argument definitions for `jarmod`.
//!
//! Parsing lives here so the binary only orchestrates. [`Cli::validate`]
//! performs the filesystem checks that must pass before a run starts.

use crate::error::{ModularizerError, Result};
use crate::run::RunConfig;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

/// Default destination, relative to the source directory.
pub const DEFAULT_DESTINATION: &str = "mods";

/// Retrofit legacy JAR files with module descriptors.
#[derive(Parser, Debug, Clone)]
#[command(name = "jarmod")]
#[command(version, about)]
#[command(long_about = concat!(
    "Retrofit legacy JAR files with module descriptors.\n\n",
    "Every artifact declared in DESCRIPTOR is matched by file name against the ",
    "JAR files in SOURCE. For each match a module-info.java is generated from the ",
    "declaration, compiled with the JDK's javac, and appended to a copy of the JAR ",
    "written to the destination directory. Artifacts are processed so that every ",
    "required module is modularized before the modules that require it.",
))]
#[command(after_help = concat!(
    "DESCRIPTOR FORMAT:\n",
    "  [\n",
    "    {\"name\": \"core.jar\", \"module\": {\"name\": \"core\"}},\n",
    "    {\"name\": \"app.jar\", \"module\": {\n",
    "      \"name\": \"app\",\n",
    "      \"exportsPackages\": [\"com.app\"],\n",
    "      \"requiresModules\": [\"core\", \"java.sql\"]\n",
    "    }}\n",
    "  ]\n\n",
    "EXIT STATUS:\n",
    "  0  every matching JAR was modularized\n",
    "  1  the run could not start or was aborted\n",
    "  2  the run completed but some JARs failed\n\n",
    "EXAMPLES:\n",
    "  Modularize into lib/mods using $JAVA_HOME:\n",
    "    $ jarmod modules.json lib\n\n",
    "  Resolve external modules from a second directory:\n",
    "    $ jarmod modules.json lib --dest out --module-path /opt/modules",
))]
pub struct Cli {
    /// JSON file declaring the artifacts and their modules.
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: Utf8PathBuf,

    /// Directory containing the JAR files to modularize.
    #[arg(value_name = "SOURCE")]
    pub source: Utf8PathBuf,

    /// Destination directory for modular JARs [default: SOURCE/mods].
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<Utf8PathBuf>,

    /// Extra directories and/or files containing required modules.
    #[arg(long, value_name = "PATH")]
    pub module_path: Option<String>,

    /// JDK installation to use instead of $JAVA_HOME.
    #[arg(long, value_name = "DIR")]
    pub jdk_home: Option<Utf8PathBuf>,

    /// Increase diagnostic output (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors and the final report still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Returns the destination directory, defaulting to `SOURCE/mods`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use jarmod_modularizer::cli::Cli;
    ///
    /// let cli = Cli::parse_from(["jarmod", "modules.json", "lib"]);
    /// assert_eq!(cli.destination(), "lib/mods");
    /// ```
    #[must_use]
    pub fn destination(&self) -> Utf8PathBuf {
        self.dest
            .clone()
            .unwrap_or_else(|| self.source.join(DEFAULT_DESTINATION))
    }

    /// Checks the paths given on the command line and builds the run
    /// configuration.
    ///
    /// The destination may be missing; it is created when the run starts.
    ///
    /// # Errors
    ///
    /// Returns the matching [`ModularizerError`] when the descriptor is not
    /// an existing file, the source is not an existing directory, or the
    /// destination exists but is not a directory.
    pub fn validate(&self) -> Result<RunConfig> {
        check_descriptor(&self.descriptor)?;
        check_source(&self.source)?;

        let destination = self.destination();
        if destination.exists() && !destination.is_dir() {
            return Err(ModularizerError::DestinationNotDirectory { path: destination });
        }

        Ok(RunConfig {
            descriptor: self.descriptor.clone(),
            source_dir: self.source.clone(),
            destination,
            module_path: self.module_path.clone(),
            quiet: self.quiet,
        })
    }
}

fn check_descriptor(path: &Utf8Path) -> Result<()> {
    if !path.exists() {
        return Err(ModularizerError::DescriptorMissing {
            path: path.to_owned(),
        });
    }
    if !path.is_file() {
        return Err(ModularizerError::DescriptorNotFile {
            path: path.to_owned(),
        });
    }
    Ok(())
}

fn check_source(path: &Utf8Path) -> Result<()> {
    if !path.exists() {
        return Err(ModularizerError::SourceMissing {
            path: path.to_owned(),
        });
    }
    if !path.is_dir() {
        return Err(ModularizerError::SourceNotDirectory {
            path: path.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
