//! Whole-run orchestration.
//!
//! A run loads the descriptor, lists the candidate archives, orders the
//! declared artifacts so every required module is modularized before its
//! dependents, and then feeds each matching archive through the
//! [`ArtifactPipeline`] one at a time. Per-archive failures are counted and
//! reported; only setup problems abort the run.

use crate::compiler::DescriptorCompiler;
use crate::error::{ModularizerError, Result};
use crate::output::{error_line, modularized_line, write_stderr_line};
use crate::pipeline::ArtifactPipeline;
use camino::{Utf8Path, Utf8PathBuf};
use jarmod::{Artifact, ArtifactSet, load_descriptor, processing_order};
use log::{debug, info, warn};
use std::io::Write;

/// File extension of candidate archives.
pub const ARCHIVE_EXTENSION: &str = "jar";

/// Validated inputs of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Descriptor file declaring the artifacts.
    pub descriptor: Utf8PathBuf,
    /// Directory holding the archives to modularize.
    pub source_dir: Utf8PathBuf,
    /// Directory receiving the modular archives.
    pub destination: Utf8PathBuf,
    /// Extra module path appended after the destination when compiling.
    pub module_path: Option<String>,
    /// Only report failures while the run progresses.
    pub quiet: bool,
}

/// One archive to modularize.
#[derive(Debug, Clone, Copy)]
pub struct Job<'a> {
    /// Declared artifact.
    pub artifact: &'a Artifact,
    /// Archive in the source directory whose file name matches.
    pub archive: &'a Utf8Path,
}

/// Processing order of a run.
#[derive(Debug, Default)]
pub struct Schedule<'a> {
    /// Archives to modularize, in order.
    pub jobs: Vec<Job<'a>>,
    /// Declared artifacts with no archive in the source directory.
    pub skipped: Vec<&'a Artifact>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Archives modularized.
    pub modularized: usize,
    /// Archives that failed.
    pub errors: usize,
    /// Declared artifacts with no matching archive.
    pub skipped: usize,
}

impl RunSummary {
    /// Returns true when no archive failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// A run whose inputs have been loaded.
#[derive(Debug)]
pub struct RunPlan {
    config: RunConfig,
    artifacts: ArtifactSet,
    archives: Vec<Utf8PathBuf>,
}

impl RunPlan {
    /// Loads the descriptor and lists the archives of the source directory.
    ///
    /// # Errors
    ///
    /// Returns [`ModularizerError::Descriptor`] when the descriptor cannot
    /// be loaded, [`ModularizerError::SourceUnreadable`] when the source
    /// directory cannot be listed, and [`ModularizerError::NoArchives`]
    /// when it holds no `.jar` file.
    pub fn prepare(config: RunConfig) -> Result<Self> {
        let artifacts = load_descriptor(&config.descriptor)?;
        info!(
            "loaded {} artifact(s) from {}",
            artifacts.len(),
            config.descriptor
        );

        let archives = list_archives(&config.source_dir)?;
        if archives.is_empty() {
            return Err(ModularizerError::NoArchives {
                path: config.source_dir,
            });
        }
        debug!("found {} archive(s) in {}", archives.len(), config.source_dir);

        Ok(Self {
            config,
            artifacts,
            archives,
        })
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Returns the declared artifacts.
    #[must_use]
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Returns the candidate archives, sorted by file name.
    #[must_use]
    pub fn archives(&self) -> &[Utf8PathBuf] {
        &self.archives
    }

    /// Orders the declared artifacts and pairs each with its archive.
    ///
    /// # Errors
    ///
    /// Returns [`ModularizerError::Order`] when the declared requires form a
    /// cycle.
    pub fn schedule(&self) -> Result<Schedule<'_>> {
        let mut schedule = Schedule::default();
        for artifact in processing_order(&self.artifacts)? {
            match self.archive_named(artifact.name()) {
                Some(archive) => schedule.jobs.push(Job { artifact, archive }),
                None => {
                    info!("no archive named '{}'; skipping", artifact.name());
                    schedule.skipped.push(artifact);
                }
            }
        }
        Ok(schedule)
    }

    /// Runs the plan, compiling declarations with `compiler` and writing
    /// progress lines to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error when scheduling fails or the destination directory
    /// cannot be used. Failures of individual archives are counted in the
    /// returned summary instead.
    pub fn run(
        &self,
        compiler: &dyn DescriptorCompiler,
        out: &mut dyn Write,
    ) -> Result<RunSummary> {
        let schedule = self.schedule()?;
        prepare_destination(&self.config.destination)?;
        let pipeline = ArtifactPipeline::new(
            compiler,
            &self.config.destination,
            self.config.module_path.as_deref(),
        );
        Ok(execute(&schedule, &pipeline, self.config.quiet, out))
    }

    fn archive_named(&self, name: &str) -> Option<&Utf8Path> {
        self.archives
            .iter()
            .find(|archive| archive.file_name() == Some(name))
            .map(Utf8PathBuf::as_path)
    }
}

/// Feeds every scheduled archive through `pipeline` in order, writing a
/// progress line per archive to `out`. When `quiet` is set only failures are
/// written.
#[must_use]
pub fn execute(
    schedule: &Schedule<'_>,
    pipeline: &ArtifactPipeline<'_>,
    quiet: bool,
    out: &mut dyn Write,
) -> RunSummary {
    let mut summary = RunSummary {
        skipped: schedule.skipped.len(),
        ..RunSummary::default()
    };

    for job in &schedule.jobs {
        match pipeline.modularize(job.archive, job.artifact) {
            Ok(output) => {
                debug!("wrote {output}");
                if !quiet {
                    write_stderr_line(
                        out,
                        modularized_line(job.artifact.name(), job.artifact.module_name().as_str()),
                    );
                }
                summary.modularized += 1;
            }
            Err(err) => {
                write_stderr_line(out, error_line(&err));
                summary.errors += 1;
            }
        }
    }

    summary
}

/// Creates `destination` when missing.
///
/// # Errors
///
/// Returns [`ModularizerError::DestinationNotDirectory`] when the path
/// exists as something else, or
/// [`ModularizerError::DestinationUnavailable`] when it cannot be created.
pub fn prepare_destination(destination: &Utf8Path) -> Result<()> {
    if destination.exists() && !destination.is_dir() {
        return Err(ModularizerError::DestinationNotDirectory {
            path: destination.to_owned(),
        });
    }
    std::fs::create_dir_all(destination).map_err(|source| {
        ModularizerError::DestinationUnavailable {
            path: destination.to_owned(),
            source,
        }
    })
}

fn list_archives(source_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let unreadable = |source| ModularizerError::SourceUnreadable {
        path: source_dir.to_owned(),
        source,
    };

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(source_dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
            warn!("ignoring non UTF-8 file name in {source_dir}");
            continue;
        };
        if path.extension() == Some(ARCHIVE_EXTENSION) && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(archives)
}
