//! User-facing output for the modularizer CLI.
//!
//! Progress and the final report go to stderr as plain lines. Diagnostics
//! that only matter when troubleshooting go through the `log` facade
//! instead.

use crate::run::RunSummary;
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

/// Horizontal rule framing the banner and the final report.
pub const RULE: &str = "--------------------------------------------------------------------";

/// Writes `message` followed by a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Writes the banner printed before any work starts.
pub fn write_banner(stderr: &mut dyn Write) {
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, "Starting modularization process...");
    write_stderr_line(stderr, RULE);
    write_stderr_line(stderr, "");
}

/// Progress line for an archive that was modularized.
#[must_use]
pub fn modularized_line(archive: &str, module: &str) -> String {
    format!("[INFO] '{archive}' modularized to module '{module}'")
}

/// Progress line for any error shown to the user.
#[must_use]
pub fn error_line(error: impl Display) -> String {
    format!("[ERROR] {error}")
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every scheduled archive was modularized.
    Success,
    /// The run completed but some archives failed.
    PartialFailure,
    /// The run was aborted.
    Fatal,
}

impl Outcome {
    /// Classifies a run summary.
    #[must_use]
    pub fn of(summary: &RunSummary) -> Self {
        if summary.is_success() {
            Self::Success
        } else {
            Self::PartialFailure
        }
    }

    /// Returns the closing status message.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "SUCCESSFUL!!",
            Self::PartialFailure => {
                "Process finished with some non-fatal errors. Some JAR files may have been modularized."
            }
            Self::Fatal => "Process finished with ERROR",
        }
    }
}

/// Writes the closing report: status, modularized count with the elapsed
/// time, and error count.
///
/// # Example
///
/// ```
/// use jarmod_modularizer::output::{Outcome, write_report};
/// use jarmod_modularizer::run::RunSummary;
/// use std::time::Duration;
///
/// let summary = RunSummary { modularized: 2, errors: 0, skipped: 0 };
/// let mut out = Vec::new();
/// write_report(&mut out, Outcome::Success, &summary, Duration::from_millis(1_250));
///
/// let text = String::from_utf8(out).expect("report is UTF-8");
/// assert!(text.contains("SUCCESSFUL!!"));
/// assert!(text.contains("2 JARs modularized in 1.250s"));
/// ```
pub fn write_report(
    stderr: &mut dyn Write,
    outcome: Outcome,
    summary: &RunSummary,
    elapsed: Duration,
) {
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, RULE);
    write_stderr_line(stderr, format!("  {}", outcome.message()));
    write_stderr_line(stderr, "");
    write_stderr_line(
        stderr,
        format!(
            "  {} modularized in {}",
            plural(summary.modularized, "JAR", "JARs"),
            format_duration(elapsed)
        ),
    );
    if summary.skipped > 0 {
        write_stderr_line(
            stderr,
            format!(
                "  {} without a matching JAR file",
                plural(summary.skipped, "artifact", "artifacts")
            ),
        );
    }
    write_stderr_line(
        stderr,
        format!("  {} found", plural(summary.errors, "error", "errors")),
    );
    write_stderr_line(stderr, "");
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

/// Formats `elapsed` as `[Hh ][Mm ]S.mmms`.
///
/// # Example
///
/// ```
/// use jarmod_modularizer::output::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(3_723_004)), "1h 2m 3.004s");
/// assert_eq!(format_duration(Duration::from_millis(59_999)), "59.999s");
/// ```
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = elapsed.subsec_millis();

    let mut text = String::new();
    if hours > 0 {
        text.push_str(&format!("{hours}h "));
    }
    if hours > 0 || minutes > 0 {
        text.push_str(&format!("{minutes}m "));
    }
    text.push_str(&format!("{seconds}.{millis:03}s"));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn report(outcome: Outcome, summary: RunSummary) -> String {
        let mut out = Vec::new();
        write_report(&mut out, outcome, &summary, Duration::from_secs(61));
        String::from_utf8(out).expect("report should be UTF-8")
    }

    #[rstest]
    #[case::sub_second(Duration::from_millis(7), "0.007s")]
    #[case::seconds(Duration::from_millis(12_345), "12.345s")]
    #[case::minutes(Duration::from_millis(61_500), "1m 1.500s")]
    #[case::hours_without_minutes(Duration::from_secs(7_205), "2h 0m 5.000s")]
    fn durations_are_formatted(#[case] elapsed: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(elapsed), expected);
    }

    #[rstest]
    #[case::clean(RunSummary { modularized: 2, errors: 0, skipped: 0 }, Outcome::Success)]
    #[case::with_skips(RunSummary { modularized: 1, errors: 0, skipped: 3 }, Outcome::Success)]
    #[case::with_errors(
        RunSummary { modularized: 1, errors: 1, skipped: 0 },
        Outcome::PartialFailure
    )]
    fn outcome_follows_error_count(#[case] summary: RunSummary, #[case] expected: Outcome) {
        assert_eq!(Outcome::of(&summary), expected);
    }

    #[test]
    fn report_lists_counts() {
        let text = report(
            Outcome::PartialFailure,
            RunSummary {
                modularized: 1,
                errors: 2,
                skipped: 1,
            },
        );
        assert!(text.contains("non-fatal errors"));
        assert!(text.contains("  1 JAR modularized in 1m 1.000s"));
        assert!(text.contains("  1 artifact without a matching JAR file"));
        assert!(text.contains("  2 errors found"));
    }

    #[test]
    fn report_omits_skip_line_when_nothing_skipped() {
        let text = report(Outcome::Fatal, RunSummary::default());
        assert!(text.contains("Process finished with ERROR"));
        assert!(!text.contains("without a matching"));
        assert!(text.contains("  0 errors found"));
    }

    #[test]
    fn progress_lines_are_tagged() {
        assert_eq!(
            modularized_line("core.jar", "core"),
            "[INFO] 'core.jar' modularized to module 'core'"
        );
        assert_eq!(error_line("boom"), "[ERROR] boom");
    }
}
