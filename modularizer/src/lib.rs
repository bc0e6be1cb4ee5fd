//! JAR modularizer library.
//!
//! This crate retrofits legacy JAR files with module descriptors. It is used
//! by the `jarmod` CLI binary and can be driven programmatically, for
//! example with a custom [`compiler::DescriptorCompiler`].
//!
//! # Modules
//!
//! - [`archive`] - Archive inspection, extraction, and patching
//! - [`cli`] - Command-line argument definitions and validation
//! - [`compiler`] - Module declaration compilation through `javac`
//! - [`error`] - Run-level and per-archive error types
//! - [`logging`] - `tracing-subscriber` setup for diagnostics on stderr
//! - [`module_info`] - `module-info.java` generation
//! - [`output`] - Progress lines and the final report
//! - [`pipeline`] - Per-archive modularization steps
//! - [`run`] - Whole-run planning and execution
//! - [`toolchain`] - JDK location and validation

pub mod archive;
pub mod cli;
pub mod compiler;
pub mod error;
pub mod logging;
pub mod module_info;
pub mod output;
pub mod pipeline;
pub mod run;
pub mod toolchain;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
