//! Declarative model for retrofitting Java archives with module descriptors.
//!
//! A modularization descriptor lists archives and the module each should
//! become. [`descriptor`] loads that list into an [`ArtifactSet`], and
//! [`order`] arranges it so every module is processed after the declared
//! modules it requires.

pub mod descriptor;
pub mod entity;
pub mod order;

pub use descriptor::{DescriptorError, load_descriptor, parse_descriptor};
pub use entity::{Artifact, ArtifactSet, Module, ModuleName};
pub use order::{OrderError, processing_order};
