//! # Verso Core
//!
//! Framework-agnostic building blocks for serving several versions of an API
//! from one codebase: a registry of known versions, range gating for
//! operations, and reversible per-version payload transforms.
//!
//! This crate has no HTTP dependency. Use `verso` for the full stack.

pub mod changelog;
mod chain;
pub mod config;
mod error;
mod gate;
pub mod range;
mod registry;
mod transform;
mod version;
mod versioning;

// Public API
pub use chain::{BoundTransform, NestedField, Resource, ResourceSpec, TransformChain, TransformChains};
pub use changelog::{Changelog, VersionReport, ViewChanges};
pub use config::{VersionEntry, VersioningConfig};
pub use error::{Result, VersioningError};
pub use gate::{Container, Gate, GateEvaluator, Operation};
pub use range::{EffectiveRange, UpperBound, VersionRange};
pub use registry::{DefaultVersion, VersionRegistry};
pub use transform::{AddField, FnTransform, JsonObject, RemoveField, Transform};
pub use version::ApiVersion;
pub use versioning::{Versioning, VersioningBuilder};
