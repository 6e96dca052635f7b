//! # Verso HTTP
//!
//! `http`/`tower` integration for `verso-core`: locating the requested
//! version, hiding operations outside their version range, versioned JSON
//! bodies and a changelog endpoint.
//!
//! Use `verso` instead of depending on this crate directly.

mod changelog;
mod error;
mod gate;
mod json;
mod layer;
pub mod strategy;

// Public API
pub use changelog::ChangelogService;
pub use error::{json_response, ApiError, Response, Result};
pub use gate::{GateLayer, GateService};
pub use json::{
    parse_versioned, read_versioned, requested_version, resource_json, versioned_json,
    versioned_json_with_status,
};
pub use layer::{resolve_version, RequestedVersion, UnknownVersionPolicy, VersionLayer, VersionService};
pub use strategy::{ExtractedVersion, VersionExtractor, VersionSource, VersionStrategy};
