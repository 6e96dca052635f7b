//! # Verso
//!
//! Serve several versions of one HTTP API from a single codebase.
//!
//! Handlers only ever see the newest (canonical) shape of every resource.
//! Verso gives each request a version, hides operations that do not exist at
//! that version, and rewrites payloads between the canonical shape and the
//! shape a client at that version expects.
//!
//! ## Quick Start
//!
//! ```rust
//! use verso::prelude::*;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Thing {
//!     name: String,
//!     #[serde(default)]
//!     number: i64,
//! }
//!
//! impl Resource for Thing {
//!     const NAME: &'static str = "Thing";
//!
//!     fn spec() -> ResourceSpec {
//!         ResourceSpec::new(Self::NAME)
//!             .transform(ApiVersion::new(2, 1, 0), AddField::new("number"))
//!     }
//! }
//!
//! let versioning = Versioning::builder()
//!     .config(VersioningConfig::new().version("2.0.0").version("2.1.0"))
//!     .resource_type::<Thing>()
//!     .container(
//!         Container::new("ThingViewSet")
//!             .introduced_in(ApiVersion::new(2, 0, 0))
//!             .operation(Operation::new("list")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let thing = Thing { name: "bar".into(), number: 4 };
//! let old = versioning.represent(&thing, Some(&ApiVersion::new(2, 0, 0))).unwrap();
//! assert_eq!(old, serde_json::json!({"name": "bar"}));
//! ```
//!
//! ## Optional Features
//!
//! - `http` (default) - tower layers, versioned JSON helpers, changelog endpoint
//! - `env` (default) - `VersioningConfig::from_env()` with `.env` file support

// Re-export core functionality
pub use verso_core::*;

#[cfg(feature = "http")]
pub use verso_http as http;
#[cfg(feature = "http")]
pub use verso_http::{
    parse_versioned, read_versioned, requested_version, resource_json, versioned_json,
    versioned_json_with_status, ApiError, ChangelogService, GateLayer, RequestedVersion,
    UnknownVersionPolicy, VersionExtractor, VersionLayer, VersionSource, VersionStrategy,
};

/// Install a `tracing` subscriber for verso's logs
///
/// Honors `RUST_LOG`; defaults to `info,verso=debug`. Does nothing if a global
/// subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,verso=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Prelude module - import everything you need with `use verso::prelude::*`
pub mod prelude {
    pub use verso_core::{
        // Versions
        ApiVersion,
        DefaultVersion,
        VersionRegistry,
        // Declarations
        Container,
        Operation,
        Resource,
        ResourceSpec,
        // Transforms
        AddField,
        FnTransform,
        JsonObject,
        RemoveField,
        Transform,
        // Startup
        VersionEntry,
        Versioning,
        VersioningConfig,
        VersioningError,
    };

    #[cfg(feature = "http")]
    pub use verso_http::{
        parse_versioned, resource_json, versioned_json, ApiError, ChangelogService, GateLayer,
        RequestedVersion, UnknownVersionPolicy, VersionLayer, VersionStrategy,
    };

    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}
