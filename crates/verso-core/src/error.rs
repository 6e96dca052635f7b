//! Error types for verso

use thiserror::Error;

/// Result type alias for versioning operations
pub type Result<T, E = VersioningError> = std::result::Result<T, E>;

/// Errors raised while declaring or using versioned surfaces.
///
/// Two families live here. Client errors (`InvalidVersionFormat`,
/// `VersionNotFound`) can originate from request input and are translated into
/// a client-facing status by the dispatch layer. Everything else is a
/// configuration error and is only ever produced while the [`Versioning`]
/// instance is being built, before any traffic is served.
///
/// [`Versioning`]: crate::Versioning
#[derive(Debug, Error)]
pub enum VersioningError {
    /// The string is not a dotted sequence of non-negative integers.
    #[error("invalid version format: {0:?}")]
    InvalidVersionFormat(String),

    /// The string is a well-formed version but no registered version matches it.
    #[error("version not found: {0}")]
    VersionNotFound(String),

    /// The registry has no versions at all.
    #[error("version registry is empty")]
    EmptyRegistry,

    /// Two configured versions share the same numeric sequence.
    #[error("duplicate version in registry: {0}")]
    DuplicateVersion(String),

    /// Neither an operation nor its container declares a version bound.
    #[error("you need to declare either introduced_in or removed_in for {operation}")]
    NoVersionBoundsDeclared {
        /// `Container.operation` that was left unversioned
        operation: String,
    },

    /// A resource type declares no transforms and did not opt out.
    #[error("{0} has not declared transforms")]
    TransformsNotDeclared(String),

    /// No resource type is registered under this name.
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    /// No operation is registered under this container/name pair.
    #[error("unknown operation: {container}.{operation}")]
    UnknownOperation {
        /// Container name
        container: String,
        /// Operation name
        operation: String,
    },

    /// A resource or container name was declared twice.
    #[error("duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A payload could not be converted to or from JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VersioningError {
    /// Whether this error can be caused by request input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidVersionFormat(_) | Self::VersionNotFound(_) | Self::Json(_)
        )
    }

    /// Whether this error signals a startup misconfiguration.
    pub fn is_configuration_error(&self) -> bool {
        !self.is_client_error()
    }
}
