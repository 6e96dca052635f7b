//! Version-resolving tower layer
//!
//! [`VersionLayer`] runs before routing. It locates the version in the
//! request, parses it, resolves it against the registry and stores the result
//! as a [`RequestedVersion`] extension for the gate, the JSON helpers and the
//! handlers downstream.
//!
//! ```rust,ignore
//! let service = tower::ServiceBuilder::new()
//!     .layer(VersionLayer::new(versioning.clone()).strategy(VersionStrategy::path()))
//!     .service(router);
//! ```

use crate::error::{ApiError, Response};
use crate::strategy::{VersionExtractor, VersionSource, VersionStrategy};
use http::{HeaderMap, Uri};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Layer;
use tower_service::Service;
use verso_core::{ApiVersion, Versioning, VersioningError};

/// What to do with a well-formed version that is not registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownVersionPolicy {
    /// Serve it; range checks and transform chains compare it numerically
    ///
    /// A version above the latest registered one gets the newest payload
    /// shape, but every gated operation treats it as out of range: without a
    /// declared `removed_in` the upper bound is the latest version, inclusive.
    #[default]
    Permissive,
    /// Reject it with `406 unsupported_version`
    Strict,
}

/// The version a request is served at
///
/// Inserted into the request extensions by [`VersionService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedVersion {
    version: ApiVersion,
    source: VersionSource,
    registered: bool,
}

impl RequestedVersion {
    /// The resolved version
    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    /// Where the version came from
    pub fn source(&self) -> VersionSource {
        self.source
    }

    /// Whether the version is in the registry
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Read the version stored in a request's extensions
    pub fn from_request<B>(req: &http::Request<B>) -> Option<&Self> {
        req.extensions().get::<Self>()
    }
}

/// Resolve the version a request asks for
///
/// - No version in the request: the registry's default policy.
/// - Malformed version: `400 invalid_version`.
/// - Well-formed but unregistered: served as-is under
///   [`UnknownVersionPolicy::Permissive`], `406 unsupported_version` under
///   [`UnknownVersionPolicy::Strict`].
pub fn resolve_version(
    versioning: &Versioning,
    extractor: &VersionExtractor,
    policy: UnknownVersionPolicy,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<RequestedVersion, ApiError> {
    let registry = versioning.registry();

    let Some(extracted) = extractor.extract(uri, headers) else {
        let version = registry.resolve_default()?.clone();
        return Ok(RequestedVersion {
            version,
            source: VersionSource::Default,
            registered: true,
        });
    };

    let parsed = ApiVersion::parse(&extracted.raw).map_err(|e| {
        tracing::warn!(raw = %extracted.raw, source = ?extracted.source, "malformed request version");
        ApiError::from(e)
    })?;

    if let Some(known) = registry.resolve(&parsed) {
        return Ok(RequestedVersion {
            version: known.clone(),
            source: extracted.source,
            registered: true,
        });
    }

    match policy {
        UnknownVersionPolicy::Permissive => {
            tracing::debug!(version = %parsed, "serving unregistered version");
            Ok(RequestedVersion {
                version: parsed,
                source: extracted.source,
                registered: false,
            })
        }
        UnknownVersionPolicy::Strict => {
            tracing::warn!(version = %parsed, "rejecting unregistered version");
            Err(VersioningError::VersionNotFound(parsed.to_string()).into())
        }
    }
}

/// Layer that resolves the request version
#[derive(Debug, Clone)]
pub struct VersionLayer {
    versioning: Arc<Versioning>,
    extractor: Arc<VersionExtractor>,
    policy: UnknownVersionPolicy,
}

impl VersionLayer {
    /// Create a layer with the default extractor (header, then Accept)
    pub fn new(versioning: Arc<Versioning>) -> Self {
        Self {
            versioning,
            extractor: Arc::new(VersionExtractor::default()),
            policy: UnknownVersionPolicy::default(),
        }
    }

    /// Use a single strategy
    pub fn strategy(self, strategy: VersionStrategy) -> Self {
        self.extractor(VersionExtractor::with_strategy(strategy))
    }

    /// Use a custom extractor
    pub fn extractor(mut self, extractor: VersionExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Set the unknown-version policy
    pub fn policy(mut self, policy: UnknownVersionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<S> Layer<S> for VersionLayer {
    type Service = VersionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        VersionService {
            inner,
            versioning: self.versioning.clone(),
            extractor: self.extractor.clone(),
            policy: self.policy,
        }
    }
}

/// Service produced by [`VersionLayer`]
#[derive(Debug, Clone)]
pub struct VersionService<S> {
    inner: S,
    versioning: Arc<Versioning>,
    extractor: Arc<VersionExtractor>,
    policy: UnknownVersionPolicy,
}

impl<S, B> Service<http::Request<B>> for VersionService<S>
where
    S: Service<http::Request<B>, Response = Response>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        let resolved = resolve_version(
            &self.versioning,
            &self.extractor,
            self.policy,
            req.uri(),
            req.headers(),
        );

        match resolved {
            Ok(requested) => {
                tracing::debug!(
                    version = %requested.version,
                    source = ?requested.source,
                    "request version resolved"
                );
                req.extensions_mut().insert(requested);
                Box::pin(self.inner.call(req))
            }
            Err(err) => {
                let response = err.into_response();
                Box::pin(async move { Ok::<_, S::Error>(response) })
            }
        }
    }
}
