//! Operation gating as a tower layer
//!
//! A [`GateLayer`] wraps the service that implements one operation. Requests
//! whose version falls outside the operation's effective range get the same
//! `404` an unknown route gets, so clients cannot tell a gated operation from
//! a missing one.

use crate::error::{ApiError, Response};
use crate::layer::RequestedVersion;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Layer;
use tower_service::Service;
use verso_core::{ApiVersion, Gate, Versioning, VersioningError};

/// Layer that admits or hides one operation
#[derive(Debug, Clone)]
pub struct GateLayer {
    gate: Arc<Gate>,
    default: ApiVersion,
}

impl GateLayer {
    /// Gate for `container.operation`
    ///
    /// Fails if the operation was not declared when `versioning` was built,
    /// so a typo surfaces at startup rather than on the first request.
    pub fn new(
        versioning: &Versioning,
        container: &str,
        operation: &str,
    ) -> Result<Self, VersioningError> {
        Ok(Self {
            gate: Arc::new(versioning.gate(container, operation)?.clone()),
            default: versioning.registry().resolve_default()?.clone(),
        })
    }

    /// The precomputed gate
    pub fn gate(&self) -> &Gate {
        &self.gate
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            gate: self.gate.clone(),
            default: self.default.clone(),
        }
    }
}

/// Service produced by [`GateLayer`]
#[derive(Debug, Clone)]
pub struct GateService<S> {
    inner: S,
    gate: Arc<Gate>,
    default: ApiVersion,
}

impl<S, B> Service<http::Request<B>> for GateService<S>
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

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        // Without a VersionLayer in front, the default version applies.
        let version = RequestedVersion::from_request(&req)
            .map(RequestedVersion::version)
            .unwrap_or(&self.default);

        if self.gate.admits(version) {
            return Box::pin(self.inner.call(req));
        }

        let response = ApiError::no_route(req.method(), req.uri().path()).into_response();
        Box::pin(async move { Ok::<_, S::Error>(response) })
    }
}
