//! Versioned JSON bodies
//!
//! Handlers work with canonical (latest) shapes only. These helpers demote
//! outgoing payloads to the requested version and promote incoming ones to
//! the canonical shape before deserialization.

use crate::error::{json_response, ApiError, Response};
use crate::layer::RequestedVersion;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use serde::Serialize;
use verso_core::{ApiVersion, Resource, Versioning};

/// The version stored by [`VersionLayer`](crate::VersionLayer), if any
pub fn requested_version<B>(req: &http::Request<B>) -> Option<&ApiVersion> {
    RequestedVersion::from_request(req).map(RequestedVersion::version)
}

/// Serialize `value`, demote it for `version` and wrap it in a `200 OK`
///
/// `value` may be a single resource or a sequence of them.
pub fn versioned_json<T: Serialize + ?Sized>(
    versioning: &Versioning,
    resource: &str,
    value: &T,
    version: Option<&ApiVersion>,
) -> Result<Response, ApiError> {
    versioned_json_with_status(versioning, resource, value, version, StatusCode::OK)
}

/// [`versioned_json`] with an explicit status code
pub fn versioned_json_with_status<T: Serialize + ?Sized>(
    versioning: &Versioning,
    resource: &str,
    value: &T,
    version: Option<&ApiVersion>,
    status: StatusCode,
) -> Result<Response, ApiError> {
    let canonical = serde_json::to_value(value).map_err(|e| {
        ApiError::internal("Failed to serialize response").with_internal(e.to_string())
    })?;
    let external = versioning.to_external(resource, canonical, version)?;
    json_response(status, &external)
}

/// [`versioned_json`] for a type that declares its resource name
pub fn resource_json<R: Resource + Serialize>(
    versioning: &Versioning,
    value: &R,
    version: Option<&ApiVersion>,
) -> Result<Response, ApiError> {
    versioned_json(versioning, R::NAME, value, version)
}

/// Promote a JSON body sent at `version` and deserialize it
///
/// Fields the client could not know about at `version` are absent after
/// promotion, so serde defaults on `T` apply.
pub fn parse_versioned<T: DeserializeOwned>(
    versioning: &Versioning,
    resource: &str,
    body: &[u8],
    version: Option<&ApiVersion>,
) -> Result<T, ApiError> {
    let external: serde_json::Value = serde_json::from_slice(body)?;
    let canonical = versioning.to_internal(resource, external, version)?;
    Ok(serde_json::from_value(canonical)?)
}

/// Read a whole request body and [`parse_versioned`] it at the request's version
pub async fn read_versioned<T: DeserializeOwned>(
    versioning: &Versioning,
    resource: &str,
    req: http::Request<Full<Bytes>>,
) -> Result<T, ApiError> {
    let version = requested_version(&req).cloned();
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    parse_versioned(versioning, resource, &body, version.as_ref())
}
