//! Read-only changelog endpoint
//!
//! - `GET {base}` lists every version report, newest first.
//! - `GET {base}/my_version` returns the report for the caller's version.

use crate::error::{json_response, ApiError, Response};
use crate::json::requested_version;
use futures_util::future::{ready, Ready};
use http::{Method, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;
use verso_core::{VersionReport, Versioning};

/// Service answering changelog requests under a base path
#[derive(Debug, Clone)]
pub struct ChangelogService {
    versioning: Arc<Versioning>,
    base: String,
}

impl ChangelogService {
    /// Serve the changelog under `base` (e.g. "/versions")
    pub fn new(versioning: Arc<Versioning>, base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            versioning,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn handle<B>(&self, req: &http::Request<B>) -> Result<Response, ApiError> {
        let path = req.uri().path().trim_end_matches('/');
        let Some(rest) = path.strip_prefix(self.base.as_str()) else {
            return Err(ApiError::no_route(req.method(), req.uri().path()));
        };

        let my_version = match rest {
            "" => false,
            "/my_version" => true,
            _ => return Err(ApiError::no_route(req.method(), req.uri().path())),
        };

        if req.method() != Method::GET {
            return Err(ApiError::method_not_allowed(format!(
                "Method {} not allowed for {}",
                req.method(),
                req.uri().path()
            )));
        }

        let changelog = self.versioning.changelog();
        if !my_version {
            let reports: Vec<&VersionReport> = changelog.newest_first().collect();
            return json_response(StatusCode::OK, &reports);
        }

        let version = self.versioning.requested_or_default(requested_version(req))?;
        match changelog.report(version) {
            Some(report) => json_response(StatusCode::OK, report),
            None => Err(ApiError::not_found(format!("Version {} is not registered", version))),
        }
    }
}

impl<B> Service<http::Request<B>> for ChangelogService {
    type Response = Response;
    type Error = Infallible;
    type Future = Ready<Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let response = self.handle(&req).unwrap_or_else(ApiError::into_response);
        ready(Ok(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::VersionLayer;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use serde_json::json;
    use tower::{Layer, ServiceExt};
    use verso_core::{
        AddField, ApiVersion, Container, Operation, ResourceSpec, VersionEntry, VersioningConfig,
    };

    fn versioning() -> Arc<Versioning> {
        let config = VersioningConfig::new()
            .version(VersionEntry::new("1.0.0").note("Initial version"))
            .version(VersionEntry::new("2.0.0").note("Added Thing model."))
            .version("2.1.0");
        Arc::new(
            Versioning::builder()
                .config(config)
                .resource(ResourceSpec::new("Thing").transform(
                    ApiVersion::new(2, 1, 0),
                    AddField::new("number").with_description("Added Thing.number field."),
                ))
                .container(
                    Container::new("ThingViewSet")
                        .introduced_in(ApiVersion::new(2, 0, 0))
                        .operation(Operation::new("get_name").introduced_in(ApiVersion::new(2, 1, 0))),
                )
                .build()
                .unwrap(),
        )
    }

    async fn send(method: Method, uri: &str, version: Option<&str>) -> (StatusCode, serde_json::Value) {
        let versioning = versioning();
        let service = VersionLayer::new(versioning.clone())
            .layer(ChangelogService::new(versioning, "/versions/"));
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(version) = version {
            builder = builder.header("X-API-Version", version);
        }
        let response = service
            .oneshot(builder.body(Full::new(Bytes::new())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (status, body) = send(Method::GET, "/versions", None).await;
        assert_eq!(status, StatusCode::OK);
        let versions: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["version"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(versions, vec!["2.1.0", "2.0.0", "1.0.0"]);
        assert_eq!(body[0]["models"], json!(["Added Thing.number field."]));
        assert_eq!(body[0]["views"]["actions_introduced"], json!(["ThingViewSet.get_name"]));
        assert_eq!(body[1]["views"]["endpoints_introduced"], json!(["ThingViewSet"]));
    }

    #[tokio::test]
    async fn test_my_version() {
        let (status, body) = send(Method::GET, "/versions/my_version/", Some("2.0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "2.0.0");
        assert_eq!(body["notes"], json!(["Added Thing model."]));

        let (_, body) = send(Method::GET, "/versions/my_version", None).await;
        assert_eq!(body["version"], "2.1.0");

        let (status, body) = send(Method::GET, "/versions/my_version", Some("1.5")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found");
    }

    #[tokio::test]
    async fn test_other_routes_and_methods() {
        let (status, _) = send(Method::GET, "/versions/other", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(Method::GET, "/things", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = send(Method::POST, "/versions", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["type"], "method_not_allowed");
    }
}
