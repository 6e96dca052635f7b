//! Startup wiring
//!
//! [`Versioning`] is the single object a service builds before accepting
//! traffic. The builder takes the static configuration plus every resource
//! and container declaration, validates all of them, and precomputes the
//! registry, transform chains, gates and changelog. Afterwards everything is
//! read-only and can be shared across request handlers (wrap it in an `Arc`).
//!
//! # Example
//!
//! ```rust
//! use verso_core::{
//!     AddField, ApiVersion, Container, Operation, ResourceSpec, Versioning,
//!     config::VersioningConfig,
//! };
//! use serde_json::json;
//!
//! let v2_0 = ApiVersion::new(2, 0, 0);
//! let v2_1 = ApiVersion::new(2, 1, 0);
//!
//! let versioning = Versioning::builder()
//!     .config(VersioningConfig::new().version("1.0.0").version("2.0.0").version("2.1.0"))
//!     .resource(ResourceSpec::new("Thing").transform(v2_1.clone(), AddField::new("number")))
//!     .container(
//!         Container::new("ThingViewSet")
//!             .introduced_in(v2_0.clone())
//!             .operation(Operation::new("list")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(versioning.is_admitted("ThingViewSet", "list", Some(&v2_0)).unwrap());
//! let out = versioning
//!     .to_external("Thing", json!({"id": 1, "number": 4}), Some(&v2_0))
//!     .unwrap();
//! assert_eq!(out, json!({"id": 1}));
//! ```

use crate::chain::{Resource, ResourceSpec, TransformChains};
use crate::changelog::Changelog;
use crate::config::VersioningConfig;
use crate::error::{Result, VersioningError};
use crate::gate::{Container, Gate, GateEvaluator};
use crate::registry::VersionRegistry;
use crate::version::ApiVersion;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Builder for [`Versioning`]
#[derive(Debug, Clone, Default)]
pub struct VersioningBuilder {
    config: VersioningConfig,
    resources: Vec<ResourceSpec>,
    containers: Vec<Container>,
}

impl VersioningBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: VersioningConfig) -> Self {
        self.config = config;
        self
    }

    /// Declare a resource type
    pub fn resource(mut self, spec: ResourceSpec) -> Self {
        self.resources.push(spec);
        self
    }

    /// Declare the resource type of a Rust type
    pub fn resource_type<R: Resource>(self) -> Self {
        self.resource(R::spec())
    }

    /// Declare a container and its operations
    pub fn container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    /// Validate every declaration and build the indices
    ///
    /// All configuration errors surface here: an empty or duplicated version
    /// list, a default policy that does not resolve, a resource without
    /// transforms, an operation without any version bound, a reference to an
    /// unregistered version.
    pub fn build(self) -> Result<Versioning> {
        let registry = VersionRegistry::from_config(&self.config)?;
        let default = registry.resolve_default()?;
        tracing::info!(
            versions = registry.len(),
            earliest = %registry.earliest()?,
            latest = %registry.latest()?,
            default = %default,
            "version registry built"
        );

        let chains = TransformChains::build(&self.resources)?;

        let evaluator = GateEvaluator::new(&registry);
        let mut gates = HashMap::new();
        let mut container_names = HashSet::new();
        for container in &self.containers {
            if !container_names.insert(container.name().to_string()) {
                return Err(VersioningError::DuplicateDeclaration(
                    container.name().to_string(),
                ));
            }
            for operation in container.operations() {
                let gate = evaluator.gate(container, operation)?;
                tracing::debug!(
                    container = container.name(),
                    operation = operation.name(),
                    range = %gate.range(),
                    "operation gated"
                );
                let key = (container.name().to_string(), operation.name().to_string());
                if gates.insert(key, gate).is_some() {
                    return Err(VersioningError::DuplicateDeclaration(format!(
                        "{}.{}",
                        container.name(),
                        operation.name()
                    )));
                }
            }
        }

        let changelog = Changelog::build(&registry, &self.resources, &self.containers)?;

        Ok(Versioning {
            registry,
            chains,
            gates,
            changelog,
            declarations: self,
        })
    }
}

/// Built, read-only versioning state
#[derive(Debug, Clone)]
pub struct Versioning {
    registry: VersionRegistry,
    chains: TransformChains,
    gates: HashMap<(String, String), Gate>,
    changelog: Changelog,
    declarations: VersioningBuilder,
}

impl Versioning {
    /// Start building
    pub fn builder() -> VersioningBuilder {
        VersioningBuilder::new()
    }

    /// Rebuild every index from a new configuration, keeping the declarations
    pub fn rebuild(&self, config: VersioningConfig) -> Result<Self> {
        self.declarations.clone().config(config).build()
    }

    /// The version registry
    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// The transform chains
    pub fn chains(&self) -> &TransformChains {
        &self.chains
    }

    /// The changelog
    pub fn changelog(&self) -> &Changelog {
        &self.changelog
    }

    /// The configuration this instance was built from
    pub fn config(&self) -> &VersioningConfig {
        &self.declarations.config
    }

    /// The gate for `operation` in `container`
    pub fn gate(&self, container: &str, operation: &str) -> Result<&Gate> {
        self.gates
            .get(&(container.to_string(), operation.to_string()))
            .ok_or_else(|| VersioningError::UnknownOperation {
                container: container.to_string(),
                operation: operation.to_string(),
            })
    }

    /// Iterate over all gates
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    /// The requested version, or the configured default when absent
    pub fn requested_or_default<'a>(
        &'a self,
        requested: Option<&'a ApiVersion>,
    ) -> Result<&'a ApiVersion> {
        match requested {
            Some(version) => Ok(version),
            None => self.registry.resolve_default(),
        }
    }

    /// Whether `requested` may reach `container.operation`
    ///
    /// An absent version is resolved through the default policy first.
    pub fn is_admitted(
        &self,
        container: &str,
        operation: &str,
        requested: Option<&ApiVersion>,
    ) -> Result<bool> {
        let gate = self.gate(container, operation)?;
        let version = self.requested_or_default(requested)?;
        Ok(gate.admits(version))
    }

    /// Canonical data → representation for `requested`
    pub fn to_external(
        &self,
        resource: &str,
        data: Value,
        requested: Option<&ApiVersion>,
    ) -> Result<Value> {
        self.chains.to_external(resource, data, requested)
    }

    /// Representation sent at `requested` → canonical data
    pub fn to_internal(
        &self,
        resource: &str,
        data: Value,
        requested: Option<&ApiVersion>,
    ) -> Result<Value> {
        self.chains.to_internal(resource, data, requested)
    }

    /// Serialize a typed value and demote it for `requested`
    pub fn represent<R>(&self, value: &R, requested: Option<&ApiVersion>) -> Result<Value>
    where
        R: Resource + Serialize,
    {
        self.to_external(R::NAME, serde_json::to_value(value)?, requested)
    }

    /// Serialize a collection of typed values and demote each for `requested`
    pub fn represent_many<R>(&self, values: &[R], requested: Option<&ApiVersion>) -> Result<Value>
    where
        R: Resource + Serialize,
    {
        self.to_external(R::NAME, serde_json::to_value(values)?, requested)
    }

    /// Promote data sent at `requested` and deserialize it
    ///
    /// Fields that do not exist at `requested` are absent after promotion, so
    /// serde defaults on `R` fill them in.
    pub fn parse<R>(&self, data: Value, requested: Option<&ApiVersion>) -> Result<R>
    where
        R: Resource + DeserializeOwned,
    {
        let canonical = self.to_internal(R::NAME, data, requested)?;
        Ok(serde_json::from_value(canonical)?)
    }
}
