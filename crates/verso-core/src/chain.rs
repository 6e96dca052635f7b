//! Transform chains
//!
//! Every resource type declares its transforms once, each bound to the
//! version that introduced the change. At startup the declarations become a
//! [`TransformChain`] ordered by bound version. Serving a request walks the
//! chain: outbound payloads are demoted newest-first through every transform
//! bound above the requested version, inbound payloads are promoted
//! oldest-first through the same set.
//!
//! Resources that embed other resources name the embedding field and the
//! embedded resource type. The embedded value is converted with its own
//! chain, keyed off the same requested version, to any depth.

use crate::error::{Result, VersioningError};
use crate::transform::{JsonObject, Transform};
use crate::version::ApiVersion;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A transform attached to the version at which its change took effect
#[derive(Clone)]
pub struct BoundTransform {
    version: ApiVersion,
    transform: Arc<dyn Transform>,
}

impl BoundTransform {
    /// Bind `transform` to `version`
    pub fn new(version: ApiVersion, transform: impl Transform) -> Self {
        Self {
            version,
            transform: Arc::new(transform),
        }
    }

    /// First version with the new shape
    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    /// Changelog description
    pub fn description(&self) -> &str {
        self.transform.description()
    }

    /// The underlying transform
    pub fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }
}

impl fmt::Debug for BoundTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTransform")
            .field("version", &self.version)
            .field("description", &self.description())
            .finish()
    }
}

/// A field holding another transformable resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedField {
    /// Field name in the canonical shape
    pub field: String,
    /// Resource type of the embedded value (object or array of objects)
    pub resource: String,
}

/// Static declaration of a resource type's versioning
///
/// ```rust
/// use verso_core::{AddField, ApiVersion, ResourceSpec};
///
/// let spec = ResourceSpec::new("Thing")
///     .transform(
///         ApiVersion::new(2, 1, 0),
///         AddField::new("number").with_description("Added Thing.number field."),
///     )
///     .nested("owner", "User");
/// assert_eq!(spec.transforms().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    name: String,
    transforms: Vec<BoundTransform>,
    nested: Vec<NestedField>,
    unversioned: bool,
}

impl ResourceSpec {
    /// Start a declaration for the resource type `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transforms: Vec::new(),
            nested: Vec::new(),
            unversioned: false,
        }
    }

    /// Bind a transform to the version that introduced the change
    pub fn transform(mut self, version: ApiVersion, transform: impl Transform) -> Self {
        self.transforms.push(BoundTransform::new(version, transform));
        self
    }

    /// Declare that `field` embeds a value of resource type `resource`
    pub fn nested(mut self, field: impl Into<String>, resource: impl Into<String>) -> Self {
        self.nested.push(NestedField {
            field: field.into(),
            resource: resource.into(),
        });
        self
    }

    /// Opt out of the "transforms must be declared" check
    ///
    /// For resources whose shape has never changed. Nested fields are still
    /// converted.
    pub fn unversioned(mut self) -> Self {
        self.unversioned = true;
        self
    }

    /// Resource type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared transforms, in declaration order
    pub fn transforms(&self) -> &[BoundTransform] {
        &self.transforms
    }

    /// Declared nested fields
    pub fn nested_fields(&self) -> &[NestedField] {
        &self.nested
    }

    /// Whether the resource opted out of declaring transforms
    pub fn is_unversioned(&self) -> bool {
        self.unversioned
    }
}

/// A Rust type with a versioned representation
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use verso_core::{AddField, ApiVersion, Resource, ResourceSpec};
///
/// #[derive(Serialize, Deserialize)]
/// struct Thing {
///     id: u64,
///     name: String,
///     #[serde(default)]
///     number: i64,
/// }
///
/// impl Resource for Thing {
///     const NAME: &'static str = "Thing";
///
///     fn spec() -> ResourceSpec {
///         ResourceSpec::new(Self::NAME)
///             .transform(ApiVersion::new(2, 1, 0), AddField::new("number"))
///     }
/// }
/// ```
pub trait Resource {
    /// Resource type name used as the chain key
    const NAME: &'static str;

    /// Versioning declaration for this type
    fn spec() -> ResourceSpec;
}

/// Transforms of one resource type, ascending by bound version
#[derive(Debug, Clone)]
pub struct TransformChain {
    resource: String,
    transforms: Vec<BoundTransform>,
    nested: Vec<NestedField>,
}

impl TransformChain {
    /// Build the chain for a declaration
    ///
    /// Fails with [`VersioningError::TransformsNotDeclared`] when the
    /// declaration has no transforms and did not opt out.
    pub fn from_spec(spec: &ResourceSpec) -> Result<Self> {
        if spec.transforms.is_empty() && !spec.unversioned {
            return Err(VersioningError::TransformsNotDeclared(spec.name.clone()));
        }

        let mut transforms = spec.transforms.clone();
        // stable: transforms sharing a version keep declaration order
        transforms.sort_by(|a, b| a.version.cmp(&b.version));

        Ok(Self {
            resource: spec.name.clone(),
            transforms,
            nested: spec.nested.clone(),
        })
    }

    /// Resource type name
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// All transforms, ascending by bound version
    pub fn transforms(&self) -> &[BoundTransform] {
        &self.transforms
    }

    /// Nested field declarations
    pub fn nested_fields(&self) -> &[NestedField] {
        &self.nested
    }

    /// Transforms to demote through for `requested`, newest first
    pub fn demotions_for<'a>(
        &'a self,
        requested: &'a ApiVersion,
    ) -> impl Iterator<Item = &'a BoundTransform> + 'a {
        self.transforms
            .iter()
            .rev()
            .filter(move |t| t.version > *requested)
    }

    /// Transforms to promote through for `requested`, oldest first
    pub fn promotions_for<'a>(
        &'a self,
        requested: &'a ApiVersion,
    ) -> impl Iterator<Item = &'a BoundTransform> + 'a {
        self.transforms
            .iter()
            .filter(move |t| t.version > *requested)
    }
}

/// All transform chains, keyed by resource type
#[derive(Debug, Clone, Default)]
pub struct TransformChains {
    chains: HashMap<String, TransformChain>,
}

impl TransformChains {
    /// Build every chain and check that nested resource types exist
    pub fn build<'a>(specs: impl IntoIterator<Item = &'a ResourceSpec>) -> Result<Self> {
        let mut chains = HashMap::new();
        for spec in specs {
            let chain = TransformChain::from_spec(spec)?;
            if chains.insert(spec.name.clone(), chain).is_some() {
                return Err(VersioningError::DuplicateDeclaration(spec.name.clone()));
            }
        }

        for chain in chains.values() {
            for nested in &chain.nested {
                if !chains.contains_key(&nested.resource) {
                    return Err(VersioningError::UnknownResource(nested.resource.clone()));
                }
            }
        }

        Ok(Self { chains })
    }

    /// The chain for `resource`
    pub fn chain_for(&self, resource: &str) -> Result<&TransformChain> {
        self.chains
            .get(resource)
            .ok_or_else(|| VersioningError::UnknownResource(resource.to_string()))
    }

    /// Iterate over all chains
    pub fn iter(&self) -> impl Iterator<Item = &TransformChain> {
        self.chains.values()
    }

    /// Convert canonical data into the shape expected at `requested`
    ///
    /// `data` may be one object or an array of objects. Without a requested
    /// version the canonical shape is returned unchanged.
    pub fn to_external(
        &self,
        resource: &str,
        mut data: Value,
        requested: Option<&ApiVersion>,
    ) -> Result<Value> {
        let chain = self.chain_for(resource)?;
        if let Some(version) = requested {
            tracing::trace!(resource, version = %version, "demoting payload");
            self.demote_value(chain, &mut data, version)?;
        }
        Ok(data)
    }

    /// Convert data sent at `requested` into the canonical shape
    pub fn to_internal(
        &self,
        resource: &str,
        mut data: Value,
        requested: Option<&ApiVersion>,
    ) -> Result<Value> {
        let chain = self.chain_for(resource)?;
        if let Some(version) = requested {
            tracing::trace!(resource, version = %version, "promoting payload");
            self.promote_value(chain, &mut data, version)?;
        }
        Ok(data)
    }

    fn demote_value(
        &self,
        chain: &TransformChain,
        value: &mut Value,
        requested: &ApiVersion,
    ) -> Result<()> {
        match value {
            Value::Object(map) => self.demote_object(chain, map, requested),
            Value::Array(items) => items
                .iter_mut()
                .try_for_each(|item| self.demote_value(chain, item, requested)),
            _ => Ok(()),
        }
    }

    // Children first: nested fields are declared by their canonical name,
    // which the parent's own demotions may rename or strip.
    fn demote_object(
        &self,
        chain: &TransformChain,
        map: &mut JsonObject,
        requested: &ApiVersion,
    ) -> Result<()> {
        for nested in &chain.nested {
            if let Some(child) = map.get_mut(&nested.field) {
                let child_chain = self.chain_for(&nested.resource)?;
                self.demote_value(child_chain, child, requested)?;
            }
        }
        for bound in chain.demotions_for(requested) {
            bound.transform.demote(map);
        }
        Ok(())
    }

    fn promote_value(
        &self,
        chain: &TransformChain,
        value: &mut Value,
        requested: &ApiVersion,
    ) -> Result<()> {
        match value {
            Value::Object(map) => self.promote_object(chain, map, requested),
            Value::Array(items) => items
                .iter_mut()
                .try_for_each(|item| self.promote_value(chain, item, requested)),
            _ => Ok(()),
        }
    }

    // Parent first, so nested fields carry their canonical names again.
    fn promote_object(
        &self,
        chain: &TransformChain,
        map: &mut JsonObject,
        requested: &ApiVersion,
    ) -> Result<()> {
        for bound in chain.promotions_for(requested) {
            bound.transform.promote(map);
        }
        for nested in &chain.nested {
            if let Some(child) = map.get_mut(&nested.field) {
                let child_chain = self.chain_for(&nested.resource)?;
                self.promote_value(child_chain, child, requested)?;
            }
        }
        Ok(())
    }
}
