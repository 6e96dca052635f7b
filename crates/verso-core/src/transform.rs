//! Reversible payload edits
//!
//! A [`Transform`] describes one change to a resource's serialized shape. It
//! knows how to take the new shape back to the old one (`demote`, for
//! outbound payloads) and how to bring an old payload forward (`promote`, for
//! inbound payloads). The version at which the change took effect is attached
//! when the transform is bound to a resource, see [`ResourceSpec`].
//!
//! [`ResourceSpec`]: crate::ResourceSpec

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A JSON object payload
pub type JsonObject = Map<String, Value>;

/// A single reversible edit of a resource representation
///
/// Implementations must be pure: the same input always yields the same
/// output and no shared state is touched, so chains can run concurrently for
/// any number of requests.
///
/// ## Example
///
/// ```rust
/// use verso_core::{JsonObject, Transform};
///
/// /// `title` used to be called `name`.
/// struct RenameNameToTitle;
///
/// impl Transform for RenameNameToTitle {
///     fn description(&self) -> &str {
///         "Renamed Thing.name to Thing.title."
///     }
///
///     fn demote(&self, data: &mut JsonObject) {
///         if let Some(value) = data.remove("title") {
///             data.insert("name".into(), value);
///         }
///     }
///
///     fn promote(&self, data: &mut JsonObject) {
///         if let Some(value) = data.remove("name") {
///             data.insert("title".into(), value);
///         }
///     }
/// }
/// ```
pub trait Transform: Send + Sync + 'static {
    /// Human-readable change description, surfaced in the changelog
    fn description(&self) -> &str;

    /// New shape → old shape (outbound)
    fn demote(&self, data: &mut JsonObject);

    /// Old shape → new shape (inbound)
    fn promote(&self, data: &mut JsonObject);
}

/// A field that did not exist before the bound version
///
/// Demotion strips the field. Promotion drops it too: older payloads never
/// carry it, and anything sent under that name is not part of the old API.
#[derive(Debug, Clone)]
pub struct AddField {
    field: String,
    description: String,
}

impl AddField {
    /// Declare an added field
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            description: format!("Added field `{}`.", field),
            field,
        }
    }

    /// Override the changelog description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The field name
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Transform for AddField {
    fn description(&self) -> &str {
        &self.description
    }

    fn demote(&self, data: &mut JsonObject) {
        data.remove(&self.field);
    }

    fn promote(&self, data: &mut JsonObject) {
        data.remove(&self.field);
    }
}

/// A field that existed before the bound version and no longer does
///
/// Demotion reinstates the field with a placeholder so older consumers still
/// find the key. Promotion drops it because current validation no longer
/// understands it.
#[derive(Debug, Clone)]
pub struct RemoveField {
    field: String,
    null_value: Value,
    description: String,
}

impl RemoveField {
    /// Declare a removed field, reinstated as `null` for older versions
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            description: format!("Removed field `{}`.", field),
            field,
            null_value: Value::Null,
        }
    }

    /// The value reinstated for older versions
    pub fn with_null_value(mut self, value: impl Into<Value>) -> Self {
        self.null_value = value.into();
        self
    }

    /// Override the changelog description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The field name
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Transform for RemoveField {
    fn description(&self) -> &str {
        &self.description
    }

    fn demote(&self, data: &mut JsonObject) {
        data.insert(self.field.clone(), self.null_value.clone());
    }

    fn promote(&self, data: &mut JsonObject) {
        data.remove(&self.field);
    }
}

type EditFn = dyn Fn(&mut JsonObject) + Send + Sync;

/// A transform built from two closures
///
/// ```rust
/// use verso_core::FnTransform;
///
/// let rename = FnTransform::new(
///     "Renamed Thing.name to Thing.title.",
///     |data| {
///         if let Some(v) = data.remove("title") {
///             data.insert("name".into(), v);
///         }
///     },
///     |data| {
///         if let Some(v) = data.remove("name") {
///             data.insert("title".into(), v);
///         }
///     },
/// );
/// ```
#[derive(Clone)]
pub struct FnTransform {
    description: String,
    demote: Arc<EditFn>,
    promote: Arc<EditFn>,
}

impl FnTransform {
    /// Create a transform from a demotion and a promotion closure
    pub fn new<D, P>(description: impl Into<String>, demote: D, promote: P) -> Self
    where
        D: Fn(&mut JsonObject) + Send + Sync + 'static,
        P: Fn(&mut JsonObject) + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            demote: Arc::new(demote),
            promote: Arc::new(promote),
        }
    }
}

impl fmt::Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Transform for FnTransform {
    fn description(&self) -> &str {
        &self.description
    }

    fn demote(&self, data: &mut JsonObject) {
        (self.demote)(data)
    }

    fn promote(&self, data: &mut JsonObject) {
        (self.promote)(data)
    }
}
