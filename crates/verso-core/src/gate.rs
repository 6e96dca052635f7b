//! Version gating for operations
//!
//! An [`Operation`] lives inside a [`Container`] (a resource group such as a
//! viewset or router scope). Both may declare a [`VersionRange`]; the
//! [`GateEvaluator`] merges them and decides whether a requested version may
//! reach the operation. A rejected request must look exactly like the
//! operation does not exist, so the decision is a plain `bool` that the
//! dispatch layer turns into a "not found" response.

use crate::error::{Result, VersioningError};
use crate::range::{self, EffectiveRange, VersionRange};
use crate::registry::VersionRegistry;
use crate::version::ApiVersion;

/// A single versioned operation (handler, action, endpoint method)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    name: String,
    range: VersionRange,
}

impl Operation {
    /// Declare an operation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: VersionRange::any(),
        }
    }

    /// First version in which the operation exists
    pub fn introduced_in(mut self, version: ApiVersion) -> Self {
        self.range.introduced_in = Some(version);
        self
    }

    /// First version in which the operation no longer exists
    pub fn removed_in(mut self, version: ApiVersion) -> Self {
        self.range.removed_in = Some(version);
        self
    }

    /// Operation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared range
    pub fn range(&self) -> &VersionRange {
        &self.range
    }
}

/// A group of operations sharing a lifespan
///
/// ```rust
/// use verso_core::{ApiVersion, Container, Operation};
///
/// let things = Container::new("ThingViewSet")
///     .introduced_in(ApiVersion::new(2, 0, 0))
///     .operation(Operation::new("list"))
///     .operation(Operation::new("get_name").introduced_in(ApiVersion::new(2, 1, 0)));
/// assert_eq!(things.operations().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    name: String,
    range: VersionRange,
    operations: Vec<Operation>,
}

impl Container {
    /// Declare a container
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: VersionRange::any(),
            operations: Vec::new(),
        }
    }

    /// First version in which the container exists
    pub fn introduced_in(mut self, version: ApiVersion) -> Self {
        self.range.introduced_in = Some(version);
        self
    }

    /// First version in which the container no longer exists
    pub fn removed_in(mut self, version: ApiVersion) -> Self {
        self.range.removed_in = Some(version);
        self
    }

    /// Add an operation
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared range
    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    /// Declared operations
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

/// Precomputed admission check for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    container: String,
    operation: String,
    range: EffectiveRange,
}

impl Gate {
    /// Whether `requested` may reach the operation
    pub fn admits(&self, requested: &ApiVersion) -> bool {
        let admitted = range::is_visible(&self.range, requested);
        if !admitted {
            tracing::debug!(
                container = %self.container,
                operation = %self.operation,
                requested = %requested,
                range = %self.range,
                "version outside operation range"
            );
        }
        admitted
    }

    /// Container name
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Effective range
    pub fn range(&self) -> &EffectiveRange {
        &self.range
    }
}

/// Merges operation and container ranges against a registry
#[derive(Debug, Clone, Copy)]
pub struct GateEvaluator<'a> {
    registry: &'a VersionRegistry,
}

impl<'a> GateEvaluator<'a> {
    /// Create an evaluator over `registry`
    pub fn new(registry: &'a VersionRegistry) -> Self {
        Self { registry }
    }

    /// Fail unless at least one level declares a bound
    pub fn check_declared(
        operation: &VersionRange,
        container: &VersionRange,
        name: &str,
    ) -> Result<()> {
        if operation.is_unbounded() && container.is_unbounded() {
            return Err(VersioningError::NoVersionBoundsDeclared {
                operation: name.to_string(),
            });
        }
        Ok(())
    }

    /// Effective range of an operation inside a container
    pub fn effective_range(
        &self,
        operation: &VersionRange,
        container: &VersionRange,
    ) -> Result<EffectiveRange> {
        range::resolve(operation, container, self.registry)
    }

    /// Whether `requested` is admitted
    ///
    /// Errors only on misconfiguration: an unbounded pair, or an empty
    /// registry.
    pub fn is_admitted(
        &self,
        operation: &VersionRange,
        container: &VersionRange,
        requested: &ApiVersion,
    ) -> Result<bool> {
        Self::check_declared(operation, container, "operation")?;
        let range = self.effective_range(operation, container)?;
        Ok(range::is_visible(&range, requested))
    }

    /// Precompute the gate for `operation` in `container`
    pub fn gate(&self, container: &Container, operation: &Operation) -> Result<Gate> {
        let name = format!("{}.{}", container.name, operation.name);
        Self::check_declared(&operation.range, &container.range, &name)?;
        Ok(Gate {
            container: container.name.clone(),
            operation: operation.name.clone(),
            range: self.effective_range(&operation.range, &container.range)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DefaultVersion;

    fn v(s: &str) -> ApiVersion {
        ApiVersion::parse(s).unwrap()
    }

    fn registry() -> VersionRegistry {
        VersionRegistry::new(
            ["0.0.1", "1.0.0", "2.0.0", "2.1.0", "2.2.0"].into_iter().map(v),
            DefaultVersion::Latest,
        )
        .unwrap()
    }

    #[test]
    fn test_is_admitted_table() {
        let registry = registry();
        let evaluator = GateEvaluator::new(&registry);
        let none = VersionRange::any();
        let cases = [
            (VersionRange::introduced_in(v("2.0.0")), "1.0.0", false),
            (VersionRange::introduced_in(v("2.0.0")), "2.0.0", true),
            (VersionRange::introduced_in(v("2.0.0")), "2.1.0", true),
            (VersionRange::removed_in(v("2.0.0")), "1.0.0", true),
            (VersionRange::removed_in(v("2.0.0")), "2.0.0", false),
            (VersionRange::removed_in(v("2.0.0")), "2.1.0", false),
            (VersionRange::between(v("2.0.0"), v("2.1.0")), "1.0.0", false),
            (VersionRange::between(v("2.0.0"), v("2.1.0")), "2.0.0", true),
            (VersionRange::between(v("2.0.0"), v("2.1.0")), "2.1.0", false),
            (VersionRange::between(v("2.0.0"), v("2.1.0")), "2.2.0", false),
        ];
        for (range, requested, expected) in cases {
            assert_eq!(
                evaluator.is_admitted(&range, &none, &v(requested)).unwrap(),
                expected,
                "range={:?} requested={}",
                range,
                requested
            );
        }
    }

    #[test]
    fn test_container_bounds_apply_to_operations() {
        let registry = registry();
        let evaluator = GateEvaluator::new(&registry);
        let container = Container::new("ThingViewSet")
            .introduced_in(v("2.0.0"))
            .removed_in(v("2.2.0"));
        let list = Operation::new("list");
        let get_name = Operation::new("get_name").introduced_in(v("2.1.0"));

        let gate = evaluator.gate(&container, &list).unwrap();
        assert!(!gate.admits(&v("1.0.0")));
        assert!(gate.admits(&v("2.0.0")));
        assert!(!gate.admits(&v("2.2.0")));

        let gate = evaluator.gate(&container, &get_name).unwrap();
        assert!(!gate.admits(&v("2.0.0")));
        assert!(gate.admits(&v("2.1.0")));
        assert!(!gate.admits(&v("2.2.0")));
        assert_eq!(gate.container(), "ThingViewSet");
        assert_eq!(gate.operation(), "get_name");
    }

    #[test]
    fn test_unbounded_pair_is_a_configuration_error() {
        let registry = registry();
        let evaluator = GateEvaluator::new(&registry);
        let err = evaluator
            .gate(&Container::new("ThingViewSet"), &Operation::new("list"))
            .unwrap_err();
        assert!(matches!(
            err,
            VersioningError::NoVersionBoundsDeclared { operation } if operation == "ThingViewSet.list"
        ));
    }

    #[test]
    fn test_unknown_requested_versions_fall_through_range_checks() {
        let registry = registry();
        let evaluator = GateEvaluator::new(&registry);
        let range = VersionRange::introduced_in(v("2.0.0"));
        assert!(evaluator
            .is_admitted(&range, &VersionRange::any(), &v("2.0.5"))
            .unwrap());
        assert!(!evaluator
            .is_admitted(&range, &VersionRange::any(), &v("1.5"))
            .unwrap());
    }
}
