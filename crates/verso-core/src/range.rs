//! Version ranges and bound merging
//!
//! A capability is visible from `introduced_in` (inclusive) until
//! `removed_in` (exclusive). Bounds can be declared on an operation and on
//! the container grouping it; the functions here merge the two levels with
//! most-restrictive-wins semantics.

use crate::error::Result;
use crate::registry::VersionRegistry;
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared lifespan of an operation or container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// First version in which the capability exists (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced_in: Option<ApiVersion>,
    /// First version in which the capability no longer exists (exclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_in: Option<ApiVersion>,
}

impl VersionRange {
    /// A range with no declared bounds
    pub fn any() -> Self {
        Self::default()
    }

    /// Visible from `version` onwards
    pub fn introduced_in(version: ApiVersion) -> Self {
        Self {
            introduced_in: Some(version),
            removed_in: None,
        }
    }

    /// Visible until `version` (exclusive)
    pub fn removed_in(version: ApiVersion) -> Self {
        Self {
            introduced_in: None,
            removed_in: Some(version),
        }
    }

    /// Visible in `[introduced, removed)`
    pub fn between(introduced: ApiVersion, removed: ApiVersion) -> Self {
        Self {
            introduced_in: Some(introduced),
            removed_in: Some(removed),
        }
    }

    /// Set the lower bound
    pub fn with_introduced_in(mut self, version: ApiVersion) -> Self {
        self.introduced_in = Some(version);
        self
    }

    /// Set the upper bound
    pub fn with_removed_in(mut self, version: ApiVersion) -> Self {
        self.removed_in = Some(version);
        self
    }

    /// Whether neither bound is declared
    pub fn is_unbounded(&self) -> bool {
        self.introduced_in.is_none() && self.removed_in.is_none()
    }
}

/// Upper end of an [`EffectiveRange`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpperBound {
    /// A declared `removed_in`: the version itself is not visible
    Exclusive(ApiVersion),
    /// No declared removal: visible up to and including the latest version
    Inclusive(ApiVersion),
}

impl UpperBound {
    /// The version at the bound
    pub fn version(&self) -> &ApiVersion {
        match self {
            Self::Exclusive(v) | Self::Inclusive(v) => v,
        }
    }

    /// Whether `version` lies below this bound
    pub fn admits(&self, version: &ApiVersion) -> bool {
        match self {
            Self::Exclusive(bound) => version < bound,
            Self::Inclusive(bound) => version <= bound,
        }
    }
}

/// Merged range after combining operation, container and registry bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRange {
    /// Inclusive lower bound
    pub lower: ApiVersion,
    /// Upper bound
    pub upper: UpperBound,
}

impl EffectiveRange {
    /// Whether `version` lies within the range
    pub fn contains(&self, version: &ApiVersion) -> bool {
        is_visible(self, version)
    }
}

impl fmt::Display for EffectiveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.upper {
            UpperBound::Exclusive(v) => write!(f, "[{}, {})", self.lower, v),
            UpperBound::Inclusive(v) => write!(f, "[{}, {}]", self.lower, v),
        }
    }
}

/// Merge two optional lower bounds
///
/// Returns `registry_earliest` when neither level declares a bound, otherwise
/// the highest of the declared bounds and `registry_earliest`.
pub fn merge_lower_bound(
    operation: Option<&ApiVersion>,
    container: Option<&ApiVersion>,
    registry_earliest: &ApiVersion,
) -> ApiVersion {
    [operation, container]
        .into_iter()
        .flatten()
        .fold(registry_earliest, |acc, v| acc.max(v))
        .clone()
}

/// Merge two optional upper bounds
///
/// Returns the lowest declared bound as exclusive. When nothing is declared,
/// or every declared bound lies beyond `registry_latest`, the range ends at
/// `registry_latest` inclusive.
pub fn merge_upper_bound(
    operation: Option<&ApiVersion>,
    container: Option<&ApiVersion>,
    registry_latest: &ApiVersion,
) -> UpperBound {
    let declared = [operation, container].into_iter().flatten().min();
    match declared {
        Some(bound) if bound <= registry_latest => UpperBound::Exclusive(bound.clone()),
        _ => UpperBound::Inclusive(registry_latest.clone()),
    }
}

/// Whether `requested` lies in `range`
///
/// A version equal to a declared `removed_in` is not visible.
pub fn is_visible(range: &EffectiveRange, requested: &ApiVersion) -> bool {
    requested >= &range.lower && range.upper.admits(requested)
}

/// Merge operation and container ranges against the registry bounds
pub fn resolve(
    operation: &VersionRange,
    container: &VersionRange,
    registry: &VersionRegistry,
) -> Result<EffectiveRange> {
    Ok(EffectiveRange {
        lower: merge_lower_bound(
            operation.introduced_in.as_ref(),
            container.introduced_in.as_ref(),
            registry.earliest()?,
        ),
        upper: merge_upper_bound(
            operation.removed_in.as_ref(),
            container.removed_in.as_ref(),
            registry.latest()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DefaultVersion;
    use proptest::prelude::*;

    fn v(s: &str) -> ApiVersion {
        ApiVersion::parse(s).unwrap()
    }

    #[test]
    fn test_merge_lower_bound() {
        let earliest = v("0.0.1");
        let cases = [
            (None, None, "0.0.1"),
            (Some("1.0"), None, "1.0"),
            (None, Some("1.0"), "1.0"),
            (Some("1.0"), Some("1.0"), "1.0"),
            (Some("2.0"), Some("1.0"), "2.0"),
            (Some("1.0"), Some("2.0"), "2.0"),
        ];
        for (op, container, expected) in cases {
            let op = op.map(v);
            let container = container.map(v);
            assert_eq!(
                merge_lower_bound(op.as_ref(), container.as_ref(), &earliest),
                v(expected),
                "op={:?} container={:?}",
                op,
                container
            );
        }
    }

    #[test]
    fn test_merge_lower_bound_never_below_earliest() {
        assert_eq!(
            merge_lower_bound(Some(&v("0.5")), None, &v("1.0")),
            v("1.0")
        );
    }

    #[test]
    fn test_merge_upper_bound() {
        let latest = v("9.0");
        let cases = [
            (Some("1.0"), None, "1.0"),
            (None, Some("1.0"), "1.0"),
            (Some("1.0"), Some("1.0"), "1.0"),
            (Some("2.0"), Some("1.0"), "1.0"),
            (Some("1.0"), Some("2.0"), "1.0"),
            (Some("2.1"), Some("3.0"), "2.1"),
        ];
        for (op, container, expected) in cases {
            let op = op.map(v);
            let container = container.map(v);
            assert_eq!(
                merge_upper_bound(op.as_ref(), container.as_ref(), &latest),
                UpperBound::Exclusive(v(expected))
            );
        }
    }

    #[test]
    fn test_merge_upper_bound_without_declaration_is_latest_inclusive() {
        assert_eq!(
            merge_upper_bound(None, None, &v("2.2.0")),
            UpperBound::Inclusive(v("2.2.0"))
        );
        assert_eq!(
            merge_upper_bound(Some(&v("5.0")), None, &v("2.2.0")),
            UpperBound::Inclusive(v("2.2.0"))
        );
        assert_eq!(
            merge_upper_bound(Some(&v("2.2.0")), None, &v("2.2.0")),
            UpperBound::Exclusive(v("2.2.0"))
        );
    }

    #[test]
    fn test_range_is_half_open() {
        let range = EffectiveRange {
            lower: v("2.0.0"),
            upper: UpperBound::Exclusive(v("2.1.0")),
        };
        assert!(range.contains(&v("2.0.0")));
        assert!(range.contains(&v("2.0.9")));
        assert!(!range.contains(&v("2.1.0")));
        assert!(!range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.2.0")));
        assert_eq!(range.to_string(), "[2.0.0, 2.1.0)");
    }

    #[test]
    fn test_latest_is_visible_without_removal() {
        let registry = VersionRegistry::new(
            [v("1.0.0"), v("2.0.0"), v("2.1.0")],
            DefaultVersion::Latest,
        )
        .unwrap();
        let range = resolve(
            &VersionRange::introduced_in(v("2.0.0")),
            &VersionRange::any(),
            &registry,
        )
        .unwrap();
        assert!(range.contains(&v("2.1.0")));
        assert!(!range.contains(&v("1.0.0")));
        assert_eq!(range.to_string(), "[2.0.0, 2.1.0]");
        // unregistered versions above latest fall outside
        assert!(!range.contains(&v("2.1.1")));
        assert!(!range.contains(&v("3.0")));
    }

    #[test]
    fn test_range_serde() {
        let range: VersionRange =
            serde_json::from_str(r#"{"introduced_in": "2.0", "removed_in": "3.0"}"#).unwrap();
        assert_eq!(range, VersionRange::between(v("2.0"), v("3.0")));
        let empty: VersionRange = serde_json::from_str("{}").unwrap();
        assert!(empty.is_unbounded());
    }

    fn version_strategy() -> impl Strategy<Value = ApiVersion> {
        (0u64..4, 0u64..4).prop_map(|(major, minor)| ApiVersion::new(major, minor, 0))
    }

    proptest! {
        #[test]
        fn prop_lower_merge_is_most_restrictive(
            op in proptest::option::of(version_strategy()),
            container in proptest::option::of(version_strategy()),
        ) {
            let earliest = ApiVersion::new(0, 0, 0);
            let merged = merge_lower_bound(op.as_ref(), container.as_ref(), &earliest);
            for bound in op.iter().chain(container.iter()) {
                prop_assert!(&merged >= bound);
            }
            prop_assert!(merged >= earliest);
        }

        #[test]
        fn prop_upper_merge_is_most_restrictive(
            op in proptest::option::of(version_strategy()),
            container in proptest::option::of(version_strategy()),
            probe in version_strategy(),
        ) {
            let latest = ApiVersion::new(9, 0, 0);
            let merged = merge_upper_bound(op.as_ref(), container.as_ref(), &latest);
            if merged.admits(&probe) {
                for bound in op.iter().chain(container.iter()) {
                    prop_assert!(&probe < bound);
                }
            }
        }
    }
}
