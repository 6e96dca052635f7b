//! Per-version changelog index
//!
//! A read-only projection over the registry and the static declarations:
//! for every version, its notes, the descriptions of the transforms bound to
//! it, and the containers/operations introduced or removed at it. Built once
//! when the [`Versioning`](crate::Versioning) instance is built.

use crate::chain::ResourceSpec;
use crate::error::{Result, VersioningError};
use crate::gate::Container;
use crate::registry::VersionRegistry;
use crate::version::ApiVersion;
use serde::Serialize;
use std::collections::BTreeMap;

/// Operations and containers that changed at one version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewChanges {
    /// Containers whose `introduced_in` is this version
    pub endpoints_introduced: Vec<String>,
    /// Containers whose `removed_in` is this version
    pub endpoints_removed: Vec<String>,
    /// `Container.operation` pairs whose `introduced_in` is this version
    pub actions_introduced: Vec<String>,
    /// `Container.operation` pairs whose `removed_in` is this version
    pub actions_removed: Vec<String>,
}

/// Everything that changed at one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionReport {
    /// The version
    pub version: ApiVersion,
    /// Release notes
    pub notes: Vec<String>,
    /// Descriptions of transforms bound to this version
    pub models: Vec<String>,
    /// Operation changes
    pub views: ViewChanges,
}

/// Changelog for every registered version
#[derive(Debug, Clone, Default)]
pub struct Changelog {
    reports: BTreeMap<ApiVersion, VersionReport>,
}

impl Changelog {
    /// Index the declarations by version
    ///
    /// Every version referenced by a transform or range must be registered;
    /// otherwise this fails with [`VersioningError::VersionNotFound`].
    pub fn build(
        registry: &VersionRegistry,
        resources: &[ResourceSpec],
        containers: &[Container],
    ) -> Result<Self> {
        let mut reports: BTreeMap<ApiVersion, VersionReport> = registry
            .list()
            .map(|version| {
                let report = VersionReport {
                    version: version.clone(),
                    notes: registry.notes(version).to_vec(),
                    models: Vec::new(),
                    views: ViewChanges::default(),
                };
                (version.clone(), report)
            })
            .collect();

        for resource in resources {
            for bound in resource.transforms() {
                entry(&mut reports, bound.version())?
                    .models
                    .push(bound.description().to_string());
            }
        }

        for container in containers {
            if let Some(version) = &container.range().introduced_in {
                entry(&mut reports, version)?
                    .views
                    .endpoints_introduced
                    .push(container.name().to_string());
            }
            if let Some(version) = &container.range().removed_in {
                entry(&mut reports, version)?
                    .views
                    .endpoints_removed
                    .push(container.name().to_string());
            }
            for operation in container.operations() {
                let action = format!("{}.{}", container.name(), operation.name());
                if let Some(version) = &operation.range().introduced_in {
                    entry(&mut reports, version)?
                        .views
                        .actions_introduced
                        .push(action.clone());
                }
                if let Some(version) = &operation.range().removed_in {
                    entry(&mut reports, version)?
                        .views
                        .actions_removed
                        .push(action);
                }
            }
        }

        Ok(Self { reports })
    }

    /// Report for `version`
    pub fn report(&self, version: &ApiVersion) -> Option<&VersionReport> {
        self.reports.get(version)
    }

    /// All reports, newest first
    pub fn newest_first(&self) -> impl Iterator<Item = &VersionReport> {
        self.reports.values().rev()
    }

    /// Number of reports
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether there are no reports
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

fn entry<'a>(
    reports: &'a mut BTreeMap<ApiVersion, VersionReport>,
    version: &ApiVersion,
) -> Result<&'a mut VersionReport> {
    reports
        .get_mut(version)
        .ok_or_else(|| VersioningError::VersionNotFound(version.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Operation;
    use crate::registry::DefaultVersion;
    use crate::transform::AddField;
    use serde_json::json;

    fn v(s: &str) -> ApiVersion {
        ApiVersion::parse(s).unwrap()
    }

    #[test]
    fn test_report_projection() {
        let registry = VersionRegistry::with_notes(
            [
                (v("1.0.0"), vec!["Initial version".to_string()]),
                (v("6.9"), vec!["some text".to_string()]),
            ],
            DefaultVersion::Latest,
        )
        .unwrap();
        let resources = [ResourceSpec::new("Thing").transform(
            v("6.9"),
            AddField::new("number").with_description("Added Thing.number field."),
        )];
        let containers = [
            Container::new("ThingViewSet")
                .introduced_in(v("6.9"))
                .operation(Operation::new("list").introduced_in(v("6.9"))),
            Container::new("OtherThingViewSet")
                .removed_in(v("6.9"))
                .operation(Operation::new("get_name").removed_in(v("6.9"))),
        ];

        let changelog = Changelog::build(&registry, &resources, &containers).unwrap();
        let report = changelog.report(&v("6.9")).unwrap();
        assert_eq!(
            serde_json::to_value(report).unwrap(),
            json!({
                "version": "6.9",
                "notes": ["some text"],
                "models": ["Added Thing.number field."],
                "views": {
                    "endpoints_introduced": ["ThingViewSet"],
                    "endpoints_removed": ["OtherThingViewSet"],
                    "actions_introduced": ["ThingViewSet.list"],
                    "actions_removed": ["OtherThingViewSet.get_name"],
                },
            })
        );

        let order: Vec<_> = changelog
            .newest_first()
            .map(|r| r.version.to_string())
            .collect();
        assert_eq!(order, vec!["6.9", "1.0.0"]);
    }

    #[test]
    fn test_unregistered_bound_version_is_rejected() {
        let registry = VersionRegistry::new([v("1.0.0")], DefaultVersion::Latest).unwrap();
        let resources = [ResourceSpec::new("Thing").transform(v("2.0.0"), AddField::new("n"))];
        let err = Changelog::build(&registry, &resources, &[]).unwrap_err();
        assert!(matches!(err, VersioningError::VersionNotFound(s) if s == "2.0.0"));
    }
}
