use crate::compatibility::domain::{Component, Dependency, Ecosystem, PackageUrl};
use crate::compatibility::services::component_filter::ComponentFilter;
use std::collections::HashSet;

const JAVA_TYPE_MARKERS: &[&str] = &["jar", "maven", "java-archive"];
const UNKNOWN_GROUP: &str = "unknown";

/// Picks the components one ecosystem's package manager can install.
pub struct DependencyExtractor;

impl DependencyExtractor {
    /// Dependencies of `ecosystem` among `components`, deduplicated by
    /// coordinates plus originating component and kept in first-seen order.
    pub fn extract(components: &[Component], ecosystem: Ecosystem) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        components
            .iter()
            .filter_map(|component| Self::dependency_for(component, ecosystem))
            .filter(|dependency| {
                seen.insert((
                    dependency.group.clone(),
                    dependency.name.clone(),
                    dependency.version.clone(),
                    dependency.component_key(),
                ))
            })
            .collect()
    }

    /// Groups every probe-able component by ecosystem.
    pub fn extract_all(components: &[Component]) -> Vec<(Ecosystem, Vec<Dependency>)> {
        Ecosystem::ALL
            .into_iter()
            .map(|ecosystem| (ecosystem, Self::extract(components, ecosystem)))
            .filter(|(_, dependencies)| !dependencies.is_empty())
            .collect()
    }

    pub fn dependency_for(component: &Component, ecosystem: Ecosystem) -> Option<Dependency> {
        let purl = component.purl().and_then(PackageUrl::parse);
        let belongs = match ecosystem {
            Ecosystem::Java => Self::is_java(component, purl.as_ref()),
            _ => ComponentFilter::detect_ecosystem(component) == Some(ecosystem),
        };
        if !belongs {
            return None;
        }

        let version = component
            .known_version()
            .map(str::to_string)
            .or_else(|| purl.as_ref().and_then(|p| p.version.clone()));

        let dependency = match ecosystem {
            Ecosystem::Java => {
                let (group, artifact) = Self::maven_coordinates(component, purl.as_ref());
                Dependency::new(ecosystem, &artifact, version.as_deref()).with_group(&group)
            }
            Ecosystem::NodeJs => {
                // scoped packages keep their `@scope/` prefix
                let name = purl
                    .as_ref()
                    .map(|p| match &p.namespace {
                        Some(scope) => format!("{}/{}", scope, p.name),
                        None => p.name.clone(),
                    })
                    .unwrap_or_else(|| component.name.clone());
                Dependency::new(ecosystem, &name, version.as_deref())
            }
            _ => {
                let name = purl
                    .as_ref()
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| component.name.clone());
                Dependency::new(ecosystem, &name, version.as_deref())
            }
        };
        Some(
            dependency
                .with_component_name(&component.name)
                .with_component_version(component.known_version()),
        )
    }

    fn is_java(component: &Component, purl: Option<&PackageUrl>) -> bool {
        if purl.map(|p| p.purl_type == "maven").unwrap_or(false) {
            return true;
        }
        let component_type = component.component_type.to_lowercase();
        if JAVA_TYPE_MARKERS.iter().any(|m| component_type.contains(m)) {
            return true;
        }
        ComponentFilter::detect_ecosystem(component) == Some(Ecosystem::Java)
    }

    /// Group and artifact from the PURL namespace, a `group:artifact` name,
    /// or `unknown` plus the bare name.
    fn maven_coordinates(component: &Component, purl: Option<&PackageUrl>) -> (String, String) {
        if let Some(purl) = purl.filter(|p| p.purl_type == "maven") {
            if let Some(namespace) = &purl.namespace {
                return (namespace.clone(), purl.name.clone());
            }
        }
        match component.name.split_once(':') {
            Some((group, artifact)) if !group.is_empty() && !artifact.is_empty() => {
                (group.to_string(), artifact.to_string())
            }
            _ => (UNKNOWN_GROUP.to_string(), component.name.clone()),
        }
    }
}
