use crate::compatibility::domain::{CompatibilityResult, Component, Ecosystem};
use serde::Serialize;
use std::collections::HashMap;

/// Identifies the component a probe outcome belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentKey {
    pub name: String,
    pub version: Option<String>,
}

impl ComponentKey {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        }
    }

    /// Key of a component, ignoring placeholder versions.
    pub fn of(component: &Component) -> Self {
        Self::new(&component.name, component.known_version())
    }
}

/// A package handed to an ecosystem's package manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    pub ecosystem: Ecosystem,
    /// Package name as the package manager knows it (artifact id for Maven)
    pub name: String,
    pub version: Option<String>,
    /// Maven group id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Name of the component this dependency was extracted from
    pub component_name: String,
    /// Known version of that component; the package version may come from its PURL instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_version: Option<String>,
}

impl Dependency {
    pub fn new(ecosystem: Ecosystem, name: &str, version: Option<&str>) -> Self {
        Self {
            ecosystem,
            name: name.to_string(),
            version: version.map(str::to_string),
            group: None,
            component_name: name.to_string(),
            component_version: version.map(str::to_string),
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_component_name(mut self, component_name: &str) -> Self {
        self.component_name = component_name.to_string();
        self
    }

    pub fn with_component_version(mut self, version: Option<&str>) -> Self {
        self.component_version = version.map(str::to_string);
        self
    }

    pub fn component_key(&self) -> ComponentKey {
        ComponentKey::new(&self.component_name, self.component_version.as_deref())
    }

    /// `name@version`, or `group:name:version` for Maven.
    pub fn label(&self) -> String {
        let coordinates = match &self.group {
            Some(group) => format!("{}:{}", group, self.name),
            None => self.name.clone(),
        };
        match (&self.version, self.group.is_some()) {
            (Some(version), true) => format!("{}:{}", coordinates, version),
            (Some(version), false) => format!("{}@{}", coordinates, version),
            (None, _) => coordinates,
        }
    }
}

/// Verdict for one probed dependency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyVerdict {
    pub dependency: Dependency,
    pub result: CompatibilityResult,
    pub native_build_detected: bool,
    /// Whether the verdict was re-derived from the manifest and log
    pub fallback: bool,
    /// Version that installed when the pinned version failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_version: Option<String>,
}

/// A dependency whose probe could not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeFailure {
    pub dependency: Dependency,
    pub reason: String,
}

/// Everything one ecosystem probe batch produced for a run.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeReport {
    pub ecosystem: Ecosystem,
    pub environment: String,
    pub manifest_file: Option<String>,
    pub verdicts: Vec<DependencyVerdict>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ProbeFailure>,
    pub errors: Vec<String>,
}

impl RuntimeReport {
    pub fn new(ecosystem: Ecosystem, environment: &str) -> Self {
        Self {
            ecosystem,
            environment: environment.to_string(),
            manifest_file: None,
            verdicts: Vec::new(),
            failures: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_failure(&mut self, dependency: &Dependency, reason: &str) {
        self.failures.push(ProbeFailure {
            dependency: dependency.clone(),
            reason: reason.to_string(),
        });
    }

    pub fn verdict_for(&self, component_name: &str, version: Option<&str>) -> Option<&DependencyVerdict> {
        let key = ComponentKey::new(component_name, version);
        self.verdicts.iter().find(|v| v.dependency.component_key() == key)
    }

    pub fn failure_for(&self, component_name: &str, version: Option<&str>) -> Option<&str> {
        let key = ComponentKey::new(component_name, version);
        self.failures
            .iter()
            .find(|f| f.dependency.component_key() == key)
            .map(|f| f.reason.as_str())
    }
}

/// Probe outcomes of a run keyed by component name and version.
#[derive(Debug, Clone, Default)]
pub struct ProbeFindings {
    verdicts: HashMap<ComponentKey, DependencyVerdict>,
    failures: HashMap<ComponentKey, String>,
}

impl ProbeFindings {
    /// First verdict per component wins when reports overlap.
    pub fn from_reports(reports: &[RuntimeReport]) -> Self {
        let mut findings = Self::default();
        for report in reports {
            for verdict in &report.verdicts {
                findings.add_verdict(verdict.clone());
            }
            for failure in &report.failures {
                findings.add_failure(failure.dependency.component_key(), &failure.reason);
            }
        }
        findings
    }

    pub fn add_verdict(&mut self, verdict: DependencyVerdict) {
        self.verdicts
            .entry(verdict.dependency.component_key())
            .or_insert(verdict);
    }

    pub fn add_failure(&mut self, key: ComponentKey, reason: &str) {
        self.failures
            .entry(key)
            .or_insert_with(|| reason.to_string());
    }

    pub fn verdict(&self, key: &ComponentKey) -> Option<&DependencyVerdict> {
        self.verdicts.get(key)
    }

    pub fn failure(&self, key: &ComponentKey) -> Option<&str> {
        self.failures.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.verdicts.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty() && self.failures.is_empty()
    }
}
