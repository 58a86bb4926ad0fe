use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Property key carrying a Package URL when the SBOM parser stored it as a property
pub const PURL_PROPERTY: &str = "purl";

/// Property key naming the OS package that owns a file or library
pub const PACKAGE_OWNER_PROPERTY: &str = "package:owner";

/// Version strings that SBOM generators emit when the real version is unknown
const PLACEHOLDER_VERSIONS: &[&str] = &[
    "", "unknown", "vunknown", "n/a", "na", "null", "none", "all", "*", "-",
];

fn default_component_type() -> String {
    "library".to_string()
}

/// A normalized software component produced by an external SBOM parser.
///
/// Parent/child links are names only; resolving them goes through a
/// [`ComponentIndex`] built once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", default = "default_component_type")]
    pub component_type: String,
    /// Originating SBOM path
    #[serde(default, alias = "source_sbom")]
    pub source: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    /// Source package the component was built from
    #[serde(
        default,
        alias = "source_package",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
    /// Direct parent named by the SBOM parser, when it differs from the source package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_component: Option<String>,
    #[serde(
        default,
        alias = "child_components",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<String>,
}

impl Component {
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_string),
            component_type: default_component_type(),
            source: String::new(),
            properties: BTreeMap::new(),
            purl: None,
            parent: None,
            parent_component: None,
            children: Vec::new(),
        }
    }

    pub fn with_type(mut self, component_type: &str) -> Self {
        self.component_type = component_type.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_purl(mut self, purl: &str) -> Self {
        self.purl = Some(purl.to_string());
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_parent_component(mut self, parent: &str) -> Self {
        self.parent_component = Some(parent.to_string());
        self
    }

    /// Name this component groups under: its source package, else its parent component.
    pub fn group_key(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .or(self.parent_component.as_deref())
            .filter(|key| !key.is_empty() && *key != self.name)
    }

    pub fn with_children(mut self, children: &[&str]) -> Self {
        self.children = children.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Package URL from the dedicated field, falling back to the `purl` property.
    pub fn purl(&self) -> Option<&str> {
        self.purl
            .as_deref()
            .or_else(|| self.property(PURL_PROPERTY))
            .filter(|p| !p.is_empty())
    }

    /// The version, or `None` when it is absent or a placeholder such as "unknown".
    pub fn known_version(&self) -> Option<&str> {
        self.version.as_deref().and_then(known_version)
    }
}

/// Returns the trimmed version unless it is a placeholder.
pub fn known_version(version: &str) -> Option<&str> {
    let trimmed = version.trim();
    if PLACEHOLDER_VERSIONS.contains(&trimmed.to_lowercase().as_str()) {
        None
    } else {
        Some(trimmed)
    }
}

/// Name → position lookup over one run's component list.
#[derive(Debug, Default)]
pub struct ComponentIndex {
    by_name: HashMap<String, usize>,
}

impl ComponentIndex {
    /// First occurrence wins when names repeat.
    pub fn build(components: &[Component]) -> Self {
        let mut by_name = HashMap::with_capacity(components.len());
        for (position, component) in components.iter().enumerate() {
            by_name.entry(component.name.clone()).or_insert(position);
        }
        Self { by_name }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_component() {
        let component: Component = serde_json::from_str(r#"{"name": "nginx"}"#).unwrap();
        assert_eq!(component.name, "nginx");
        assert_eq!(component.version, None);
        assert_eq!(component.component_type, "library");
        assert!(component.properties.is_empty());
    }

    #[test]
    fn test_deserialize_accepts_sbom_aliases() {
        let json = r#"{
            "name": "libssl1.1",
            "version": "1.1.1f",
            "type": "os-package",
            "source_sbom": "host-a.json",
            "source_package": "openssl",
            "properties": {"package:owner": "openssl"}
        }"#;
        let component: Component = serde_json::from_str(json).unwrap();
        assert_eq!(component.source, "host-a.json");
        assert_eq!(component.parent.as_deref(), Some("openssl"));
        assert_eq!(component.property(PACKAGE_OWNER_PROPERTY), Some("openssl"));
    }

    #[test]
    fn test_deserialize_parent_component_alongside_source_package() {
        let json = r#"{
            "name": "libssl-dev",
            "source_package": "openssl",
            "parent_component": "libssl1.1"
        }"#;
        let component: Component = serde_json::from_str(json).unwrap();
        assert_eq!(component.parent.as_deref(), Some("openssl"));
        assert_eq!(component.parent_component.as_deref(), Some("libssl1.1"));
        assert_eq!(component.group_key(), Some("openssl"));

        let linked: Component =
            serde_json::from_str(r#"{"name": "libpq.so.5", "parent_component": "postgresql"}"#).unwrap();
        assert_eq!(linked.group_key(), Some("postgresql"));
        assert_eq!(Component::new("openssl", None).with_parent("openssl").group_key(), None);
    }

    #[test]
    fn test_purl_falls_back_to_property() {
        let component = Component::new("lodash", Some("4.17.21"))
            .with_property(PURL_PROPERTY, "pkg:npm/lodash@4.17.21");
        assert_eq!(component.purl(), Some("pkg:npm/lodash@4.17.21"));

        let direct = Component::new("lodash", None).with_purl("pkg:npm/lodash");
        assert_eq!(direct.purl(), Some("pkg:npm/lodash"));
    }

    #[test]
    fn test_known_version_filters_placeholders() {
        assert_eq!(Component::new("a", Some("UNKNOWN")).known_version(), None);
        assert_eq!(Component::new("a", Some("n/a")).known_version(), None);
        assert_eq!(Component::new("a", Some("")).known_version(), None);
        assert_eq!(Component::new("a", Some(" 1.2.3 ")).known_version(), Some("1.2.3"));
        assert_eq!(Component::new("a", None).known_version(), None);
    }

    #[test]
    fn test_index_keeps_first_occurrence() {
        let components = vec![
            Component::new("openssl", Some("1.1.1")),
            Component::new("zlib", None),
            Component::new("openssl", Some("3.0.0")),
        ];
        let index = ComponentIndex::build(&components);
        assert_eq!(index.position("openssl"), Some(0));
        assert_eq!(index.position("zlib"), Some(1));
        assert!(!index.contains("curl"));
        assert_eq!(index.len(), 2);
    }
}
