use crate::compatibility::domain::operating_system::{os_name_from_distro, split_os_name};
use crate::compatibility::domain::{Component, Ecosystem, OsSupport, PackageUrl, PACKAGE_OWNER_PROPERTY};
use crate::compatibility::services::version_comparator::VersionComparator;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Only the first components of an SBOM vote on the operating system
const OS_DETECTION_SAMPLE: usize = 100;

const SYSTEM_NAME_PREFIXES: &[&str] = &[
    "glibc", "libc", "systemd", "udev", "dbus", "pam", "coreutils", "util-linux", "procps",
    "findutils",
];
const SYSTEM_NAMES: &[&str] = &["bash", "sh", "zsh", "fish", "grep", "sed", "gawk"];
const SYSTEM_TYPES: &[&str] = &["system-package", "os-package", "system"];
const SYSTEM_SOURCES: &[&str] = &["system", "os", "kernel"];
const KERNEL_TYPES: &[&str] = &["linux-kernel-module", "kernel-module", "driver"];
const ARCH_SUFFIXES: &[&str] = &[".x86_64", ".aarch64", ".noarch", ".i686", ".i386", ".amd64", ".arm64"];

/// Where a component sits before any knowledge-base lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentCategory {
    /// OS-provided package on an OS that ships for ARM64
    SystemCompatible,
    /// OS-provided package on an unknown or unsupported OS
    SystemUnknown,
    KernelModule,
    Application,
}

/// Classifies components and detects their OS and runtime ecosystem.
#[derive(Debug, Clone)]
pub struct ComponentFilter {
    supported_os: Vec<OsSupport>,
}

impl Default for ComponentFilter {
    fn default() -> Self {
        Self::new(OsSupport::defaults())
    }
}

impl ComponentFilter {
    pub fn new(supported_os: Vec<OsSupport>) -> Self {
        Self { supported_os }
    }

    /// Most frequent `distro=` qualifier among the first components' PURLs.
    pub fn detect_os(&self, components: &[Component]) -> Option<String> {
        let mut votes: BTreeMap<String, usize> = BTreeMap::new();
        for component in components.iter().take(OS_DETECTION_SAMPLE) {
            let distro = component
                .purl()
                .and_then(PackageUrl::parse)
                .and_then(|purl| purl.qualifier("distro").map(os_name_from_distro));
            if let Some(os) = distro {
                *votes.entry(os).or_insert(0) += 1;
            }
        }
        // ties go to the alphabetically first name
        votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(os, _)| os)
    }

    /// Whether the OS family is in the table and at or above its minimum release.
    pub fn is_os_compatible(&self, os_name: Option<&str>) -> bool {
        let Some(os_name) = os_name else {
            return false;
        };
        let (family, version) = split_os_name(os_name);
        let Some(support) = self.supported_os.iter().find(|s| s.family == family) else {
            return false;
        };
        match (version, support.minimum_version.as_deref()) {
            (Some(version), Some(minimum)) => matches!(
                VersionComparator::compare(&version, minimum),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            _ => true,
        }
    }

    pub fn categorize(&self, component: &Component, detected_os: Option<&str>) -> ComponentCategory {
        if Self::is_kernel_module(component) {
            return ComponentCategory::KernelModule;
        }
        if Self::is_system_package(component) {
            return if self.is_os_compatible(detected_os) {
                ComponentCategory::SystemCompatible
            } else {
                ComponentCategory::SystemUnknown
            };
        }
        ComponentCategory::Application
    }

    pub fn is_system_package(component: &Component) -> bool {
        if component.property("package:type") == Some("system-package") {
            return true;
        }
        if let Some(source) = component.property("package:source") {
            if SYSTEM_SOURCES.contains(&source.to_lowercase().as_str()) {
                return true;
            }
        }
        if SYSTEM_TYPES.contains(&component.component_type.to_lowercase().as_str()) {
            return true;
        }
        let name = component.name.to_lowercase();
        SYSTEM_NAMES.contains(&name.as_str())
            || SYSTEM_NAME_PREFIXES.iter().any(|prefix| {
                // `libc6` and `libc-bin` count, `libcurl` does not
                name.strip_prefix(prefix)
                    .map(|rest| !rest.starts_with(|c: char| c.is_alphabetic()))
                    .unwrap_or(false)
            })
    }

    pub fn is_kernel_module(component: &Component) -> bool {
        let typed_as_kernel = [
            Some(component.component_type.as_str()),
            component.property("syft:package:type"),
            component.property("package:type"),
        ]
        .into_iter()
        .flatten()
        .any(|t| KERNEL_TYPES.contains(&t.to_lowercase().as_str()));
        if typed_as_kernel {
            return true;
        }
        let name = component.name.to_lowercase();
        name.ends_with(".ko")
            || name.starts_with("kernel-")
            || name.contains("-kmod-")
            || name.ends_with("-dkms")
    }

    /// Runtime ecosystem from PURL type, component type, well-known package
    /// names and file extensions, in that order.
    pub fn detect_ecosystem(component: &Component) -> Option<Ecosystem> {
        if let Some(ecosystem) = component
            .purl()
            .and_then(PackageUrl::parse)
            .and_then(|purl| Ecosystem::from_purl_type(&purl.purl_type))
        {
            return Some(ecosystem);
        }

        let type_tokens: Vec<String> = component
            .component_type
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '.'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let full_type = component.component_type.to_lowercase();
        if let Some(ecosystem) = Ecosystem::ALL.into_iter().find(|e| {
            e.profile()
                .type_keywords
                .iter()
                .any(|k| *k == full_type || type_tokens.iter().any(|t| t == k))
        }) {
            return Some(ecosystem);
        }

        let name = component.name.to_lowercase();
        if let Some(ecosystem) = Ecosystem::ALL
            .into_iter()
            .find(|e| e.profile().well_known_packages.contains(&name.as_str()))
        {
            return Some(ecosystem);
        }

        Ecosystem::ALL.into_iter().find(|e| {
            e.profile()
                .file_extensions
                .iter()
                .any(|ext| name.ends_with(ext))
        })
    }

    /// Owning OS package name with architecture and version suffixes removed
    /// (`openssl-libs-1.0.2k-24.amzn2.x86_64` → `openssl-libs`).
    pub fn os_package_name(component: &Component) -> Option<String> {
        let owner = component.property(PACKAGE_OWNER_PROPERTY)?.trim();
        let mut name = owner;
        for suffix in ARCH_SUFFIXES {
            if let Some(stripped) = name.strip_suffix(suffix) {
                name = stripped;
            }
        }
        let cut = name
            .char_indices()
            .find(|(i, c)| {
                *c == '-'
                    && name[i + 1..]
                        .chars()
                        .next()
                        .map(|n| n.is_ascii_digit())
                        .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .unwrap_or(name.len());
        let name = name[..cut].trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}
