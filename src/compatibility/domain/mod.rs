pub mod analysis_result;
pub mod compatibility_record;
pub mod compatibility_result;
pub mod compatibility_status;
pub mod component;
pub mod dependency;
pub mod deny_list_entry;
pub mod ecosystem;
pub mod operating_system;
pub mod probe;
pub mod purl;

pub use analysis_result::{AnalysisResult, StatusCounts};
pub use compatibility_record::{CompatibilityRecord, VersionRange};
pub use compatibility_result::{CompatibilityResult, ComponentResult, Resolution};
pub use compatibility_status::{CompatibilityStatus, RangeStatus};
pub use component::{known_version, Component, ComponentIndex, PACKAGE_OWNER_PROPERTY};
pub use dependency::{
    ComponentKey, Dependency, DependencyVerdict, ProbeFailure, ProbeFindings, RuntimeReport,
};
pub use deny_list_entry::DenyListEntry;
pub use ecosystem::{Ecosystem, EcosystemProfile, ProbeStrategy};
pub use operating_system::OsSupport;
pub use probe::{ErrorCategory, Prerequisites, ProbeCommand, ProbeOutput, ProbePhase, ProbeRequest};
pub use purl::PackageUrl;
