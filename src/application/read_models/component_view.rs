//! Component view struct for the read model
//!
//! A flattened component plus its verdict, in report field order.

use serde::Serialize;

/// View representation of an analyzed component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub component_type: String,
    /// Originating SBOM
    pub source_sbom: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub compatibility: CompatibilityView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    /// How the verdict was reached (exact, alias, fuzzy, probe, ...)
    pub resolution: String,
}

/// View representation of a component's verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityView {
    pub status: String,
    pub current_version_supported: bool,
    pub minimum_supported_version: Option<String>,
    pub recommended_version: Option<String>,
    pub notes: Option<String>,
    pub confidence_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}
