use serde::{Deserialize, Serialize};
use std::fmt;

/// Final verdict for a component on ARM64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityStatus {
    Compatible,
    Incompatible,
    NeedsUpgrade,
    NeedsVerification,
    NeedsVersionVerification,
    Unknown,
}

impl CompatibilityStatus {
    /// Every status, in report order
    pub const ALL: [CompatibilityStatus; 6] = [
        CompatibilityStatus::Compatible,
        CompatibilityStatus::Incompatible,
        CompatibilityStatus::NeedsUpgrade,
        CompatibilityStatus::NeedsVerification,
        CompatibilityStatus::NeedsVersionVerification,
        CompatibilityStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityStatus::Compatible => "compatible",
            CompatibilityStatus::Incompatible => "incompatible",
            CompatibilityStatus::NeedsUpgrade => "needs_upgrade",
            CompatibilityStatus::NeedsVerification => "needs_verification",
            CompatibilityStatus::NeedsVersionVerification => "needs_version_verification",
            CompatibilityStatus::Unknown => "unknown",
        }
    }

    /// Whether static analysis reached a verdict that a runtime probe should not override.
    pub fn is_conclusive(&self) -> bool {
        !matches!(
            self,
            CompatibilityStatus::Unknown | CompatibilityStatus::NeedsVersionVerification
        )
    }
}

impl fmt::Display for CompatibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status tag attached to a version range inside a knowledge-base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Compatible,
    CompatibleWithNotes,
    Incompatible,
    Unknown,
}

impl RangeStatus {
    /// Lenient parse of knowledge-base status strings; unrecognized tags become `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "compatible" | "supported" => RangeStatus::Compatible,
            "compatible_with_notes" => RangeStatus::CompatibleWithNotes,
            "incompatible" | "unsupported" | "not_supported" => RangeStatus::Incompatible,
            _ => RangeStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeStatus::Compatible => "compatible",
            RangeStatus::CompatibleWithNotes => "compatible_with_notes",
            RangeStatus::Incompatible => "incompatible",
            RangeStatus::Unknown => "unknown",
        }
    }

    pub fn to_status(self) -> CompatibilityStatus {
        match self {
            RangeStatus::Compatible | RangeStatus::CompatibleWithNotes => {
                CompatibilityStatus::Compatible
            }
            RangeStatus::Incompatible => CompatibilityStatus::Incompatible,
            RangeStatus::Unknown => CompatibilityStatus::Unknown,
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, RangeStatus::Compatible | RangeStatus::CompatibleWithNotes)
    }
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
