//! Configuration file support for graviton-validator.
//!
//! Provides YAML-based configuration through `graviton-validator.config.yml`
//! files, including data structures, file loading, validation and merging
//! over built-in defaults.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::outbound::execution::PhaseTimeouts;
use crate::application::dto::ExecutionMode;
use crate::compatibility::domain::{Ecosystem, OsSupport};
use crate::compatibility::policies::DEFAULT_INHERITANCE_THRESHOLD;
use crate::compatibility::services::{MatchingConfig, StrategyWeights};
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "graviton-validator.config.yml";

type UnknownFields = HashMap<String, serde_yaml_ng::Value>;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub knowledge_bases: Option<Vec<PathBuf>>,
    pub deny_lists: Option<Vec<PathBuf>>,
    /// Skips OS detection from PURL qualifiers
    pub detected_os: Option<String>,
    /// Replaces the built-in ARM64-capable OS table
    pub supported_os: Option<Vec<OsSupport>>,
    pub matching: Option<MatchingSection>,
    pub analysis: Option<AnalysisSection>,
    #[serde(default)]
    pub runtime: RuntimeSection,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct MatchingSection {
    pub enabled: Option<bool>,
    pub min_confidence_threshold: Option<f64>,
    pub max_matches: Option<usize>,
    pub enable_fuzzy_matching: Option<bool>,
    pub enable_alias_matching: Option<bool>,
    pub enable_substring_matching: Option<bool>,
    pub enable_normalized_matching: Option<bool>,
    pub weights: Option<WeightsSection>,
    /// JSON file of `alias -> canonical` pairs
    pub custom_aliases: Option<PathBuf>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct WeightsSection {
    pub levenshtein: Option<f64>,
    pub jaro_winkler: Option<f64>,
    pub substring: Option<f64>,
    pub normalized: Option<f64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct AnalysisSection {
    pub inheritance_threshold: Option<f64>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Deserialize, Default)]
pub struct RuntimeSection {
    pub enabled: Option<bool>,
    /// Ecosystems allowed to probe; all when omitted
    pub ecosystems: Option<Vec<Ecosystem>>,
    pub execution_mode: Option<String>,
    pub install_timeout_secs: Option<u64>,
    pub test_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub keep_temp: Option<bool>,
    pub verbose: Option<bool>,
    pub output_dir: Option<PathBuf>,
    /// Container image runtime versions, e.g. `nodejs: "18"`
    pub runtime_versions: Option<BTreeMap<Ecosystem, String>>,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

impl ConfigFile {
    /// Matching settings merged over the defaults.
    pub fn matching_config(&self) -> MatchingConfig {
        let mut config = MatchingConfig::default();
        let Some(section) = &self.matching else {
            return config;
        };
        if let Some(enabled) = section.enabled {
            config.enabled = enabled;
        }
        if let Some(threshold) = section.min_confidence_threshold {
            config.min_confidence_threshold = threshold;
        }
        if let Some(max) = section.max_matches {
            config.max_matches = max;
        }
        if let Some(flag) = section.enable_fuzzy_matching {
            config.enable_fuzzy_matching = flag;
        }
        if let Some(flag) = section.enable_alias_matching {
            config.enable_alias_matching = flag;
        }
        if let Some(flag) = section.enable_substring_matching {
            config.enable_substring_matching = flag;
        }
        if let Some(flag) = section.enable_normalized_matching {
            config.enable_normalized_matching = flag;
        }
        config.weights = section
            .weights
            .as_ref()
            .map(WeightsSection::merged)
            .unwrap_or_default();
        config
    }

    pub fn custom_aliases(&self) -> Option<&Path> {
        self.matching.as_ref()?.custom_aliases.as_deref()
    }

    pub fn inheritance_threshold(&self) -> f64 {
        self.analysis
            .as_ref()
            .and_then(|a| a.inheritance_threshold)
            .unwrap_or(DEFAULT_INHERITANCE_THRESHOLD)
    }

    pub fn supported_os(&self) -> Vec<OsSupport> {
        self.supported_os.clone().unwrap_or_else(OsSupport::defaults)
    }

    /// Unknown keys at every level, as dotted paths.
    pub fn unknown_field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.unknown_fields.keys().cloned().collect();
        let mut nested = |prefix: &str, fields: &UnknownFields| {
            names.extend(fields.keys().map(|key| format!("{}.{}", prefix, key)));
        };
        if let Some(matching) = &self.matching {
            nested("matching", &matching.unknown_fields);
            if let Some(weights) = &matching.weights {
                nested("matching.weights", &weights.unknown_fields);
            }
        }
        if let Some(analysis) = &self.analysis {
            nested("analysis", &analysis.unknown_fields);
        }
        nested("runtime", &self.runtime.unknown_fields);
        names.sort();
        names
    }
}

impl WeightsSection {
    fn merged(&self) -> StrategyWeights {
        let defaults = StrategyWeights::default();
        StrategyWeights {
            levenshtein: self.levenshtein.unwrap_or(defaults.levenshtein),
            jaro_winkler: self.jaro_winkler.unwrap_or(defaults.jaro_winkler),
            substring: self.substring.unwrap_or(defaults.substring),
            normalized: self.normalized.unwrap_or(defaults.normalized),
        }
    }
}

impl RuntimeSection {
    pub fn execution_mode(&self) -> Result<ExecutionMode> {
        match &self.execution_mode {
            Some(mode) => mode.parse().map_err(anyhow::Error::msg),
            None => Ok(ExecutionMode::default()),
        }
    }

    pub fn timeouts(&self) -> PhaseTimeouts {
        PhaseTimeouts {
            install: self.install_timeout_secs.map(Duration::from_secs),
            test: self.test_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn ecosystems(&self) -> BTreeSet<Ecosystem> {
        self.ecosystems
            .as_ref()
            .map(|list| list.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

fn check_unit_interval(name: &str, value: Option<f64>) -> Result<()> {
    if let Some(value) = value {
        if !(0.0..=1.0).contains(&value) {
            bail!(
                "Invalid config: {} must be between 0.0 and 1.0 (got {}).\n\n\
                 💡 Hint: Thresholds are confidence levels, e.g. 0.7.",
                name,
                value
            );
        }
    }
    Ok(())
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(matching) = &config.matching {
        check_unit_interval(
            "matching.min_confidence_threshold",
            matching.min_confidence_threshold,
        )?;
        if matching.max_matches == Some(0) {
            bail!(
                "Invalid config: matching.max_matches must be at least 1.\n\n\
                 💡 Hint: Set matching.enabled to false to turn fuzzy matching off."
            );
        }
        if let Some(weights) = &matching.weights {
            let merged = weights.merged();
            let values = [
                ("levenshtein", merged.levenshtein),
                ("jaro_winkler", merged.jaro_winkler),
                ("substring", merged.substring),
                ("normalized", merged.normalized),
            ];
            if let Some((name, value)) = values.iter().find(|(_, v)| *v < 0.0 || !v.is_finite()) {
                bail!(
                    "Invalid config: matching.weights.{} must be a non-negative number (got {}).",
                    name,
                    value
                );
            }
            if values.iter().map(|(_, v)| v).sum::<f64>() <= 0.0 {
                bail!(
                    "Invalid config: matching.weights must not all be zero.\n\n\
                     💡 Hint: Give at least one strategy a positive weight."
                );
            }
        }
    }

    if let Some(analysis) = &config.analysis {
        check_unit_interval("analysis.inheritance_threshold", analysis.inheritance_threshold)?;
    }

    let runtime = &config.runtime;
    for (name, value) in [
        ("runtime.install_timeout_secs", runtime.install_timeout_secs),
        ("runtime.test_timeout_secs", runtime.test_timeout_secs),
    ] {
        if value == Some(0) {
            bail!("Invalid config: {} must be greater than 0.", name);
        }
    }
    runtime.execution_mode().with_context(|| {
        "Invalid config: runtime.execution_mode\n\n💡 Hint: Use 'auto', 'native' or 'container'."
    })?;

    if let Some(supported) = &config.supported_os {
        if let Some(i) = supported.iter().position(|os| os.family.trim().is_empty()) {
            bail!(
                "Invalid config: supported_os[{}].family must not be empty.\n\n\
                 💡 Hint: Each entry needs a family such as \"ubuntu\" or \"amazon-linux\".",
                i
            );
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_field_names() {
        eprintln!("⚠️  Warning: Unknown config field '{}' will be ignored.", key);
    }
}
