use crate::compatibility::domain::{
    CompatibilityResult, CompatibilityStatus, Dependency, DependencyVerdict, Ecosystem,
    ErrorCategory, ProbeOutput, ProbePhase,
};
use crate::compatibility::services::error_classifier::ErrorClassifier;
use crate::compatibility::services::manifest::ManifestGenerator;
use crate::compatibility::services::native_build_detector::NativeBuildDetector;
use crate::shared::error::ValidatorError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Confidence of a verdict backed by a per-dependency probe
pub const PROBE_CONFIDENCE: f64 = 0.9;
/// Confidence of a verdict re-derived from a whole-manifest run
pub const FALLBACK_CONFIDENCE: f64 = 0.7;

const LATEST_VERSION: &str = "latest";

/// Turns captured probe output into per-dependency verdicts.
pub struct ProbeInterpreter;

impl ProbeInterpreter {
    /// Verdict for a per-dependency probe.
    ///
    /// `latest` is the unpinned retry, present only when the pinned install failed.
    pub fn interpret(
        dependency: &Dependency,
        pinned: &ProbeOutput,
        latest: Option<&ProbeOutput>,
    ) -> DependencyVerdict {
        if pinned.install_succeeded() {
            return Self::installed(dependency, pinned);
        }
        if let Some(latest) = latest.filter(|l| l.install_succeeded()) {
            return Self::upgraded(dependency, pinned, latest);
        }
        Self::failed(dependency, pinned, PROBE_CONFIDENCE)
    }

    fn installed(dependency: &Dependency, output: &ProbeOutput) -> DependencyVerdict {
        let native = Self::native_detected(output);
        let label = dependency.label();
        let result = if output.failed_phase == Some(ProbePhase::Test) {
            let snippet = ErrorClassifier::snippet(&output.combined_log());
            CompatibilityResult::new(
                CompatibilityStatus::NeedsVerification,
                format!("Installed {} but the load test failed", label),
            )
            .with_confidence(PROBE_CONFIDENCE)
            .with_error(ErrorClassifier::classify(&output.combined_log(), output.timed_out), snippet)
        } else if native {
            CompatibilityResult::new(
                CompatibilityStatus::NeedsVerification,
                format!(
                    "Installed {} successfully; native build detected - verify ARM64 binaries",
                    label
                ),
            )
            .with_confidence(PROBE_CONFIDENCE)
        } else {
            CompatibilityResult::new(
                CompatibilityStatus::Compatible,
                format!("Installed and loaded {} successfully ({} probe)", label, output.environment),
            )
            .with_confidence(PROBE_CONFIDENCE)
        };
        DependencyVerdict {
            dependency: dependency.clone(),
            result,
            native_build_detected: native,
            fallback: false,
            working_version: None,
        }
    }

    fn upgraded(dependency: &Dependency, pinned: &ProbeOutput, latest: &ProbeOutput) -> DependencyVerdict {
        let native = Self::native_detected(latest);
        let current = dependency.version.as_deref().unwrap_or("unknown");
        let installed = Self::installed_version(dependency, latest);
        let status = if native {
            CompatibilityStatus::NeedsVerification
        } else {
            CompatibilityStatus::NeedsUpgrade
        };
        let category = ErrorClassifier::classify(&pinned.combined_log(), pinned.timed_out);
        let notes = match &installed {
            Some(version) => format!(
                "Version {} failed to install; the latest version {} installs successfully",
                current, version
            ),
            None => format!(
                "Version {} failed to install; the latest version installs successfully",
                current
            ),
        };
        let result = CompatibilityResult::new(status, notes)
            .with_confidence(PROBE_CONFIDENCE)
            .with_minimum_version(installed.clone())
            .with_recommended_version(installed.clone())
            .with_error(category, ErrorClassifier::snippet(&pinned.combined_log()));
        DependencyVerdict {
            dependency: dependency.clone(),
            result,
            native_build_detected: native,
            fallback: false,
            working_version: Some(installed.unwrap_or_else(|| LATEST_VERSION.to_string())),
        }
    }

    /// Version the package manager reports having installed.
    ///
    /// npm prints `+ name@version` (and the load test echoes `name@version`);
    /// pip and gem print `Successfully installed name-version`.
    pub fn installed_version(dependency: &Dependency, output: &ProbeOutput) -> Option<String> {
        let log = output.combined_log();
        match dependency.ecosystem {
            Ecosystem::NodeJs => Self::npm_installed_version(&dependency.name, &log),
            Ecosystem::Python | Ecosystem::Ruby => {
                Self::successfully_installed_version(&dependency.name, &log)
            }
            Ecosystem::Java | Ecosystem::DotNet => None,
        }
    }

    fn npm_installed_version(name: &str, log: &str) -> Option<String> {
        let marker = format!("{}@", name);
        log.lines()
            .filter_map(|line| {
                let start = line.rfind(&marker)? + marker.len();
                line[start..].split_whitespace().next()
            })
            .map(|token| token.trim_end_matches([',', ')', ';']))
            .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
            .map(str::to_string)
    }

    fn successfully_installed_version(name: &str, log: &str) -> Option<String> {
        // pip normalizes `-` and `.` in distribution names to `_`
        let normalize = |value: &str| value.to_lowercase().replace(['-', '.'], "_");
        let wanted = normalize(name);
        log.lines()
            .filter(|line| line.contains("Successfully installed"))
            .flat_map(str::split_whitespace)
            .find_map(|token| {
                // the first `-` before a digit ends the name; gems may append
                // a platform, as in `nokogiri-1.15.4-aarch64-linux`
                let (package, rest) = token
                    .match_indices('-')
                    .map(|(i, _)| (&token[..i], &token[i + 1..]))
                    .find(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()))?;
                (normalize(package) == wanted)
                    .then(|| rest.split('-').next().unwrap_or(rest).to_string())
            })
    }

    fn failed(dependency: &Dependency, output: &ProbeOutput, confidence: f64) -> DependencyVerdict {
        let log = output.combined_log();
        let category = ErrorClassifier::classify(&log, output.timed_out);
        let snippet = ErrorClassifier::snippet(&log);
        let result = match category {
            ErrorCategory::NativeBuild => CompatibilityResult::new(
                CompatibilityStatus::Incompatible,
                format!("Installation of {} failed while building native code", dependency.label()),
            )
            .with_confidence(confidence),
            _ => CompatibilityResult::unknown(format!(
                "Installation of {} failed ({} error)",
                dependency.label(),
                category
            )),
        }
        .with_error(category, snippet);
        DependencyVerdict {
            dependency: dependency.clone(),
            result,
            native_build_detected: category == ErrorCategory::NativeBuild,
            fallback: false,
            working_version: None,
        }
    }

    /// Re-derives per-dependency verdicts from a generated manifest and the
    /// output of one whole-manifest run.
    pub fn parse_results_for_fallback(
        ecosystem: Ecosystem,
        manifest_path: &Path,
        output: &ProbeOutput,
    ) -> Result<Vec<DependencyVerdict>> {
        let content = fs::read_to_string(manifest_path).map_err(|e| ValidatorError::FileReadError {
            path: manifest_path.to_path_buf(),
            details: e.to_string(),
        })?;
        let dependencies = ManifestGenerator::parse(ecosystem, &content);
        Ok(Self::interpret_manifest(&dependencies, output))
    }

    /// Applies one whole-manifest outcome to every declared dependency.
    ///
    /// On failure, dependencies the log names get the classified verdict;
    /// the rest stay unknown.
    pub fn interpret_manifest(dependencies: &[Dependency], output: &ProbeOutput) -> Vec<DependencyVerdict> {
        let log = output.combined_log();
        let lowered_log = log.to_lowercase();
        let native = Self::native_detected(output);
        dependencies
            .iter()
            .map(|dependency| {
                let mut verdict = if output.install_succeeded() {
                    let status = if native {
                        CompatibilityStatus::NeedsVerification
                    } else {
                        CompatibilityStatus::Compatible
                    };
                    let note = if native {
                        "Resolved with the generated manifest; native build output detected"
                    } else {
                        "Resolved with the generated manifest"
                    };
                    DependencyVerdict {
                        dependency: dependency.clone(),
                        result: CompatibilityResult::new(status, note)
                            .with_confidence(FALLBACK_CONFIDENCE),
                        native_build_detected: native,
                        fallback: true,
                        working_version: None,
                    }
                } else if lowered_log.contains(&dependency.name.to_lowercase()) {
                    Self::failed(dependency, output, FALLBACK_CONFIDENCE)
                } else {
                    let category = ErrorClassifier::classify(&log, output.timed_out);
                    DependencyVerdict {
                        dependency: dependency.clone(),
                        result: CompatibilityResult::unknown(format!(
                            "Manifest resolution failed ({} error); {} could not be verified individually",
                            category,
                            dependency.label()
                        ))
                        .with_error(category, ErrorClassifier::snippet(&log)),
                        native_build_detected: false,
                        fallback: true,
                        working_version: None,
                    }
                };
                verdict.fallback = true;
                verdict
            })
            .collect()
    }

    fn native_detected(output: &ProbeOutput) -> bool {
        !output.native_artifacts.is_empty() || NativeBuildDetector::detect_in_log(&output.combined_log())
    }
}
