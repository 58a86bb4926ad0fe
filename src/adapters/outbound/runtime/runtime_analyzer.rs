use crate::compatibility::domain::{
    Dependency, DependencyVerdict, Ecosystem, ProbeOutput, ProbeRequest, ProbeStrategy,
    RuntimeReport,
};
use crate::compatibility::services::{
    ErrorClassifier, ManifestGenerator, ProbeInterpreter, ProbePlanner,
};
use crate::ports::outbound::{ExecutionEnvironment, RuntimeProber};
use crate::shared::error::ValidatorError;
use crate::shared::security::ensure_output_directory;
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Knobs for the runtime analyzer, built once from configuration.
#[derive(Debug, Clone)]
pub struct RuntimeAnalyzerSettings {
    /// Ecosystems allowed to probe; empty means all
    pub ecosystems: BTreeSet<Ecosystem>,
    /// Extra attempts for network and timeout failures
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Where manifests and per-runtime result files are written
    pub output_dir: Option<PathBuf>,
    pub sbom_name: Option<String>,
    pub verbose: bool,
}

impl Default for RuntimeAnalyzerSettings {
    fn default() -> Self {
        Self {
            ecosystems: BTreeSet::new(),
            max_retries: 2,
            retry_delay: Duration::from_secs(5),
            output_dir: None,
            sbom_name: None,
            verbose: false,
        }
    }
}

/// Probes ecosystem dependencies through an [`ExecutionEnvironment`].
///
/// Node.js, Python and Ruby dependencies are installed one at a time with
/// a fallback to the latest release when the pinned version fails. Java and
/// .NET resolve the whole generated manifest in one invocation and verdicts
/// are re-derived from the manifest plus the captured log.
pub struct RuntimeAnalyzer {
    environment: Arc<dyn ExecutionEnvironment>,
    settings: RuntimeAnalyzerSettings,
}

impl RuntimeAnalyzer {
    pub fn new(environment: Arc<dyn ExecutionEnvironment>, settings: RuntimeAnalyzerSettings) -> Self {
        Self {
            environment,
            settings,
        }
    }

    pub fn environment(&self) -> &Arc<dyn ExecutionEnvironment> {
        &self.environment
    }

    pub fn is_enabled(&self, ecosystem: Ecosystem) -> bool {
        self.settings.ecosystems.is_empty() || self.settings.ecosystems.contains(&ecosystem)
    }

    /// Releases environment resources; `keep` preserves them for inspection.
    pub async fn cleanup(&self, keep: bool) {
        self.environment.cleanup(keep).await;
    }

    async fn execute_with_retries(&self, request: &ProbeRequest) -> ProbeOutput {
        let mut attempt = 0;
        loop {
            let output = self.environment.execute(request).await;
            if output.success || output.install_succeeded() {
                return output;
            }
            let category = ErrorClassifier::classify(&output.combined_log(), output.timed_out);
            if !category.is_transient() || attempt >= self.settings.max_retries {
                return output;
            }
            attempt += 1;
            tracing::warn!(
                label = %request.label,
                category = category.as_str(),
                attempt,
                "transient probe failure, retrying"
            );
            tokio::time::sleep(self.settings.retry_delay).await;
        }
    }

    async fn probe_dependency(&self, dependency: &Dependency) -> Result<DependencyVerdict> {
        let request =
            ProbePlanner::plan_dependency(dependency, dependency.version.as_deref(), self.settings.verbose)?;
        let pinned = self.execute_with_retries(&request).await;

        let latest = if !pinned.install_succeeded() && dependency.version.is_some() && pinned.error.is_none() {
            tracing::debug!(dependency = %dependency.label(), "pinned install failed, trying latest");
            let request = ProbePlanner::plan_dependency(dependency, None, self.settings.verbose)?;
            Some(self.execute_with_retries(&request).await)
        } else {
            None
        };

        Ok(ProbeInterpreter::interpret(dependency, &pinned, latest.as_ref()))
    }

    async fn probe_manifest(
        &self,
        ecosystem: Ecosystem,
        dependencies: &[Dependency],
        manifest_path: Option<&Path>,
    ) -> Result<Vec<DependencyVerdict>> {
        let request = ProbePlanner::plan_manifest(
            ecosystem,
            dependencies,
            self.settings.sbom_name.as_deref(),
            self.settings.verbose,
        )?;
        let output = self.execute_with_retries(&request).await;

        let parsed = manifest_path.map(|path| {
            ProbeInterpreter::parse_results_for_fallback(ecosystem, path, &output)
        });
        let verdicts = match parsed {
            Some(Ok(verdicts)) => verdicts,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "could not re-read manifest, using requested dependencies");
                ProbeInterpreter::interpret_manifest(dependencies, &output)
            }
            None => ProbeInterpreter::interpret_manifest(dependencies, &output),
        };
        Ok(Self::restore_component_names(verdicts, dependencies))
    }

    /// Manifest round trips lose the originating component; match back on
    /// coordinates, including the version whenever the manifest kept one.
    fn restore_component_names(
        verdicts: Vec<DependencyVerdict>,
        dependencies: &[Dependency],
    ) -> Vec<DependencyVerdict> {
        verdicts
            .into_iter()
            .map(|mut verdict| {
                let parsed = &verdict.dependency;
                if let Some(original) = dependencies.iter().find(|d| {
                    d.name == parsed.name
                        && (d.group.is_none() || d.group == parsed.group)
                        && (parsed.version.is_none() || d.version == parsed.version)
                }) {
                    verdict.dependency = original.clone();
                }
                verdict
            })
            .collect()
    }

    fn runtime_dir(&self, ecosystem: Ecosystem) -> Option<PathBuf> {
        self.settings
            .output_dir
            .as_ref()
            .map(|dir| dir.join(ecosystem.runtime()))
    }

    /// `{output_dir}/{runtime}/{sbom}_{runtime}_analysis.json`
    pub fn results_path(&self, ecosystem: Ecosystem) -> Option<PathBuf> {
        let runtime = ecosystem.runtime();
        let file_name = match self.settings.sbom_name.as_deref().filter(|s| !s.is_empty()) {
            Some(sbom) => format!("{}_{}_analysis.json", sbom, runtime),
            None => format!("{}_analysis.json", runtime),
        };
        self.runtime_dir(ecosystem).map(|dir| dir.join(file_name))
    }

    fn write_results(&self, report: &RuntimeReport) -> Result<()> {
        let Some(path) = self.results_path(report.ecosystem) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            ensure_output_directory(parent)?;
        }
        let content = serde_json::to_string_pretty(report)?;
        fs::write(&path, content).map_err(|e| ValidatorError::FileWriteError {
            path: path.clone(),
            details: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "wrote runtime analysis results");
        Ok(())
    }
}

#[async_trait]
impl RuntimeProber for RuntimeAnalyzer {
    async fn probe(
        &self,
        ecosystem: Ecosystem,
        dependencies: &[Dependency],
        on_finished: &(dyn for<'d> Fn(&'d Dependency) + Send + Sync),
    ) -> Result<RuntimeReport> {
        let mut report = RuntimeReport::new(ecosystem, self.environment.name());
        if dependencies.is_empty() {
            return Ok(report);
        }
        if !self.is_enabled(ecosystem) {
            report
                .errors
                .push(format!("Runtime analysis for {} is disabled", ecosystem));
            dependencies.iter().for_each(on_finished);
            return Ok(report);
        }

        let prerequisites = self.environment.check_prerequisites(ecosystem).await;
        if !prerequisites.ok {
            let reason = format!(
                "Missing prerequisites for {} analysis: {}",
                ecosystem,
                prerequisites.missing_tools.join(", ")
            );
            tracing::warn!("{}", reason);
            for dependency in dependencies {
                report.add_failure(dependency, &reason);
                on_finished(dependency);
            }
            report.errors.push(reason);
            return Ok(report);
        }

        let written = self.runtime_dir(ecosystem).map(|dir| {
            ManifestGenerator::write(ecosystem, dependencies, &dir, self.settings.sbom_name.as_deref())
        });
        let manifest_path = match written {
            Some(Ok(path)) => Some(path),
            Some(Err(e)) => {
                let message = format!("Failed to write {} manifest: {}", ecosystem, e);
                tracing::warn!("{}", message);
                report.errors.push(message);
                None
            }
            None => None,
        };
        report.manifest_file = manifest_path
            .as_ref()
            .map(|path| path.display().to_string());

        match ecosystem.profile().strategy {
            ProbeStrategy::PerDependency => {
                for dependency in dependencies {
                    match self.probe_dependency(dependency).await {
                        Ok(verdict) => report.verdicts.push(verdict),
                        Err(e) => {
                            let reason =
                                format!("Install check for {} could not run: {}", dependency.label(), e);
                            tracing::warn!("{}", reason);
                            report.add_failure(dependency, &reason);
                            report.errors.push(reason);
                        }
                    }
                    on_finished(dependency);
                }
            }
            ProbeStrategy::WholeManifest => {
                match self
                    .probe_manifest(ecosystem, dependencies, manifest_path.as_deref())
                    .await
                {
                    Ok(verdicts) => report.verdicts = verdicts,
                    Err(e) => {
                        let reason = format!("{} manifest resolution could not run: {}", ecosystem, e);
                        tracing::warn!("{}", reason);
                        for dependency in dependencies {
                            report.add_failure(dependency, &reason);
                        }
                        report.errors.push(reason);
                    }
                }
                dependencies.iter().for_each(on_finished);
            }
        }

        if let Err(e) = self.write_results(&report) {
            tracing::warn!(error = %e, "failed to write runtime analysis results");
            report.errors.push(e.to_string());
        }
        Ok(report)
    }
}
