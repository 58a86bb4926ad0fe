use crate::application::dto::{AnalysisRequest, AnalysisResponse};
use crate::compatibility::domain::{
    AnalysisResult, CompatibilityStatus, Component, Dependency, Ecosystem, ProbeFindings,
    RuntimeReport,
};
use crate::compatibility::policies::InheritancePolicy;
use crate::compatibility::services::{
    CompatibilityAnalyzer, ComponentFilter, DenyList, DependencyExtractor, IntelligentMatcher,
    KnowledgeBaseLoader, KnowledgeBaseStore, MatchingConfig,
};
use crate::ports::inbound::CompatibilityAnalysisPort;
use crate::ports::outbound::{ComponentReader, DocumentReader, ProgressReporter, RuntimeProber};
use crate::shared::error::ValidatorError;
use crate::shared::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Documents read for one input kind, plus the errors of unreadable ones
type LoadedDocuments = (Vec<(String, String)>, Vec<String>);

/// AnalyzeCompatibilityUseCase - Core use case for ARM64 compatibility analysis
///
/// This use case orchestrates the analysis workflow using generic dependency
/// injection for all infrastructure dependencies.
///
/// # Type Parameters
/// * `CR` - ComponentReader implementation
/// * `DR` - DocumentReader implementation
/// * `PR` - ProgressReporter implementation
/// * `RP` - RuntimeProber implementation (optional)
pub struct AnalyzeCompatibilityUseCase<CR, DR, PR, RP> {
    component_reader: CR,
    document_reader: DR,
    progress_reporter: PR,
    runtime_prober: Option<RP>,
}

impl<CR, DR, PR, RP> AnalyzeCompatibilityUseCase<CR, DR, PR, RP>
where
    CR: ComponentReader,
    DR: DocumentReader,
    PR: ProgressReporter,
    RP: RuntimeProber,
{
    /// Creates a new AnalyzeCompatibilityUseCase with injected dependencies
    pub fn new(
        component_reader: CR,
        document_reader: DR,
        progress_reporter: PR,
        runtime_prober: Option<RP>,
    ) -> Self {
        Self {
            component_reader,
            document_reader,
            progress_reporter,
            runtime_prober,
        }
    }

    /// Executes the compatibility analysis use case
    ///
    /// # Arguments
    /// * `request` - Input paths, overrides and settings for the run
    ///
    /// # Returns
    /// AnalysisResponse with per-component results, knowledge-base statistics
    /// and the runtime reports of any probes that ran
    ///
    /// # Errors
    /// Fails only when the components cannot be read or no knowledge base
    /// loads; every other problem is recorded in the result's errors.
    pub async fn execute(&self, request: AnalysisRequest) -> Result<AnalysisResponse> {
        let started = Instant::now();
        let mut errors = Vec::new();

        // Step 1: Read components
        let components = self.read_components(&request.components_path)?;

        // Step 2: Build the knowledge base, deny list and matcher
        let store = self.load_knowledge_base(&request, &mut errors)?;
        let deny_list = self.load_deny_list(&request, &mut errors);
        let mut matching = request.settings.matching.clone();
        let store = self.apply_custom_aliases(&request, store, &mut matching, &mut errors);
        let knowledge_base_stats = store.stats();

        let analyzer = CompatibilityAnalyzer::new(store, deny_list, IntelligentMatcher::new(matching))
            .with_component_filter(ComponentFilter::new(request.settings.supported_os.clone()))
            .with_inheritance_policy(InheritancePolicy::new(request.settings.inheritance_threshold))
            .with_runtime_analysis(request.settings.runtime_enabled && self.runtime_prober.is_some());

        // Step 3: Detect the operating system
        let detected_os = request
            .detected_os
            .clone()
            .or_else(|| analyzer.detect_os(&components));
        if let Some(os) = &detected_os {
            self.progress_reporter
                .report(&format!("🖥️  Operating system: {}", os));
        }

        // Step 4: Probe inconclusive components with their package managers
        let runtime_reports = self
            .run_runtime_probes(&analyzer, &components, detected_os.as_deref(), &mut errors)
            .await;
        let findings = ProbeFindings::from_reports(&runtime_reports);

        // Step 5: Analyze
        self.progress_reporter.report(&format!(
            "🔍 Analyzing {} component(s)...",
            components.len()
        ));
        let (results, analysis_errors) = analyzer.analyze_components_with_progress(
            &components,
            detected_os.as_deref(),
            &findings,
            |done, total, component| {
                self.progress_reporter
                    .report_progress(done, total, Some(&component.name))
            },
        );
        errors.extend(analysis_errors);
        for error in &errors {
            self.progress_reporter
                .report_error(&format!("⚠️  Warning: {}", error));
        }

        let result = AnalysisResult::new(results, errors, started.elapsed(), detected_os);
        let compatible = result.counts().get(CompatibilityStatus::Compatible);
        self.progress_reporter.report_completion(&format!(
            "✅ Analysis complete: {} of {} component(s) compatible, {} need attention",
            compatible,
            result.total_components(),
            result.total_components() - compatible
        ));

        Ok(AnalysisResponse::new(
            result,
            knowledge_base_stats,
            runtime_reports,
            request.resolved_sbom_name(),
        ))
    }

    fn read_components(&self, path: &Path) -> Result<Vec<Component>> {
        self.progress_reporter
            .report(&format!("📖 Loading components from: {}", path.display()));
        let components = self.component_reader.read_components(path)?;
        self.progress_reporter
            .report(&format!("✅ Loaded {} component(s)", components.len()));
        Ok(components)
    }

    /// Reads every document, recording unreadable ones as errors
    fn read_documents(&self, paths: &[PathBuf], kind: &str) -> LoadedDocuments {
        let mut documents = Vec::with_capacity(paths.len());
        let mut errors = Vec::new();
        for path in paths {
            let source_name = path.display().to_string();
            match self.document_reader.read_document(path) {
                Ok(content) => documents.push((source_name, content)),
                Err(e) => {
                    tracing::warn!(source = %source_name, "skipping {}: {}", kind, e);
                    errors.push(format!("{} '{}' skipped: {}", kind, source_name, e));
                }
            }
        }
        (documents, errors)
    }

    fn load_knowledge_base(
        &self,
        request: &AnalysisRequest,
        errors: &mut Vec<String>,
    ) -> Result<KnowledgeBaseStore> {
        self.progress_reporter.report(&format!(
            "📚 Loading {} knowledge base(s)...",
            request.knowledge_bases.len()
        ));
        let (documents, read_errors) = self.read_documents(&request.knowledge_bases, "Knowledge base");
        errors.extend(read_errors);
        if documents.is_empty() {
            return Err(ValidatorError::NoKnowledgeBaseLoaded {
                attempted: request.knowledge_bases.len(),
            }
            .into());
        }

        let loaded = KnowledgeBaseLoader::load(documents)?;
        errors.extend(loaded.errors);
        let stats = loaded.store.stats();
        self.progress_reporter.report(&format!(
            "✅ Knowledge base ready: {} record(s), {} alias(es) from {} source(s)",
            stats.records,
            stats.aliases,
            stats.sources.len()
        ));
        Ok(loaded.store)
    }

    fn load_deny_list(&self, request: &AnalysisRequest, errors: &mut Vec<String>) -> DenyList {
        if request.deny_lists.is_empty() {
            return DenyList::default();
        }
        let (documents, read_errors) = self.read_documents(&request.deny_lists, "Deny list");
        errors.extend(read_errors);
        let (deny_list, parse_errors) = DenyList::load(documents);
        errors.extend(parse_errors);
        self.progress_reporter
            .report(&format!("🚫 Deny list: {} entries", deny_list.len()));
        deny_list
    }

    /// Merges the custom alias file into both the matcher and the store
    fn apply_custom_aliases(
        &self,
        request: &AnalysisRequest,
        mut store: KnowledgeBaseStore,
        matching: &mut MatchingConfig,
        errors: &mut Vec<String>,
    ) -> KnowledgeBaseStore {
        let Some(path) = &request.custom_aliases else {
            return store;
        };
        let source_name = path.display().to_string();
        let parsed = self
            .document_reader
            .read_document(path)
            .and_then(|content| KnowledgeBaseLoader::parse_aliases(&source_name, &content));
        match parsed {
            Ok(aliases) => {
                store.add_aliases(aliases.iter());
                matching.custom_aliases.extend(aliases);
            }
            Err(e) => {
                tracing::warn!(source = %source_name, "skipping alias file: {}", e);
                errors.push(format!("Alias file '{}' skipped: {}", source_name, e));
            }
        }
        store
    }

    /// Runs one probe batch per ecosystem concurrently
    ///
    /// A batch that cannot run marks each of its components as failed so
    /// their results record the reason.
    async fn run_runtime_probes(
        &self,
        analyzer: &CompatibilityAnalyzer,
        components: &[Component],
        detected_os: Option<&str>,
        errors: &mut Vec<String>,
    ) -> Vec<RuntimeReport> {
        let Some(prober) = &self.runtime_prober else {
            return Vec::new();
        };
        if !analyzer.runtime_enabled() {
            return Vec::new();
        }

        let candidates = analyzer.probe_candidates(components, detected_os);
        let batches: Vec<(Ecosystem, Vec<Dependency>)> = DependencyExtractor::extract_all(&candidates);
        if batches.is_empty() {
            return Vec::new();
        }

        for (ecosystem, dependencies) in &batches {
            self.progress_reporter.report(&format!(
                "🧪 Probing {} {} dependencies...",
                dependencies.len(),
                ecosystem
            ));
        }

        let total: usize = batches.iter().map(|(_, dependencies)| dependencies.len()).sum();
        let finished = AtomicUsize::new(0);
        let reporter = &self.progress_reporter;
        let on_finished = |dependency: &Dependency| {
            let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
            reporter.report_progress(done, total, Some(&dependency.label()));
        };
        let outcomes = join_all(
            batches
                .iter()
                .map(|(ecosystem, dependencies)| prober.probe(*ecosystem, dependencies, &on_finished)),
        )
        .await;

        let mut reports = Vec::with_capacity(outcomes.len());
        for ((ecosystem, dependencies), outcome) in batches.into_iter().zip(outcomes) {
            match outcome {
                Ok(report) => {
                    errors.extend(report.errors.iter().cloned());
                    reports.push(report);
                }
                Err(e) => {
                    errors.push(format!("Runtime analysis for {} failed: {}", ecosystem, e));
                    let mut report = RuntimeReport::new(ecosystem, "unavailable");
                    for dependency in &dependencies {
                        report.add_failure(dependency, &e.to_string());
                    }
                    reports.push(report);
                }
            }
        }
        reports
    }
}

#[async_trait]
impl<CR, DR, PR, RP> CompatibilityAnalysisPort for AnalyzeCompatibilityUseCase<CR, DR, PR, RP>
where
    CR: ComponentReader + Sync,
    DR: DocumentReader + Sync,
    PR: ProgressReporter,
    RP: RuntimeProber,
{
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse> {
        self.execute(request).await
    }
}
