mod cli;

use cli::Args;
use graviton_validator::adapters::outbound::console::{StderrProgressReporter, SummaryPrinter};
use graviton_validator::adapters::outbound::filesystem::FileSystemReader;
use graviton_validator::adapters::outbound::runtime::{RuntimeAnalyzer, RuntimeAnalyzerSettings};
use graviton_validator::application::dto::{AnalysisRequest, AnalysisSettings, ExecutionMode};
use graviton_validator::application::factories::{
    ExecutionEnvironmentFactory, ExecutionEnvironmentSettings, FormatterFactory, PresenterFactory,
    PresenterType,
};
use graviton_validator::application::read_models::AnalysisReportBuilder;
use graviton_validator::application::use_cases::AnalyzeCompatibilityUseCase;
use graviton_validator::config::{discover_config, load_config_from_path, ConfigFile};
use graviton_validator::ports::inbound::CompatibilityAnalysisPort;
use graviton_validator::shared::error::ExitCode;
use graviton_validator::shared::Result;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // clap exits with code 2 on invalid arguments
    let args = Args::parse_args();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("⚠️  Warning: Logging was already initialized.");
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let request = build_request(&args, &config);

    // Create adapters (Dependency Injection)
    let environment = request
        .settings
        .runtime_enabled
        .then(|| ExecutionEnvironmentFactory::create(&environment_settings(&args, &config, &request)));
    let runtime_analyzer = environment.as_ref().map(|environment| {
        RuntimeAnalyzer::new(
            Arc::clone(environment),
            analyzer_settings(&args, &config, &request),
        )
    });

    let use_case = AnalyzeCompatibilityUseCase::new(
        FileSystemReader::new(),
        FileSystemReader::new(),
        StderrProgressReporter::new(),
        runtime_analyzer,
    );

    let outcome = use_case.analyze(request).await;
    if let Some(environment) = &environment {
        environment.cleanup(keep_temp(&args, &config)).await;
    }
    let response = outcome?;

    let report = AnalysisReportBuilder::build(&response);

    let formatter_type = args.formatter_type();
    eprintln!("{}", FormatterFactory::progress_message(formatter_type));
    let formatted_output = FormatterFactory::create(formatter_type).format(&report)?;

    let presenter = PresenterFactory::create(PresenterType::from_output(args.output.clone()));
    presenter.present(&formatted_output)?;

    SummaryPrinter::new().print(&report);

    if args.fail_on_incompatible && response.has_incompatible() {
        eprintln!("\n⚠️  Incompatible components found; exiting with code 1.");
        return Ok(ExitCode::IncompatibleComponentsFound);
    }
    Ok(ExitCode::Success)
}

fn load_config(args: &Args) -> Result<ConfigFile> {
    if let Some(path) = &args.config {
        return load_config_from_path(path);
    }
    let cwd = std::env::current_dir()?;
    Ok(discover_config(&cwd)?.unwrap_or_default())
}

/// CLI values win over the config file; list flags replace config lists when given.
fn build_request(args: &Args, config: &ConfigFile) -> AnalysisRequest {
    let knowledge_bases = prefer_cli(&args.knowledge_bases, config.knowledge_bases.as_ref());
    let deny_lists = prefer_cli(&args.deny_lists, config.deny_lists.as_ref());

    let mut request = AnalysisRequest::new(args.input.clone(), knowledge_bases)
        .with_deny_lists(deny_lists)
        .with_settings(AnalysisSettings {
            matching: config.matching_config(),
            inheritance_threshold: config.inheritance_threshold(),
            supported_os: config.supported_os(),
            runtime_enabled: args.runtime || config.runtime.enabled.unwrap_or(false),
        });
    request.custom_aliases = config.custom_aliases().map(PathBuf::from);
    request.detected_os = args.os.clone().or_else(|| config.detected_os.clone());
    request.sbom_name = args.sbom_name.clone();
    request
}

fn prefer_cli(cli: &[PathBuf], config: Option<&Vec<PathBuf>>) -> Vec<PathBuf> {
    if cli.is_empty() {
        config.cloned().unwrap_or_default()
    } else {
        cli.to_vec()
    }
}

fn environment_settings(
    args: &Args,
    config: &ConfigFile,
    request: &AnalysisRequest,
) -> ExecutionEnvironmentSettings {
    // Validated when the config was loaded
    let configured_mode = config.runtime.execution_mode().unwrap_or(ExecutionMode::Auto);
    ExecutionEnvironmentSettings {
        mode: args.execution_mode.unwrap_or(configured_mode),
        os_tag: request.detected_os.clone().unwrap_or_default(),
        runtime_versions: config.runtime.runtime_versions.clone().unwrap_or_default(),
        timeouts: config.runtime.timeouts(),
        keep_temp: keep_temp(args, config),
    }
}

fn keep_temp(args: &Args, config: &ConfigFile) -> bool {
    args.keep_temp || config.runtime.keep_temp.unwrap_or(false)
}

fn analyzer_settings(
    args: &Args,
    config: &ConfigFile,
    request: &AnalysisRequest,
) -> RuntimeAnalyzerSettings {
    let defaults = RuntimeAnalyzerSettings::default();
    RuntimeAnalyzerSettings {
        ecosystems: config.runtime.ecosystems(),
        max_retries: config.runtime.max_retries.unwrap_or(defaults.max_retries),
        retry_delay: config
            .runtime
            .retry_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry_delay),
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| config.runtime.output_dir.clone()),
        sbom_name: Some(request.resolved_sbom_name()),
        verbose: args.verbose || config.runtime.verbose.unwrap_or(false),
    }
}
