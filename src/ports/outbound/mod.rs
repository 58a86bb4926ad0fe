/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (file system, package managers,
/// containers, console, etc.).
pub mod component_reader;
pub mod document_reader;
pub mod execution_environment;
pub mod output_presenter;
pub mod progress_reporter;
pub mod report_formatter;
pub mod runtime_prober;

pub use component_reader::ComponentReader;
pub use document_reader::DocumentReader;
pub use execution_environment::ExecutionEnvironment;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use report_formatter::ReportFormatter;
pub use runtime_prober::RuntimeProber;
