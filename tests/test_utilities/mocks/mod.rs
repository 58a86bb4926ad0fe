/// Mock implementations for testing
mod mock_component_reader;
mod mock_document_reader;
mod mock_execution_environment;
mod mock_progress_reporter;
mod mock_runtime_prober;

pub use mock_component_reader::MockComponentReader;
pub use mock_document_reader::MockDocumentReader;
pub use mock_execution_environment::MockExecutionEnvironment;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_runtime_prober::MockRuntimeProber;
