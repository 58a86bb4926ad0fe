use crate::application::read_models::AnalysisReport;
use crate::shared::Result;

/// ReportFormatter port for rendering the analysis report
pub trait ReportFormatter {
    /// Formats the report read model
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, report: &AnalysisReport) -> Result<String>;
}
