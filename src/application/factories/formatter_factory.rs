use crate::adapters::outbound::formatters::JsonReportFormatter;
use crate::ports::outbound::ReportFormatter;

/// Report formatter type enumeration for factory pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterType {
    Json,
    CompactJson,
}

/// Factory for creating report formatters
///
/// This factory encapsulates the creation logic for formatter implementations,
/// following the Factory Pattern. It belongs in the application layer as it orchestrates
/// the selection of infrastructure adapters based on application needs.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified type
    ///
    /// # Examples
    /// ```
    /// use graviton_validator::application::factories::{FormatterFactory, FormatterType};
    ///
    /// let formatter = FormatterFactory::create(FormatterType::Json);
    /// ```
    pub fn create(formatter_type: FormatterType) -> Box<dyn ReportFormatter> {
        match formatter_type {
            FormatterType::Json => Box::new(JsonReportFormatter::new()),
            FormatterType::CompactJson => Box::new(JsonReportFormatter::compact()),
        }
    }

    /// Returns the progress message shown before formatting
    pub fn progress_message(formatter_type: FormatterType) -> &'static str {
        match formatter_type {
            FormatterType::Json => "📝 Generating JSON compatibility report...",
            FormatterType::CompactJson => "📝 Generating compact JSON compatibility report...",
        }
    }
}
