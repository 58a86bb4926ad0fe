/// Formatter adapters for the analysis report
mod json_report_formatter;

pub use json_report_formatter::JsonReportFormatter;
