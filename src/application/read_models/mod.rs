//! Read models for CQRS-lite pattern
//!
//! This module contains view-optimized structs that provide
//! a denormalized representation of analysis results for reporting.

pub mod analysis_report;
pub mod analysis_report_builder;
pub mod component_view;

pub use analysis_report::{
    AnalysisReport, MatchingStatisticsView, ReportMetadataView, StatisticsView, SummaryView,
};
pub use analysis_report_builder::AnalysisReportBuilder;
pub use component_view::ComponentView;
