//! graviton-validator - ARM64 compatibility analysis for software inventories
//!
//! This library checks the components listed in a normalized SBOM against
//! compatibility knowledge bases and, where static knowledge is not enough,
//! against live package-manager probes run in throwaway directories or
//! containers. It follows hexagonal architecture and Domain-Driven Design
//! principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`compatibility`): Components, knowledge bases, matching and verdicts
//! - **Application Layer** (`application`): Use cases, factories and report read models
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//! - **Config** (`config`): YAML configuration file support
//!
//! # Example
//!
//! ```no_run
//! use graviton_validator::prelude::*;
//! use std::path::PathBuf;
//!
//! # async fn run() -> Result<()> {
//! // Create use case with injected adapters; no runtime prober
//! let use_case: AnalyzeCompatibilityUseCase<_, _, _, RuntimeAnalyzer> =
//!     AnalyzeCompatibilityUseCase::new(
//!         FileSystemReader::new(),
//!         FileSystemReader::new(),
//!         StderrProgressReporter::new(),
//!         None,
//!     );
//!
//! // Execute
//! let request = AnalysisRequest::new(
//!     PathBuf::from("components.json"),
//!     vec![PathBuf::from("knowledge_bases/os_knowledge_base.json")],
//! );
//! let response = use_case.execute(request).await?;
//!
//! // Format output
//! let report = AnalysisReportBuilder::build(&response);
//! let output = JsonReportFormatter::new().format(&report)?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod compatibility;
pub mod config;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{StderrProgressReporter, SummaryPrinter};
    pub use crate::adapters::outbound::execution::{ContainerEnvironment, NativeEnvironment};
    pub use crate::adapters::outbound::filesystem::{
        FileSystemReader, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::JsonReportFormatter;
    pub use crate::adapters::outbound::runtime::{RuntimeAnalyzer, RuntimeAnalyzerSettings};
    pub use crate::application::dto::{
        AnalysisRequest, AnalysisResponse, AnalysisSettings, ExecutionMode,
    };
    pub use crate::application::read_models::{AnalysisReport, AnalysisReportBuilder};
    pub use crate::application::use_cases::AnalyzeCompatibilityUseCase;
    pub use crate::compatibility::domain::{
        AnalysisResult, CompatibilityRecord, CompatibilityResult, CompatibilityStatus, Component,
        ComponentResult, DenyListEntry, Ecosystem,
    };
    pub use crate::compatibility::services::{
        CompatibilityAnalyzer, IntelligentMatcher, KnowledgeBaseStore, MatchingConfig,
        VersionComparator,
    };
    pub use crate::ports::outbound::{
        ComponentReader, DocumentReader, ExecutionEnvironment, OutputPresenter, ProgressReporter,
        ReportFormatter, RuntimeProber,
    };
    pub use crate::shared::Result;
}
