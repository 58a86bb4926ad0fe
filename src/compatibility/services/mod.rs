//! Domain services for the compatibility analysis
pub mod compatibility_analyzer;
pub mod component_filter;
pub mod component_grouping;
pub mod deny_list;
pub mod dependency_extractor;
pub mod error_classifier;
pub mod intelligent_matcher;
pub mod knowledge_base;
pub mod knowledge_base_loader;
pub mod manifest;
pub mod native_build_detector;
pub mod probe_interpreter;
pub mod probe_planner;
pub mod recommendation;
pub mod version_comparator;

pub use compatibility_analyzer::CompatibilityAnalyzer;
pub use component_filter::{ComponentCategory, ComponentFilter};
pub use component_grouping::{ComponentGroup, ComponentGrouping, ComponentGroups};
pub use deny_list::DenyList;
pub use dependency_extractor::DependencyExtractor;
pub use error_classifier::ErrorClassifier;
pub use intelligent_matcher::{FuzzyMatch, IntelligentMatcher, MatchingConfig, StrategyWeights};
pub use knowledge_base::{KnowledgeBaseHit, KnowledgeBaseStats, KnowledgeBaseStore, LookupKind};
pub use knowledge_base_loader::{KnowledgeBaseLoader, LoadedKnowledgeBase, ParsedKnowledgeBase};
pub use manifest::ManifestGenerator;
pub use native_build_detector::NativeBuildDetector;
pub use probe_interpreter::{ProbeInterpreter, FALLBACK_CONFIDENCE, PROBE_CONFIDENCE};
pub use probe_planner::ProbePlanner;
pub use recommendation::RecommendationGenerator;
pub use version_comparator::{RangeMatch, Version, VersionComparator};
