/// Use cases module containing application business logic orchestration
mod analyze_compatibility;

pub use analyze_compatibility::AnalyzeCompatibilityUseCase;
