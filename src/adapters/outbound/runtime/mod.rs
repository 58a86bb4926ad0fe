/// Runtime prober adapter driving package-manager probes
mod runtime_analyzer;

pub use runtime_analyzer::{RuntimeAnalyzer, RuntimeAnalyzerSettings};
