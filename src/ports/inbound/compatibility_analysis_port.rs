use crate::application::dto::{AnalysisRequest, AnalysisResponse};
use crate::shared::Result;
use async_trait::async_trait;

/// CompatibilityAnalysisPort - Inbound port for the compatibility analysis use case
///
/// This port defines the interface that external adapters (CLI, batch
/// drivers, etc.) use to analyze a component inventory.
#[async_trait]
pub trait CompatibilityAnalysisPort {
    /// Analyzes the components named by the request
    ///
    /// # Arguments
    /// * `request` - Input paths and run options
    ///
    /// # Returns
    /// The analysis result together with the knowledge-base statistics
    ///
    /// # Errors
    /// Returns an error if:
    /// - The components file cannot be read or parsed
    /// - No knowledge base could be loaded
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse>;
}
