use async_trait::async_trait;

use crate::{AnalysisError, FinancialRecord, ScoreResult, ScoringCriteria};

/// A deterministic, rule-based scorer over one financial record.
///
/// Implementations are pure: same record + criteria, same result. Absent
/// inputs lower the score, they never error.
pub trait StockScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fixed denominator for this scorer.
    fn total(&self) -> u32;

    fn score(&self, record: &FinancialRecord, criteria: &ScoringCriteria) -> ScoreResult;
}

/// The external data-fetch collaborator (web scraper, cached store, test
/// stub). Everything behind this seam — browser automation, cookies,
/// timeouts — is out of the engine's hands.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<FinancialRecord, AnalysisError>;
}
