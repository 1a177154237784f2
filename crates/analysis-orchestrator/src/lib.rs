use analysis_core::{
    AnalysisError, DataProvider, FinancialRecord, RawScores, ScoreSummary, ScoringCriteria,
    StockAnalysis, StockScorer,
};
use buffett_analysis::BuffettScoreEngine;
use chrono::Utc;
use graham_analysis::GrahamScoreEngine;
use lynch_analysis::LynchScoreEngine;
use piotroski_analysis::PiotroskiScoreEngine;
use valuation_engine::ValuationEngine;

/// Runs the four scorers and the valuation engine over one record and
/// assembles the aggregate result.
///
/// Pure and stateless: every call computes a fresh result from its input,
/// so any number of analyses may run concurrently on one `Analyzer`.
pub struct Analyzer {
    piotroski: PiotroskiScoreEngine,
    buffett: BuffettScoreEngine,
    graham: GrahamScoreEngine,
    lynch: LynchScoreEngine,
    valuation: ValuationEngine,
    criteria: ScoringCriteria,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_criteria(ScoringCriteria::default())
    }

    pub fn with_criteria(criteria: ScoringCriteria) -> Self {
        Self {
            piotroski: PiotroskiScoreEngine::new(),
            buffett: BuffettScoreEngine::new(),
            graham: GrahamScoreEngine::new(),
            lynch: LynchScoreEngine::new(),
            valuation: ValuationEngine::new(),
            criteria,
        }
    }

    /// Score one populated record. The four scorers are independent; the
    /// valuation engine sees the record plus their raw scores.
    pub fn analyze(&self, company: &str, record: &FinancialRecord) -> StockAnalysis {
        tracing::info!(company, "running stock analysis");

        let piotroski = self.piotroski.score(record, &self.criteria);
        let buffett = self.buffett.score(record, &self.criteria);
        let graham = self.graham.score(record, &self.criteria);
        let lynch = self.lynch.score(record, &self.criteria);

        tracing::debug!(
            piotroski = piotroski.score,
            buffett = buffett.score,
            graham = graham.score,
            lynch = lynch.score,
            "scorer results"
        );

        let raw = RawScores {
            piotroski: piotroski.score,
            buffett: buffett.score,
            graham: graham.score,
            lynch: lynch.score,
        };
        let valuation = self.valuation.valuate(record, raw, &self.criteria);

        let scores_above_7 = raw.count_at_least(7);
        let overall_percent = ((piotroski.percent
            + buffett.percent
            + graham.percent
            + lynch.percent) as f64
            / 4.0)
            .round() as u32;

        let summary = ScoreSummary {
            piotroski: format!("{}/{}", piotroski.score, piotroski.total),
            buffett: format!("{}/{}", buffett.score, buffett.total),
            graham: format!("{}/{}", graham.score, graham.total),
            lynch: format!("{}/{}", lynch.score, lynch.total),
        };

        tracing::info!(
            company,
            decision = ?valuation.final_decision,
            scores_above_7,
            overall_percent,
            "analysis complete"
        );

        StockAnalysis {
            company: company.to_string(),
            timestamp: Utc::now(),
            final_decision: valuation.final_decision,
            scores_above_7,
            overall_percent,
            piotroski,
            buffett,
            graham,
            lynch,
            summary,
            // Legacy aliases for older API consumers.
            verdict: valuation.final_decision,
            score: scores_above_7,
            total: 4,
            percent: overall_percent,
            valuation,
        }
    }

    /// Resolve a record through the external data-fetch collaborator, then
    /// score it. The provider owns all timeout/retry semantics.
    pub async fn analyze_symbol<P: DataProvider>(
        &self,
        provider: &P,
        symbol: &str,
    ) -> Result<StockAnalysis, AnalysisError> {
        let record = provider.fetch(symbol).await?.sanitize();
        Ok(self.analyze(symbol, &record))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
