use std::collections::BTreeMap;

use analysis_core::{
    prefer_external, FactorOutcome, FactorResult, FinancialRecord, ScoreResult, ScoringCriteria,
    StockScorer,
};
use serde_json::json;

const TOTAL: u32 = 10;

/// Lynch-style GARP score: growth, PEG, leverage, and a stub
/// business-simplicity factor.
pub struct LynchScoreEngine;

impl LynchScoreEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LynchScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StockScorer for LynchScoreEngine {
    fn name(&self) -> &'static str {
        "Peter Lynch Score"
    }

    fn total(&self) -> u32 {
        TOTAL
    }

    fn score(&self, record: &FinancialRecord, criteria: &ScoringCriteria) -> ScoreResult {
        let mut factors = BTreeMap::new();

        // 1. EPS/profit growth (3 marks). 5-year profit growth preferred,
        // EPS growth as fallback.
        let growth = prefer_external(record.profit_growth_5y, record.eps_growth);
        factors.insert(
            "epsGrowth".to_string(),
            FactorResult::new(
                json!(growth),
                format!("EPS/Profit Growth > {}%", criteria.growth_min),
                FactorOutcome::from_check(growth.map(|g| g > criteria.growth_min)),
                3,
            ),
        );

        // 2. Low PEG (3 marks)
        factors.insert(
            "lowPEG".to_string(),
            FactorResult::new(
                json!(record.peg_ratio),
                format!("PEG < {}", criteria.peg_max),
                FactorOutcome::from_check(record.peg_ratio.map(|p| p < criteria.peg_max)),
                3,
            ),
        );

        // 3. Low debt (2 marks)
        factors.insert(
            "lowDebt".to_string(),
            FactorResult::new(
                json!(record.debt_to_equity),
                format!("Debt/Equity < {}", criteria.debt_to_equity_max),
                FactorOutcome::from_check(
                    record.debt_to_equity.map(|d| d < criteria.debt_to_equity_max),
                ),
                2,
            ),
        );

        // 4. Business simplicity (2 marks). No industry-classification signal
        // is available, so this is a constant-pass stub; a real classifier
        // can replace it without changing the scorer contract.
        factors.insert(
            "businessSimplicity".to_string(),
            FactorResult::new(
                json!("Assumed Simple"),
                "Stable & simple business",
                FactorOutcome::Pass,
                criteria.simplicity_marks,
            ),
        );

        ScoreResult::from_factors(self.name(), TOTAL, factors, |score| {
            if score >= 7 {
                "Great Growth at Reasonable Price"
            } else if score >= 5 {
                "Moderate Growth Opportunity"
            } else {
                "Not a GARP Stock"
            }
        })
    }
}
