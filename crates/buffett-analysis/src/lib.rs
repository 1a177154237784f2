use std::collections::BTreeMap;

use analysis_core::{
    tail_window, FactorOutcome, FactorResult, FinancialRecord, ScoreResult, ScoringCriteria,
    StockScorer,
};
use serde_json::json;

const TOTAL: u32 = 10;
const WEIGHT: u32 = 2;

/// Buffett-style long-term quality score: five two-mark checks on
/// profitability, leverage, consistency, cash generation, and valuation.
pub struct BuffettScoreEngine;

impl BuffettScoreEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuffettScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StockScorer for BuffettScoreEngine {
    fn name(&self) -> &'static str {
        "Warren Buffett Score"
    }

    fn total(&self) -> u32 {
        TOTAL
    }

    fn score(&self, record: &FinancialRecord, criteria: &ScoringCriteria) -> ScoreResult {
        let mut factors = BTreeMap::new();

        // 1. High ROE
        factors.insert(
            "highROE".to_string(),
            FactorResult::new(
                json!(record.roe),
                format!("ROE > {}%", criteria.roe_min),
                FactorOutcome::from_check(record.roe.map(|r| r > criteria.roe_min)),
                WEIGHT,
            ),
        );

        // 2. Low debt
        factors.insert(
            "lowDebt".to_string(),
            FactorResult::new(
                json!(record.debt_to_equity),
                format!("Debt/Equity < {}", criteria.debt_to_equity_max),
                FactorOutcome::from_check(
                    record.debt_to_equity.map(|d| d < criteria.debt_to_equity_max),
                ),
                WEIGHT,
            ),
        );

        // 3. Profit consistency: positive in every recent period, needing at
        // least `min_history` periods to judge at all.
        let recent_profits = tail_window(&record.historical.net_profit, criteria.history_window);
        let consistency = if recent_profits.len() >= criteria.min_history {
            FactorOutcome::from_check(Some(recent_profits.iter().all(|&p| p > 0.0)))
        } else {
            FactorOutcome::InsufficientData
        };
        factors.insert(
            "profitConsistency".to_string(),
            FactorResult::new(
                json!(recent_profits),
                "Net Profit positive every year (5 years)",
                consistency,
                WEIGHT,
            ),
        );

        // 4. Strong free cash flow
        factors.insert(
            "strongFCF".to_string(),
            FactorResult::new(
                json!(record.fcf),
                "Free Cash Flow positive",
                FactorOutcome::from_check(record.fcf.map(|f| f > 0.0)),
                WEIGHT,
            ),
        );

        // 5. Reasonable valuation: cheaper than the industry. Either side
        // absent means the comparison cannot be made.
        factors.insert(
            "reasonableValuation".to_string(),
            FactorResult::new(
                json!({ "stockPE": record.stock_pe, "industryPE": record.industry_pe }),
                "Stock P/E < Industry P/E",
                FactorOutcome::from_check(
                    record
                        .stock_pe
                        .zip(record.industry_pe)
                        .map(|(s, i)| s < i),
                ),
                WEIGHT,
            ),
        );

        ScoreResult::from_factors(self.name(), TOTAL, factors, |score| {
            if score >= 8 {
                "Excellent Long-Term Business"
            } else if score >= 6 {
                "Good Business Quality"
            } else {
                "Needs Improvement"
            }
        })
    }
}
