use std::collections::BTreeMap;

use analysis_core::{
    prefer_external, round2, tail_window, FactorOutcome, FactorResult, FinancialRecord,
    ScoreResult, ScoringCriteria, StockScorer,
};
use serde_json::json;

const TOTAL: u32 = 10;

/// Classic value-investing fair-value anchor: `sqrt(22.5 × EPS × BookValue)`.
/// Only defined when both inputs are positive.
pub fn compute_graham_number(eps: f64, book_value: f64) -> Option<f64> {
    (eps > 0.0 && book_value > 0.0).then(|| (22.5 * eps * book_value).sqrt())
}

/// Graham-style value score: margin-of-safety checks with uneven weights,
/// plus the Graham Number reported alongside (externally supplied value
/// preferred over the computed one).
pub struct GrahamScoreEngine;

impl GrahamScoreEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GrahamScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StockScorer for GrahamScoreEngine {
    fn name(&self) -> &'static str {
        "Benjamin Graham Score"
    }

    fn total(&self) -> u32 {
        TOTAL
    }

    fn score(&self, record: &FinancialRecord, criteria: &ScoringCriteria) -> ScoreResult {
        let mut factors = BTreeMap::new();

        // 1. Low P/E (1 mark)
        factors.insert(
            "lowPE".to_string(),
            FactorResult::new(
                json!(record.stock_pe),
                format!("P/E < {}", criteria.pe_max),
                FactorOutcome::from_check(record.stock_pe.map(|pe| pe < criteria.pe_max)),
                1,
            ),
        );

        // 2. Low price-to-book (1 mark)
        factors.insert(
            "lowPB".to_string(),
            FactorResult::new(
                json!(record.price_to_book),
                format!("P/B < {}", criteria.pb_max),
                FactorOutcome::from_check(record.price_to_book.map(|pb| pb < criteria.pb_max)),
                1,
            ),
        );

        // 3. Debt safety (2 marks)
        factors.insert(
            "debtSafety".to_string(),
            FactorResult::new(
                json!(record.debt_to_equity),
                format!("Debt/Equity < {}", criteria.graham_debt_to_equity_max),
                FactorOutcome::from_check(
                    record
                        .debt_to_equity
                        .map(|d| d < criteria.graham_debt_to_equity_max),
                ),
                2,
            ),
        );

        // 4. Strong liquidity (2 marks)
        factors.insert(
            "strongLiquidity".to_string(),
            FactorResult::new(
                json!(record.current_ratio),
                format!("Current Ratio > {}", criteria.graham_current_ratio_min),
                FactorOutcome::from_check(
                    record
                        .current_ratio
                        .map(|r| r > criteria.graham_current_ratio_min),
                ),
                2,
            ),
        );

        // 5. Earnings stability: no loss in the recent window (2 marks)
        let recent_profits = tail_window(&record.historical.net_profit, criteria.history_window);
        let stability = if recent_profits.len() >= criteria.min_history {
            FactorOutcome::from_check(Some(recent_profits.iter().all(|&p| p >= 0.0)))
        } else {
            FactorOutcome::InsufficientData
        };
        factors.insert(
            "earningsStability".to_string(),
            FactorResult::new(
                json!(recent_profits),
                "No loss year in 5 years",
                stability,
                2,
            ),
        );

        // 6. Dividend record: paid in at least 60% of the recent window,
        // rounded up (2 marks).
        let recent_dividends =
            tail_window(&record.historical.dividend_payout, criteria.history_window);
        let record_outcome = if recent_dividends.len() >= criteria.min_history {
            let needed =
                (recent_dividends.len() as f64 * criteria.dividend_consistency_ratio).ceil();
            let paid = recent_dividends.iter().filter(|&&d| d > 0.0).count() as f64;
            FactorOutcome::from_check(Some(paid >= needed))
        } else {
            FactorOutcome::InsufficientData
        };
        factors.insert(
            "dividendRecord".to_string(),
            FactorResult::new(
                json!(recent_dividends),
                "Dividend paid regularly",
                record_outcome,
                2,
            ),
        );

        let mut result = ScoreResult::from_factors(self.name(), TOTAL, factors, |score| {
            if score >= 7 {
                "Strong Value Stock"
            } else if score >= 5 {
                "Moderate Value"
            } else {
                "Not a Value Stock"
            }
        });

        // The externally supplied Graham Number wins over the computed one.
        let computed = record
            .latest_eps
            .zip(record.book_value)
            .and_then(|(eps, bv)| compute_graham_number(eps, bv));
        result.graham_number = prefer_external(
            record.graham_number.filter(|&g| g > 0.0),
            computed,
        )
        .map(round2);

        result
    }
}
