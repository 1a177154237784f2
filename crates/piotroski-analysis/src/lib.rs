use std::collections::BTreeMap;

use analysis_core::{
    latest, prefer_external, previous, FactorOutcome, FactorResult, FinancialRecord, ScoreResult,
    ScoringCriteria, StockScorer,
};
use serde_json::json;

const TOTAL: u32 = 9;
const WEIGHT: u32 = 1;

/// Piotroski F-Score: nine one-mark checks over profitability, leverage, and
/// efficiency. Each factor compares the latest vs. previous entry of an
/// annual series, or a current ratio against a threshold.
pub struct PiotroskiScoreEngine;

impl PiotroskiScoreEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PiotroskiScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// YoY comparison outcome: insufficient data unless both sides are present.
fn compare(current: Option<f64>, prev: Option<f64>, op: fn(f64, f64) -> bool) -> FactorOutcome {
    FactorOutcome::from_check(current.zip(prev).map(|(c, p)| op(c, p)))
}

fn threshold(value: Option<f64>, op: impl Fn(f64) -> bool) -> FactorOutcome {
    FactorOutcome::from_check(value.map(op))
}

impl StockScorer for PiotroskiScoreEngine {
    fn name(&self) -> &'static str {
        "Piotroski F-Score"
    }

    fn total(&self) -> u32 {
        TOTAL
    }

    fn score(&self, record: &FinancialRecord, criteria: &ScoringCriteria) -> ScoreResult {
        let h = &record.historical;
        let mut factors = BTreeMap::new();

        let latest_profit = latest(&h.net_profit);
        let latest_cfo = latest(&h.cfo);

        // 1. Net profit positive
        factors.insert(
            "netProfitPositive".to_string(),
            FactorResult::new(
                json!(latest_profit),
                "Net Profit > 0",
                threshold(latest_profit, |p| p > 0.0),
                WEIGHT,
            ),
        );

        // 2. Operating cash flow positive
        factors.insert(
            "cfoPositive".to_string(),
            FactorResult::new(
                json!(latest_cfo),
                "CFO > 0",
                threshold(latest_cfo, |c| c > 0.0),
                WEIGHT,
            ),
        );

        // 3. ROA improved YoY. Externally supplied ROA wins; otherwise derive
        // net profit / total assets from the series.
        let derived_roa = derive_roa(latest_profit, latest(&h.total_assets));
        let derived_roa_prev = derive_roa(previous(&h.net_profit), previous(&h.total_assets));
        let roa = prefer_external(record.roa, derived_roa);
        let roa_prev = prefer_external(record.roa_prev_year, derived_roa_prev);
        factors.insert(
            "roaImproved".to_string(),
            FactorResult::new(
                json!({ "current": roa, "previous": roa_prev }),
                "Current ROA > Previous Year",
                compare(roa, roa_prev, |c, p| c > p),
                WEIGHT,
            ),
        );

        // 4. Cash flow exceeds profit
        factors.insert(
            "cfoGreaterThanProfit".to_string(),
            FactorResult::new(
                json!({ "cfo": latest_cfo, "profit": latest_profit }),
                "CFO > Net Profit",
                compare(latest_cfo, latest_profit, |c, p| c > p),
                WEIGHT,
            ),
        );

        // 5. Debt reduced
        let latest_borrowings = latest(&h.borrowings);
        let prev_borrowings = previous(&h.borrowings);
        factors.insert(
            "debtReduced".to_string(),
            FactorResult::new(
                json!({ "current": latest_borrowings, "previous": prev_borrowings }),
                "Borrowings decreased YoY",
                compare(latest_borrowings, prev_borrowings, |c, p| c < p),
                WEIGHT,
            ),
        );

        // 6. Liquidity. A snapshot threshold, not a true YoY comparison —
        // kept as-is because changing it would rewrite scoring history.
        factors.insert(
            "currentRatioImproved".to_string(),
            FactorResult::new(
                json!(record.current_ratio),
                format!("Current Ratio > {}", criteria.piotroski_current_ratio_min),
                threshold(record.current_ratio, |r| {
                    r > criteria.piotroski_current_ratio_min
                }),
                WEIGHT,
            ),
        );

        // 7. No equity dilution
        let latest_equity = latest(&h.equity_capital);
        let prev_equity = previous(&h.equity_capital);
        factors.insert(
            "noEquityDilution".to_string(),
            FactorResult::new(
                json!({ "current": latest_equity, "previous": prev_equity }),
                "No new shares issued",
                compare(latest_equity, prev_equity, |c, p| c <= p),
                WEIGHT,
            ),
        );

        // 8. Operating margin improved YoY
        let latest_opm = latest(&h.opm_percent);
        let prev_opm = previous(&h.opm_percent);
        factors.insert(
            "opmImproved".to_string(),
            FactorResult::new(
                json!({ "current": latest_opm, "previous": prev_opm }),
                "OPM % increased YoY",
                compare(latest_opm, prev_opm, |c, p| c > p),
                WEIGHT,
            ),
        );

        // 9. Asset turnover improved YoY, computed from the sales and assets
        // series (never the pre-computed scalar).
        let turnover = derive_turnover(latest(&h.sales), latest(&h.total_assets));
        let prev_turnover = derive_turnover(previous(&h.sales), previous(&h.total_assets));
        factors.insert(
            "assetTurnoverImproved".to_string(),
            FactorResult::new(
                json!({ "current": turnover, "previous": prev_turnover }),
                "Asset Turnover improved YoY",
                compare(turnover, prev_turnover, |c, p| c > p),
                WEIGHT,
            ),
        );

        ScoreResult::from_factors(self.name(), TOTAL, factors, |score| {
            if score >= 7 {
                "Strong Financial Health"
            } else if score >= 5 {
                "Moderate Financial Health"
            } else {
                "Weak Financial Health"
            }
        })
    }
}

fn derive_roa(net_profit: Option<f64>, assets: Option<f64>) -> Option<f64> {
    match (net_profit, assets) {
        (Some(p), Some(a)) if a > 0.0 => Some(p / a * 100.0),
        _ => None,
    }
}

fn derive_turnover(sales: Option<f64>, assets: Option<f64>) -> Option<f64> {
    match (sales, assets) {
        (Some(s), Some(a)) if a > 0.0 => Some(s / a),
        _ => None,
    }
}
