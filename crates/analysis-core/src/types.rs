use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One financial snapshot for one company, as delivered by the data-fetch
/// collaborator (screener scrape or any other source with the same shape).
///
/// Every scalar is either a finite number or absent. Callers must normalize
/// NaN/Infinity to `None` before scoring (see [`FinancialRecord::sanitize`]);
/// the scorers themselves treat non-finite values as a contract violation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialRecord {
    // Valuation inputs
    #[serde(rename = "stockPE")]
    pub stock_pe: Option<f64>,
    #[serde(rename = "industryPE")]
    pub industry_pe: Option<f64>,
    pub book_value: Option<f64>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,

    // Profitability / efficiency
    pub roe: Option<f64>,
    pub roce: Option<f64>,
    pub roa: Option<f64>,
    pub roa_prev_year: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub roic: Option<f64>,
    pub interest_coverage: Option<f64>,

    // Leverage / liquidity
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,

    // Cash generation
    pub fcf: Option<f64>,
    pub fcf_prev_year: Option<f64>,
    #[serde(rename = "priceToFCF")]
    pub price_to_fcf: Option<f64>,

    // Growth
    #[serde(rename = "profitGrowth3Y")]
    pub profit_growth_3y: Option<f64>,
    #[serde(rename = "profitGrowth5Y")]
    pub profit_growth_5y: Option<f64>,
    #[serde(rename = "profitGrowth10Y")]
    pub profit_growth_10y: Option<f64>,
    #[serde(rename = "salesGrowth3Y")]
    pub sales_growth_3y: Option<f64>,
    #[serde(rename = "salesGrowth5Y")]
    pub sales_growth_5y: Option<f64>,
    #[serde(rename = "salesGrowth10Y")]
    pub sales_growth_10y: Option<f64>,
    pub eps_growth: Option<f64>,
    pub peg_ratio: Option<f64>,

    // Value anchors
    pub price_to_book: Option<f64>,
    pub graham_number: Option<f64>,

    // Latest-period scalars
    #[serde(rename = "latestEPS")]
    pub latest_eps: Option<f64>,
    pub latest_net_profit: Option<f64>,
    #[serde(rename = "latestCFO")]
    pub latest_cfo: Option<f64>,
    pub latest_borrowings: Option<f64>,
    pub latest_equity: Option<f64>,

    pub historical: HistoricalSeries,
}

/// Parallel annual series, ordered oldest to newest. The last element is the
/// latest period, the second-to-last the previous year. An empty series means
/// the data was not available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoricalSeries {
    pub sales: Vec<f64>,
    pub net_profit: Vec<f64>,
    pub opm_percent: Vec<f64>,
    pub eps: Vec<f64>,
    pub dividend_payout: Vec<f64>,
    pub borrowings: Vec<f64>,
    pub equity_capital: Vec<f64>,
    pub reserves: Vec<f64>,
    pub total_assets: Vec<f64>,
    pub cfo: Vec<f64>,
    pub cfi: Vec<f64>,
    pub cff: Vec<f64>,
    pub other_assets: Vec<f64>,
    pub other_liabilities: Vec<f64>,
}

impl FinancialRecord {
    /// Normalize non-finite scalars to absent. A historical series containing
    /// any non-finite entry is dropped whole, since removing single entries
    /// would misalign the parallel series.
    ///
    /// Transport layers call this before handing a record to the scorers.
    pub fn sanitize(mut self) -> Self {
        fn finite(v: Option<f64>) -> Option<f64> {
            v.filter(|x| x.is_finite())
        }
        fn finite_series(s: &mut Vec<f64>) {
            if s.iter().any(|x| !x.is_finite()) {
                s.clear();
            }
        }

        self.stock_pe = finite(self.stock_pe);
        self.industry_pe = finite(self.industry_pe);
        self.book_value = finite(self.book_value);
        self.current_price = finite(self.current_price);
        self.market_cap = finite(self.market_cap);
        self.dividend_yield = finite(self.dividend_yield);
        self.roe = finite(self.roe);
        self.roce = finite(self.roce);
        self.roa = finite(self.roa);
        self.roa_prev_year = finite(self.roa_prev_year);
        self.asset_turnover = finite(self.asset_turnover);
        self.roic = finite(self.roic);
        self.interest_coverage = finite(self.interest_coverage);
        self.debt_to_equity = finite(self.debt_to_equity);
        self.current_ratio = finite(self.current_ratio);
        self.fcf = finite(self.fcf);
        self.fcf_prev_year = finite(self.fcf_prev_year);
        self.price_to_fcf = finite(self.price_to_fcf);
        self.profit_growth_3y = finite(self.profit_growth_3y);
        self.profit_growth_5y = finite(self.profit_growth_5y);
        self.profit_growth_10y = finite(self.profit_growth_10y);
        self.sales_growth_3y = finite(self.sales_growth_3y);
        self.sales_growth_5y = finite(self.sales_growth_5y);
        self.sales_growth_10y = finite(self.sales_growth_10y);
        self.eps_growth = finite(self.eps_growth);
        self.peg_ratio = finite(self.peg_ratio);
        self.price_to_book = finite(self.price_to_book);
        self.graham_number = finite(self.graham_number);
        self.latest_eps = finite(self.latest_eps);
        self.latest_net_profit = finite(self.latest_net_profit);
        self.latest_cfo = finite(self.latest_cfo);
        self.latest_borrowings = finite(self.latest_borrowings);
        self.latest_equity = finite(self.latest_equity);

        let h = &mut self.historical;
        finite_series(&mut h.sales);
        finite_series(&mut h.net_profit);
        finite_series(&mut h.opm_percent);
        finite_series(&mut h.eps);
        finite_series(&mut h.dividend_payout);
        finite_series(&mut h.borrowings);
        finite_series(&mut h.equity_capital);
        finite_series(&mut h.reserves);
        finite_series(&mut h.total_assets);
        finite_series(&mut h.cfo);
        finite_series(&mut h.cfi);
        finite_series(&mut h.cff);
        finite_series(&mut h.other_assets);
        finite_series(&mut h.other_liabilities);

        self
    }
}

/// Latest entry of a series (the last element), if any.
pub fn latest(series: &[f64]) -> Option<f64> {
    series.last().copied()
}

/// Previous-year entry of a series (the second-to-last element), if any.
pub fn previous(series: &[f64]) -> Option<f64> {
    if series.len() > 1 {
        Some(series[series.len() - 2])
    } else {
        None
    }
}

/// Final `n` entries of a series (all of it when shorter).
pub fn tail_window(series: &[f64], n: usize) -> &[f64] {
    &series[series.len().saturating_sub(n)..]
}

/// Dual-sourced metric precedence: the externally supplied value wins over
/// the locally computed fallback.
pub fn prefer_external(external: Option<f64>, calculated: Option<f64>) -> Option<f64> {
    external.or(calculated)
}

/// Integer percentage, rounded half-up like the upstream JS `Math.round`.
pub fn percent_of(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as u32
}

/// Round a monetary value to 2 decimals for display parity with upstream.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Tri-state factor outcome. A factor whose prerequisite data is absent or
/// too short resolves to `InsufficientData`, which scores like a fail but
/// stays distinguishable in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactorOutcome {
    Pass,
    #[default]
    Fail,
    InsufficientData,
}

impl FactorOutcome {
    pub fn from_check(pass: Option<bool>) -> Self {
        match pass {
            Some(true) => FactorOutcome::Pass,
            Some(false) => FactorOutcome::Fail,
            None => FactorOutcome::InsufficientData,
        }
    }
}

/// One scoring factor: the observed value(s) for display, the human-readable
/// pass rule, and the marks awarded (0 or the factor's full weight).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorResult {
    pub value: serde_json::Value,
    pub condition: String,
    pub pass: bool,
    pub marks: u32,
    #[serde(skip)]
    pub outcome: FactorOutcome,
}

impl FactorResult {
    pub fn new(
        value: serde_json::Value,
        condition: impl Into<String>,
        outcome: FactorOutcome,
        weight: u32,
    ) -> Self {
        let pass = outcome == FactorOutcome::Pass;
        Self {
            value,
            condition: condition.into(),
            pass,
            marks: if pass { weight } else { 0 },
            outcome,
        }
    }
}

/// Output of one scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub name: String,
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub factors: BTreeMap<String, FactorResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub graham_number: Option<f64>,
    pub interpretation: String,
}

impl ScoreResult {
    /// Assemble a result from named factors; `interpret` maps the summed
    /// score to the scorer's tier label.
    pub fn from_factors(
        name: impl Into<String>,
        total: u32,
        factors: BTreeMap<String, FactorResult>,
        interpret: impl Fn(u32) -> &'static str,
    ) -> Self {
        let score: u32 = factors.values().map(|f| f.marks).sum();
        Self {
            name: name.into(),
            score,
            total,
            percent: percent_of(score, total),
            interpretation: interpret(score).to_string(),
            graham_number: None,
            factors,
        }
    }
}

/// Raw scores from the four scorers, as consumed by the valuation engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawScores {
    pub piotroski: u32,
    pub buffett: u32,
    pub graham: u32,
    pub lynch: u32,
}

impl RawScores {
    pub fn as_array(&self) -> [u32; 4] {
        [self.piotroski, self.buffett, self.graham, self.lynch]
    }

    /// How many of the four scores clear the given bar.
    pub fn count_at_least(&self, bar: u32) -> u32 {
        self.as_array().iter().filter(|&&s| s >= bar).count() as u32
    }
}

/// Final investment decision, ordered worst to best for the risk-cap rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Avoid,
    Sell,
    Hold,
    Accumulate,
    Buy,
    StrongBuy,
    DataInsufficient,
}

impl Decision {
    /// Rank on the risk-cap scale. `DataInsufficient` never reaches the
    /// override rules; it ranks like HOLD for completeness.
    pub fn rank(&self) -> u8 {
        match self {
            Decision::Avoid => 0,
            Decision::Sell => 1,
            Decision::Hold | Decision::DataInsufficient => 2,
            Decision::Accumulate => 3,
            Decision::Buy => 4,
            Decision::StrongBuy => 5,
        }
    }

    /// One-step downgrade used by the PEG risk rule. ACCUMULATE and HOLD
    /// both fall to SELL; AVOID stays put.
    pub fn downgrade(&self) -> Decision {
        match self {
            Decision::StrongBuy => Decision::Buy,
            Decision::Buy => Decision::Hold,
            Decision::Accumulate | Decision::Hold => Decision::Sell,
            Decision::Sell | Decision::Avoid => Decision::Avoid,
            Decision::DataInsufficient => Decision::DataInsufficient,
        }
    }
}

/// Where the current price sits relative to the fair-value bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceZone {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationStatus {
    DeeplyUndervalued,
    Undervalued,
    FairlyValued,
    Overvalued,
    HighlyOvervalued,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Provenance of the Graham Number used in valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrahamSource {
    External,
    Calculated,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBands {
    pub strong_buy_below: Option<f64>,
    pub buy_below: Option<f64>,
    pub hold_above: Option<f64>,
    pub sell_above: Option<f64>,
}

/// Fair-value estimate, price banding, and the risk-adjusted final decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub current_price: Option<f64>,
    pub fair_value: Option<f64>,
    pub graham_number: Option<f64>,
    pub lynch_fair_value: Option<f64>,
    pub price_bands: PriceBands,
    pub price_zone: Option<PriceZone>,
    pub score_decision: Option<Decision>,
    pub final_decision: Decision,
    pub valuation_status: Option<ValuationStatus>,
    pub confidence: Option<ConfidenceLevel>,
    pub risk_flags: Vec<String>,
    pub data_source: Option<GrahamSource>,
}

impl ValuationResult {
    /// Result skeleton before any computation has succeeded.
    pub fn empty() -> Self {
        Self {
            current_price: None,
            fair_value: None,
            graham_number: None,
            lynch_fair_value: None,
            price_bands: PriceBands::default(),
            price_zone: None,
            score_decision: None,
            final_decision: Decision::DataInsufficient,
            valuation_status: None,
            confidence: None,
            risk_flags: Vec::new(),
            data_source: None,
        }
    }
}

/// `"x/9"`-style one-liners for quick display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub piotroski: String,
    pub buffett: String,
    pub graham: String,
    pub lynch: String,
}

/// The aggregate analysis for one company: four scorers + valuation,
/// plus legacy aliases kept for older API consumers
/// (`verdict`/`score`/`total`/`percent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    pub company: String,
    pub timestamp: DateTime<Utc>,
    pub final_decision: Decision,
    pub scores_above_7: u32,
    pub overall_percent: u32,
    pub piotroski: ScoreResult,
    pub buffett: ScoreResult,
    pub graham: ScoreResult,
    pub lynch: ScoreResult,
    pub summary: ScoreSummary,
    pub valuation: ValuationResult,
    // Legacy aliases
    pub verdict: Decision,
    pub score: u32,
    pub total: u32,
    pub percent: u32,
}
