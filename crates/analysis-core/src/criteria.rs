/// Thresholds used by the scorers and the valuation engine.
///
/// Passed by reference into every call; never global state. The defaults are
/// the documented scoring history and changing them changes scores, so treat
/// them as configuration, not tuning knobs.
#[derive(Debug, Clone)]
pub struct ScoringCriteria {
    /// Buffett: ROE must exceed this (percent).
    pub roe_min: f64,
    /// Graham: P/E must be below this.
    pub pe_max: f64,
    /// Graham: price-to-book must be below this.
    pub pb_max: f64,
    /// Graham: debt/equity must be below this.
    pub graham_debt_to_equity_max: f64,
    /// Graham: current ratio must exceed this.
    pub graham_current_ratio_min: f64,
    /// Graham: share of recent periods that must pay a dividend.
    pub dividend_consistency_ratio: f64,
    /// Buffett and Lynch: debt/equity must be below this.
    pub debt_to_equity_max: f64,
    /// ROCE floor, kept for external screeners that filter on it.
    pub roce_min: f64,
    /// Lynch: EPS/profit growth must exceed this (percent).
    pub growth_min: f64,
    /// Lynch: PEG must be below this. Distinct from `peg_risk_threshold`.
    pub peg_max: f64,
    /// Lynch: marks handed to the business-simplicity stub factor.
    pub simplicity_marks: u32,
    /// Piotroski: liquidity snapshot threshold (current ratio).
    pub piotroski_current_ratio_min: f64,
    /// Multi-year checks look at this many trailing periods...
    pub history_window: usize,
    /// ...and need at least this many to evaluate at all.
    pub min_history: usize,
    /// Valuation: D/E above this caps the decision at HOLD.
    pub high_debt_threshold: f64,
    /// Valuation: PEG above this downgrades the decision one step.
    /// Deliberately separate from the Lynch `peg_max`.
    pub peg_risk_threshold: f64,
    /// Valuation: growth-PE cap for the Lynch fair value.
    pub growth_pe_cap: f64,
    /// Valuation: conservative multiple when capped growth is non-positive.
    pub conservative_growth_pe: f64,
}

impl Default for ScoringCriteria {
    fn default() -> Self {
        Self {
            roe_min: 15.0,
            pe_max: 15.0,
            pb_max: 1.5,
            graham_debt_to_equity_max: 1.0,
            graham_current_ratio_min: 2.0,
            dividend_consistency_ratio: 0.6,
            debt_to_equity_max: 0.5,
            roce_min: 15.0,
            growth_min: 10.0,
            peg_max: 1.5,
            simplicity_marks: 2,
            piotroski_current_ratio_min: 1.5,
            history_window: 5,
            min_history: 3,
            high_debt_threshold: 2.0,
            peg_risk_threshold: 2.5,
            growth_pe_cap: 25.0,
            conservative_growth_pe: 10.0,
        }
    }
}
