use analysis_core::{
    round2, ConfidenceLevel, Decision, FinancialRecord, GrahamSource, PriceBands, PriceZone,
    RawScores, ScoringCriteria, ValuationResult, ValuationStatus,
};
use graham_analysis::compute_graham_number;

/// Fair-value estimation and the final buy/hold/avoid call.
///
/// Combines a value anchor (Graham Number) and a growth anchor (Lynch fair
/// value) into a composite fair value, bands the current price against it,
/// crosses that with the score-based decision, then applies the risk
/// overrides in a fixed order: high-debt cap first, PEG downgrade second.
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn valuate(
        &self,
        record: &FinancialRecord,
        scores: RawScores,
        criteria: &ScoringCriteria,
    ) -> ValuationResult {
        let mut result = ValuationResult::empty();

        // Mandatory inputs. Without EPS and book value there is no fair
        // value to compute, so stop before anything else.
        let eps = match record.latest_eps {
            Some(e) => e,
            None => {
                result.risk_flags.push("Missing EPS data".to_string());
                return result;
            }
        };
        let book_value = match record.book_value {
            Some(b) => b,
            None => {
                result.risk_flags.push("Missing Book Value data".to_string());
                return result;
            }
        };

        result.current_price = record.current_price;

        // Loss-making companies are an unconditional AVOID; fair-value math
        // is meaningless on negative earnings.
        if eps <= 0.0 {
            result.final_decision = Decision::Avoid;
            result
                .risk_flags
                .push("Loss-making company (EPS ≤ 0)".to_string());
            result.valuation_status = Some(ValuationStatus::NotApplicable);
            result.confidence = Some(ConfidenceLevel::High);
            return result;
        }

        // Graham Number: the externally supplied positive value wins over
        // the computed one.
        let (graham_number, graham_source) = match record.graham_number.filter(|&g| g > 0.0) {
            Some(g) => (g, GrahamSource::External),
            // eps > 0 was checked above; only a non-positive book value can
            // make the computation come back empty.
            None => (
                compute_graham_number(eps, book_value).unwrap_or(0.0),
                GrahamSource::Calculated,
            ),
        };
        result.graham_number = Some(round2(graham_number));
        result.data_source = Some(graham_source);

        // Lynch fair value: growth PE capped, with a conservative multiple
        // when growth is non-positive or missing.
        let capped_growth_pe = record
            .profit_growth_5y
            .unwrap_or(0.0)
            .min(criteria.growth_pe_cap);
        let effective_growth_pe = if capped_growth_pe > 0.0 {
            capped_growth_pe
        } else {
            criteria.conservative_growth_pe
        };
        let lynch_fair_value = eps * effective_growth_pe;
        result.lynch_fair_value = Some(round2(lynch_fair_value));

        let fair_value = (graham_number + lynch_fair_value) / 2.0;
        result.fair_value = Some(round2(fair_value));

        let bands = PriceBands {
            strong_buy_below: Some(round2(fair_value * 0.75)),
            buy_below: Some(round2(fair_value * 0.85)),
            hold_above: Some(round2(fair_value * 1.10)),
            sell_above: Some(round2(fair_value * 1.25)),
        };
        result.price_bands = bands;

        let (zone, status) = match record.current_price {
            None => (PriceZone::Unknown, None),
            Some(price) => {
                if price <= fair_value * 0.75 {
                    (PriceZone::StrongBuy, Some(ValuationStatus::DeeplyUndervalued))
                } else if price <= fair_value * 0.85 {
                    (PriceZone::Buy, Some(ValuationStatus::Undervalued))
                } else if price <= fair_value * 1.10 {
                    (PriceZone::Hold, Some(ValuationStatus::FairlyValued))
                } else if price <= fair_value * 1.25 {
                    (PriceZone::Sell, Some(ValuationStatus::Overvalued))
                } else {
                    (PriceZone::StrongSell, Some(ValuationStatus::HighlyOvervalued))
                }
            }
        };
        result.price_zone = Some(zone);
        result.valuation_status = status;

        let score_decision = score_decision(scores);
        result.score_decision = Some(score_decision);
        result.final_decision = decision_matrix(score_decision, zone);

        // Risk override 1: high debt caps anything better than HOLD.
        if let Some(de) = record.debt_to_equity {
            if de > criteria.high_debt_threshold {
                result.risk_flags.push(format!(
                    "High Debt (D/E: {:.2} > {})",
                    de, criteria.high_debt_threshold
                ));
                if result.final_decision.rank() > Decision::Hold.rank() {
                    tracing::debug!(
                        decision = ?result.final_decision,
                        "capping decision at HOLD due to high debt"
                    );
                    result.final_decision = Decision::Hold;
                    result
                        .risk_flags
                        .push("Decision capped at HOLD due to high debt".to_string());
                }
            }
        }

        // Risk override 2: expensive growth downgrades one step. Runs after
        // the debt cap; the order is part of the contract.
        if let (Some(pe), Some(growth)) = (record.stock_pe, record.profit_growth_5y) {
            if growth > 0.0 {
                let peg = pe / growth;
                if peg > criteria.peg_risk_threshold {
                    result.risk_flags.push(format!(
                        "High PEG Ratio ({:.2} > {})",
                        peg, criteria.peg_risk_threshold
                    ));
                    let downgraded = result.final_decision.downgrade();
                    tracing::debug!(
                        from = ?result.final_decision,
                        to = ?downgraded,
                        peg,
                        "downgrading decision on PEG risk"
                    );
                    result.final_decision = downgraded;
                }
            }
        }

        result.confidence = Some(confidence(record, &result));
        result
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// BUY when at least three of the four scores clear 7, HOLD at exactly two,
/// AVOID otherwise.
fn score_decision(scores: RawScores) -> Decision {
    match scores.count_at_least(7) {
        n if n >= 3 => Decision::Buy,
        2 => Decision::Hold,
        _ => Decision::Avoid,
    }
}

/// Score decision × price zone. AVOID dominates every zone; a BUY-grade
/// score in an overvalued zone degrades to HOLD or AVOID.
fn decision_matrix(score: Decision, zone: PriceZone) -> Decision {
    use Decision as D;
    use PriceZone as Z;
    match (score, zone) {
        (D::Buy, Z::StrongBuy) => D::StrongBuy,
        (D::Buy, Z::Buy) => D::Buy,
        (D::Buy, Z::Hold) => D::Hold,
        (D::Buy, Z::Sell) | (D::Buy, Z::StrongSell) => D::Avoid,
        // Trust the score when the price is unknown.
        (D::Buy, Z::Unknown) => D::Buy,
        (D::Hold, Z::StrongBuy) => D::Accumulate,
        (D::Hold, Z::Buy) | (D::Hold, Z::Hold) | (D::Hold, Z::Unknown) => D::Hold,
        (D::Hold, Z::Sell) | (D::Hold, Z::StrongSell) => D::Sell,
        (D::Avoid, _) => D::Avoid,
        _ => D::Hold,
    }
}

/// Five-point data-quality grade: price present, external Graham Number,
/// positive growth, debt data, and a clean risk-flag sheet.
fn confidence(record: &FinancialRecord, result: &ValuationResult) -> ConfidenceLevel {
    let mut points = 0u8;
    if record.current_price.is_some() {
        points += 1;
    }
    if result.data_source == Some(GrahamSource::External) {
        points += 1;
    }
    if record.profit_growth_5y.is_some_and(|g| g > 0.0) {
        points += 1;
    }
    if record.debt_to_equity.is_some() {
        points += 1;
    }
    if result.risk_flags.is_empty() {
        points += 1;
    }

    if points >= 4 {
        ConfidenceLevel::High
    } else if points >= 2 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(piotroski: u32, buffett: u32, graham: u32, lynch: u32) -> RawScores {
        RawScores {
            piotroski,
            buffett,
            graham,
            lynch,
        }
    }

    /// Petronet LNG-shaped inputs.
    fn base_record() -> FinancialRecord {
        FinancialRecord {
            latest_eps: Some(23.95),
            book_value: Some(137.0),
            stock_pe: Some(11.9),
            industry_pe: Some(8.0),
            profit_growth_5y: Some(7.0),
            debt_to_equity: Some(0.12),
            current_price: Some(285.0),
            ..Default::default()
        }
    }

    fn engine() -> ValuationEngine {
        ValuationEngine::new()
    }

    #[test]
    fn computes_fair_value_and_bands() {
        let result = engine().valuate(&base_record(), scores(6, 8, 9, 4), &Default::default());

        assert_eq!(result.data_source, Some(GrahamSource::Calculated));
        assert_eq!(result.graham_number, Some(271.71));
        // Growth 7 is positive and below the cap, so the growth PE is 7.
        assert_eq!(result.lynch_fair_value, Some(167.65));
        assert_eq!(result.fair_value, Some(219.68));
        assert_eq!(result.price_bands.strong_buy_below, Some(164.76));
        assert_eq!(result.price_bands.buy_below, Some(186.73));
        assert_eq!(result.price_bands.hold_above, Some(241.65));
        assert_eq!(result.price_bands.sell_above, Some(274.6));
        // 285 sits above the sell band.
        assert_eq!(result.price_zone, Some(PriceZone::StrongSell));
        assert_eq!(
            result.valuation_status,
            Some(ValuationStatus::HighlyOvervalued)
        );
    }

    #[test]
    fn external_graham_number_takes_precedence() {
        let mut record = base_record();
        record.graham_number = Some(300.0);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        assert_eq!(result.data_source, Some(GrahamSource::External));
        assert_eq!(result.graham_number, Some(300.0));
    }

    #[test]
    fn non_positive_external_graham_number_is_ignored() {
        let mut record = base_record();
        record.graham_number = Some(0.0);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        assert_eq!(result.data_source, Some(GrahamSource::Calculated));
    }

    #[test]
    fn negative_growth_uses_conservative_multiple() {
        let mut record = base_record();
        record.profit_growth_5y = Some(-4.0);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        // EPS 23.95 × conservative PE 10
        assert_eq!(result.lynch_fair_value, Some(239.5));
    }

    #[test]
    fn growth_pe_is_capped_at_25() {
        let mut record = base_record();
        record.profit_growth_5y = Some(40.0);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        assert_eq!(result.lynch_fair_value, Some(round2(23.95 * 25.0)));
    }

    #[test]
    fn missing_eps_is_data_insufficient() {
        let mut record = base_record();
        record.latest_eps = None;
        let result = engine().valuate(&record, scores(9, 10, 10, 10), &Default::default());
        assert_eq!(result.final_decision, Decision::DataInsufficient);
        assert!(result.risk_flags.iter().any(|f| f.contains("EPS")));
        assert_eq!(result.fair_value, None);
    }

    #[test]
    fn missing_book_value_is_data_insufficient() {
        let mut record = base_record();
        record.book_value = None;
        let result = engine().valuate(&record, scores(9, 10, 10, 10), &Default::default());
        assert_eq!(result.final_decision, Decision::DataInsufficient);
        assert!(result.risk_flags.iter().any(|f| f.contains("Book Value")));
    }

    #[test]
    fn loss_maker_is_avoided_regardless_of_scores() {
        let mut record = base_record();
        record.latest_eps = Some(-5.0);
        let result = engine().valuate(&record, scores(9, 10, 10, 10), &Default::default());
        assert_eq!(result.final_decision, Decision::Avoid);
        assert_eq!(result.valuation_status, Some(ValuationStatus::NotApplicable));
        assert_eq!(result.confidence, Some(ConfidenceLevel::High));
        assert!(result
            .risk_flags
            .iter()
            .any(|f| f.contains("Loss-making")));
    }

    #[test]
    fn score_decision_thresholds() {
        assert_eq!(score_decision(scores(7, 7, 7, 0)), Decision::Buy);
        assert_eq!(score_decision(scores(7, 7, 6, 0)), Decision::Hold);
        assert_eq!(score_decision(scores(7, 6, 6, 0)), Decision::Avoid);
        assert_eq!(score_decision(scores(9, 10, 10, 10)), Decision::Buy);
    }

    #[test]
    fn matrix_buy_score_in_hold_zone_is_hold() {
        // Fair value ≈ 219.68; a price inside (buyBelow, holdAbove] lands in
        // the HOLD zone, and a BUY-grade score there stays HOLD.
        let mut record = base_record();
        record.current_price = Some(220.0);
        let result = engine().valuate(&record, scores(8, 8, 8, 4), &Default::default());
        assert_eq!(result.score_decision, Some(Decision::Buy));
        assert_eq!(result.price_zone, Some(PriceZone::Hold));
        assert_eq!(result.final_decision, Decision::Hold);
        assert!(result.risk_flags.is_empty());
        assert_eq!(result.confidence, Some(ConfidenceLevel::High));
    }

    #[test]
    fn matrix_trusts_score_when_price_unknown() {
        let mut record = base_record();
        record.current_price = None;
        let result = engine().valuate(&record, scores(8, 8, 8, 4), &Default::default());
        assert_eq!(result.price_zone, Some(PriceZone::Unknown));
        assert_eq!(result.final_decision, Decision::Buy);
    }

    #[test]
    fn matrix_hold_score_in_strong_buy_zone_accumulates() {
        let mut record = base_record();
        record.current_price = Some(150.0);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        assert_eq!(result.price_zone, Some(PriceZone::StrongBuy));
        assert_eq!(result.final_decision, Decision::Accumulate);
    }

    #[test]
    fn matrix_avoid_score_dominates_every_zone() {
        for price in [100.0, 180.0, 220.0, 260.0, 400.0] {
            let mut record = base_record();
            record.current_price = Some(price);
            let result = engine().valuate(&record, scores(1, 2, 3, 4), &Default::default());
            assert_eq!(result.final_decision, Decision::Avoid);
        }
    }

    #[test]
    fn price_zone_is_monotone_in_price() {
        let zone_rank = |z: PriceZone| match z {
            PriceZone::StrongBuy => 0,
            PriceZone::Buy => 1,
            PriceZone::Hold => 2,
            PriceZone::Sell => 3,
            PriceZone::StrongSell => 4,
            PriceZone::Unknown => unreachable!(),
        };
        let mut last_rank = 0;
        for price in (1..=400).map(|p| p as f64) {
            let mut record = base_record();
            record.current_price = Some(price);
            let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
            let rank = zone_rank(result.price_zone.unwrap());
            assert!(rank >= last_rank, "zone got better as price rose at {price}");
            last_rank = rank;
        }
        assert_eq!(last_rank, 4);
    }

    #[test]
    fn high_debt_caps_at_hold_before_peg_downgrades() {
        // Deep-undervalued BUY-grade stock would be STRONG_BUY, but D/E 3
        // caps it at HOLD and PEG 3 then downgrades one step to SELL.
        let record = FinancialRecord {
            latest_eps: Some(20.0),
            book_value: Some(100.0),
            current_price: Some(100.0),
            debt_to_equity: Some(3.0),
            stock_pe: Some(30.0),
            profit_growth_5y: Some(10.0),
            ..Default::default()
        };
        let result = engine().valuate(&record, scores(8, 8, 8, 4), &Default::default());
        assert_eq!(result.price_zone, Some(PriceZone::StrongBuy));
        assert_eq!(result.final_decision, Decision::Sell);
        assert!(result.risk_flags.iter().any(|f| f.contains("High Debt")));
        assert!(result
            .risk_flags
            .iter()
            .any(|f| f.contains("capped at HOLD")));
        assert!(result.risk_flags.iter().any(|f| f.contains("High PEG")));
    }

    #[test]
    fn high_debt_alone_does_not_touch_hold_or_worse() {
        let mut record = base_record();
        record.debt_to_equity = Some(3.0);
        // STRONG_SELL zone with HOLD score → SELL; the cap only pulls down
        // decisions better than HOLD, so SELL stays.
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        assert_eq!(result.final_decision, Decision::Sell);
        assert!(result.risk_flags.iter().any(|f| f.contains("High Debt")));
        assert!(!result.risk_flags.iter().any(|f| f.contains("capped")));
    }

    #[test]
    fn peg_risk_needs_positive_growth() {
        let mut record = base_record();
        record.stock_pe = Some(100.0);
        record.profit_growth_5y = Some(-5.0);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        assert!(!result.risk_flags.iter().any(|f| f.contains("PEG")));
    }

    #[test]
    fn confidence_degrades_with_missing_data() {
        // No price, no external Graham Number, no growth, no debt data, and
        // a HOLD-zone record: flags stay empty so exactly one point.
        let record = FinancialRecord {
            latest_eps: Some(10.0),
            book_value: Some(50.0),
            ..Default::default()
        };
        let result = engine().valuate(&record, scores(0, 0, 0, 0), &Default::default());
        assert_eq!(result.confidence, Some(ConfidenceLevel::Low));
    }

    #[test]
    fn petronet_end_to_end_is_sell_with_high_confidence() {
        let mut record = base_record();
        record.graham_number = Some(271.71);
        let result = engine().valuate(&record, scores(6, 8, 9, 4), &Default::default());
        // HOLD score × STRONG_SELL zone → SELL; PEG 11.9/7 ≈ 1.7 stays quiet.
        assert_eq!(result.score_decision, Some(Decision::Hold));
        assert_eq!(result.final_decision, Decision::Sell);
        assert!(result.risk_flags.is_empty());
        assert_eq!(result.confidence, Some(ConfidenceLevel::High));
    }
}
