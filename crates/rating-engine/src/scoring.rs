//! Short-term and long-term scores.
//!
//! Both scores start from a neutral 50, add one contribution per available
//! metric and are clamped to [1, 100] with two decimals. A missing input never
//! fails a score; it just contributes nothing.
//!
//! Fields are gated in one of two ways. `dividend_yield` and `debt_to_equity`
//! are applied whenever present, zero included. Every other field is skipped
//! when absent *or* exactly zero.

use analysis_core::MetricsRecord;

const BASELINE: f64 = 50.0;
const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 100.0;

/// Short-term volatility above this is penalized.
const VOLATILITY_THRESHOLD: f64 = 0.05;
/// Upper bound on the earnings growth reward.
const EARNINGS_GROWTH_CAP: f64 = 30.0;

/// Present and non-zero.
fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn finalize(score: f64) -> f64 {
    (score.clamp(MIN_SCORE, MAX_SCORE) * 100.0).round() / 100.0
}

/// Price relative to a moving average, minus one. `None` when either side is zero or missing.
fn premium_over(price: f64, average: Option<f64>) -> Option<f64> {
    let average = nonzero(average)?;
    if price == 0.0 {
        return None;
    }
    Some(price / average - 1.0)
}

pub fn short_term_score(record: &MetricsRecord) -> f64 {
    let mut score = BASELINE;

    // Market sensitivity
    if let Some(beta) = nonzero(record.beta) {
        score += if beta > 0.0 { 15.0 * beta } else { -15.0 * beta.abs() };
    }

    // Momentum vs 50-day average
    if let Some(premium) = premium_over(record.price, record.moving_avg_50) {
        score += 10.0 * premium;
    }

    if let Some(volatility) = record.volatility {
        if volatility > VOLATILITY_THRESHOLD {
            score -= 10.0 * volatility;
        }
    }

    finalize(score)
}

pub fn long_term_score(record: &MetricsRecord) -> f64 {
    let mut score = BASELINE;

    if let Some(alpha) = nonzero(record.alpha) {
        score += alpha / 6.0;
    }

    // Only whole-number P/E ratios are tiered; fractional values are skipped.
    if let Some(pe) = nonzero(record.pe_ratio) {
        if pe.is_finite() && pe.fract() == 0.0 {
            if pe < 15.0 {
                score += 20.0;
            } else if pe > 30.0 {
                score -= 15.0;
            }
        }
    }

    if let Some(premium) = premium_over(record.price, record.moving_avg_200) {
        score += 15.0 * premium;
    }

    if let Some(premium) = premium_over(record.price, record.moving_avg_50) {
        score += 5.0 * premium;
    }

    if let Some(growth) = nonzero(record.revenue_growth) {
        score += 15.0 * growth;
    }

    if let Some(growth) = nonzero(record.earnings_growth) {
        score += (8.0 * growth).min(EARNINGS_GROWTH_CAP);
    }

    if let Some(dividend_yield) = record.dividend_yield {
        score += dividend_yield * 10.0;
    }

    if let Some(d2e) = record.debt_to_equity {
        if d2e < 1.0 {
            score += 5.0;
        } else if d2e > 2.0 {
            score -= 10.0;
        }
    }

    finalize(score)
}
