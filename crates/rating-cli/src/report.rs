use analysis_core::RankedEntry;
use std::fmt::Write;

pub const METRIC_GUIDE: &str = "\
Scoring Factors for Short-Term Score:
- Beta: (Weighing: High) Sensitivity of the asset to the overall market, computed as the
  covariance of the asset's daily returns with the benchmark's divided by the benchmark's variance.
- Price / 50-Day Moving Average: (Weighing: Medium) Captures short-term momentum.
- Volatility: (Weighing: Medium) Penalizes high short-term volatility to reduce risk.

Scoring Factors for Long-Term Score:
- Alpha: (Weighing: Medium) Cumulative return over the benchmark across the risk window.
- Price/Earnings Ratio: (Weighing: Medium) Rewards low P/E (<15), penalizes high P/E (>30).
- Price / 200-Day Moving Average: (Weighing: High) Indicates long-term trends.
- Price / 50-Day Moving Average: (Weighing: Medium) Indicates shorter-term trends for context.
- Revenue Growth: (Weighing: Medium) Rewards consistent revenue growth.
- Earnings Growth: (Weighing: High) Rewards consistent earnings growth, capped at 30 points.
- Dividend Yield: (Weighing: Medium) Rewards companies paying dividends.
- Debt-to-Equity Ratio: (Weighing: Medium) Rewards low debt (<1) and penalizes high debt (>2).
";

/// Shortest form that still shows a decimal point (85.0, 72.5, 61.37).
fn format_score(score: f64) -> String {
    format!("{:?}", score)
}

/// Fixed-width ranking table, one line per entry, ranks starting at 1.
pub fn render_rankings(entries: &[RankedEntry]) -> String {
    let mut out = String::from("\nFinal Rankings:\n");
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "#{}: {:<35} Ticker: {:<6} Short-Term Score: {:<6} Long-Term Score: {:<6}",
            i + 1,
            entry.name,
            entry.ticker,
            format_score(entry.short_term_score),
            format_score(entry.long_term_score),
        );
    }
    out
}
