//! Display helpers for prices, changes and Indian-style magnitudes.

const CRORE: f64 = 1e7;
const LAKH: f64 = 1e5;

/// `+150.75 (+0.67%)`
pub fn format_change(change: f64, change_percent: f64) -> String {
    format!("{:+.2} ({:+.2}%)", change, change_percent)
}

/// Payoff totals on the max-pain chart, e.g. `12.34 Cr`
pub fn format_crore(value: f64) -> String {
    format!("{:.2} Cr", value / CRORE)
}

/// Open interest in lakhs, e.g. `1.5L`
pub fn format_lakh(value: f64) -> String {
    format!("{:.1}L", value / LAKH)
}

/// OI change in thousands, e.g. `-12.35K`
pub fn format_thousands(value: f64) -> String {
    format!("{:.2}K", value / 1000.0)
}

/// PCR cell; the placeholder stands in for an undefined ratio
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.2}", r),
        None => "—".to_string(),
    }
}
