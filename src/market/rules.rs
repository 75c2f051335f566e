use crate::market::models::OptionContract;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Open-interest buildup inferred from price and OI co-movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Buildup {
    LongBuildup,
    ShortBuildup,
    LongUnwinding,
    ShortCovering,
    Unclassified,
}

/// Display category for a buildup label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Buildup {
    pub fn label(&self) -> &'static str {
        match self {
            Buildup::LongBuildup => "Long Buildup",
            Buildup::ShortBuildup => "Short Buildup",
            Buildup::LongUnwinding => "Long Unwinding",
            Buildup::ShortCovering => "Short Covering",
            Buildup::Unclassified => "—",
        }
    }

    pub fn bias(&self) -> Bias {
        match self {
            Buildup::LongBuildup | Buildup::ShortCovering => Bias::Bullish,
            Buildup::ShortBuildup | Buildup::LongUnwinding => Bias::Bearish,
            Buildup::Unclassified => Bias::Neutral,
        }
    }
}

impl fmt::Display for Buildup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify one contract by the signs of its price change and OI change.
///
/// | chng | chngInOI | label          |
/// |------|----------|----------------|
/// | > 0  | > 0      | Long Buildup   |
/// | < 0  | > 0      | Short Buildup  |
/// | < 0  | < 0      | Long Unwinding |
/// | > 0  | < 0      | Short Covering |
///
/// A zero (or NaN) on either axis, or no contract at all, is unclassified.
pub fn classify_buildup(option: Option<&OptionContract>) -> Buildup {
    let Some(option) = option else {
        return Buildup::Unclassified;
    };

    let price = option.chng;
    let oi = option.chng_in_oi;

    if price > 0.0 && oi > 0.0 {
        Buildup::LongBuildup
    } else if price < 0.0 && oi > 0.0 {
        Buildup::ShortBuildup
    } else if price < 0.0 && oi < 0.0 {
        Buildup::LongUnwinding
    } else if price > 0.0 && oi < 0.0 {
        Buildup::ShortCovering
    } else {
        Buildup::Unclassified
    }
}

/// Field a put-call ratio is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcrMetric {
    OpenInterest,
    Volume,
}

impl PcrMetric {
    fn value(&self, option: &OptionContract) -> f64 {
        match self {
            PcrMetric::OpenInterest => option.oi,
            PcrMetric::Volume => option.volume,
        }
    }
}

/// `put.metric / call.metric` for one strike.
///
/// `None` when either side is absent or the call-side metric is zero
/// (or not a number).
pub fn put_call_ratio(
    call: Option<&OptionContract>,
    put: Option<&OptionContract>,
    metric: PcrMetric,
) -> Option<f64> {
    let denominator = metric.value(call?);
    let numerator = metric.value(put?);
    ratio(numerator, denominator)
}

pub fn oi_pcr(call: Option<&OptionContract>, put: Option<&OptionContract>) -> Option<f64> {
    put_call_ratio(call, put, PcrMetric::OpenInterest)
}

pub fn volume_pcr(call: Option<&OptionContract>, put: Option<&OptionContract>) -> Option<f64> {
    put_call_ratio(call, put, PcrMetric::Volume)
}

/// Guarded division shared by per-strike and whole-chain ratios
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || denominator.is_nan() || numerator.is_nan() {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(chng: f64, chng_in_oi: f64) -> OptionContract {
        OptionContract {
            chng,
            chng_in_oi,
            ..OptionContract::with_oi(22500.0, 1000.0)
        }
    }

    #[test]
    fn test_buildup_table() {
        assert_eq!(classify_buildup(Some(&moved(5.0, 2000.0))), Buildup::LongBuildup);
        assert_eq!(classify_buildup(Some(&moved(-3.0, 1500.0))), Buildup::ShortBuildup);
        assert_eq!(classify_buildup(Some(&moved(-1.0, -10.0))), Buildup::LongUnwinding);
        assert_eq!(classify_buildup(Some(&moved(2.0, -700.0))), Buildup::ShortCovering);
    }

    #[test]
    fn test_buildup_zero_and_missing() {
        assert_eq!(classify_buildup(Some(&moved(0.0, 2000.0))), Buildup::Unclassified);
        assert_eq!(classify_buildup(Some(&moved(4.0, 0.0))), Buildup::Unclassified);
        assert_eq!(classify_buildup(Some(&moved(f64::NAN, 10.0))), Buildup::Unclassified);
        assert_eq!(classify_buildup(None), Buildup::Unclassified);
        assert_eq!(Buildup::Unclassified.label(), "—");
    }

    #[test]
    fn test_buildup_bias() {
        assert_eq!(Buildup::LongBuildup.bias(), Bias::Bullish);
        assert_eq!(Buildup::ShortCovering.bias(), Bias::Bullish);
        assert_eq!(Buildup::ShortBuildup.bias(), Bias::Bearish);
        assert_eq!(Buildup::LongUnwinding.bias(), Bias::Bearish);
        assert_eq!(Buildup::Unclassified.bias(), Bias::Neutral);
    }

    #[test]
    fn test_pcr_guards() {
        let call = OptionContract {
            volume: 400.0,
            ..OptionContract::with_oi(100.0, 2000.0)
        };
        let put = OptionContract {
            volume: 100.0,
            ..OptionContract::with_oi(100.0, 3000.0)
        };
        let dead_call = OptionContract::with_oi(100.0, 0.0);

        assert_eq!(oi_pcr(Some(&call), Some(&put)), Some(1.5));
        assert_eq!(volume_pcr(Some(&call), Some(&put)), Some(0.25));
        assert_eq!(oi_pcr(Some(&dead_call), Some(&put)), None);
        assert_eq!(oi_pcr(None, Some(&put)), None);
        assert_eq!(oi_pcr(Some(&call), None), None);
    }
}
