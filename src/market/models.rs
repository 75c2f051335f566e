use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A tradable index at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,

    // Previous observed price, only used for the up/down flash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_price: Option<f64>,
}

/// Direction of the last price move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flash {
    Up,
    Down,
    Flat,
}

impl Index {
    pub fn new(symbol: &str, name: &str, price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
            change_percent,
            prev_price: Some(price - change),
        }
    }

    pub fn flash(&self) -> Flash {
        match self.prev_price {
            Some(prev) if self.price > prev => Flash::Up,
            Some(prev) if self.price < prev => Flash::Down,
            _ => Flash::Flat,
        }
    }

    /// Close implied by the current price and the session change
    pub fn previous_close(&self) -> f64 {
        self.price - self.change
    }
}

/// One call or put contract at one strike for the selected expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub strike: f64,
    pub ltp: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<f64>,

    pub chng: f64,

    #[serde(rename = "chngInOI")]
    pub chng_in_oi: f64,

    pub oi: f64,
    pub volume: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_qty: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_qty: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_ltp: Option<f64>,
}

impl OptionContract {
    /// Bare contract with only strike and open interest, everything else zeroed
    pub fn with_oi(strike: f64, oi: f64) -> Self {
        Self {
            strike,
            ltp: 0.0,
            iv: None,
            chng: 0.0,
            chng_in_oi: 0.0,
            oi,
            volume: 0.0,
            bid: None,
            ask: None,
            bid_qty: None,
            ask_qty: None,
            prev_ltp: None,
        }
    }
}

/// Calls and puts for one underlying, one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChain {
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
    pub underlying_price: f64,
}

impl OptionChain {
    pub fn empty(underlying_price: f64) -> Self {
        Self {
            calls: Vec::new(),
            puts: Vec::new(),
            underlying_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    /// Drop invalid strikes, sort each side ascending, keep the first contract per strike
    pub fn normalized(mut self) -> Self {
        normalize_side(&mut self.calls);
        normalize_side(&mut self.puts);
        self
    }

    /// Sorted, deduplicated union of call and put strikes
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self
            .calls
            .iter()
            .chain(self.puts.iter())
            .map(|o| o.strike)
            .collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();
        strikes
    }

    /// Fill `prev_ltp` from the same strike and side of an earlier snapshot
    pub fn carry_prev_ltp(&mut self, previous: &OptionChain) {
        carry_side(&mut self.calls, &previous.calls);
        carry_side(&mut self.puts, &previous.puts);
    }
}

fn normalize_side(side: &mut Vec<OptionContract>) {
    side.retain(|o| o.strike.is_finite() && o.strike > 0.0);
    // stable sort keeps the first occurrence ahead of later duplicates
    side.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    side.dedup_by(|later, earlier| later.strike == earlier.strike);
}

fn carry_side(current: &mut [OptionContract], previous: &[OptionContract]) {
    let prev_by_strike: HashMap<u64, f64> = previous
        .iter()
        .map(|o| (o.strike.to_bits(), o.ltp))
        .collect();

    for contract in current.iter_mut() {
        if let Some(&ltp) = prev_by_strike.get(&contract.strike.to_bits()) {
            contract.prev_ltp = Some(ltp);
        }
    }
}

/// One row of replayed index ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NiftyTick {
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,

    #[serde(rename = "LTP")]
    pub ltp: f64,

    #[serde(rename = "Change", default)]
    pub change: f64,

    #[serde(rename = "Open", default)]
    pub open: Option<f64>,

    #[serde(rename = "High", default)]
    pub high: Option<f64>,

    #[serde(rename = "Low", default)]
    pub low: Option<f64>,

    #[serde(rename = "Close", default)]
    pub close: Option<f64>,
}

/// Where a snapshot actually came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Csv,
    Mock,
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataOrigin::Live => write!(f, "live"),
            DataOrigin::Csv => write!(f, "csv"),
            DataOrigin::Mock => write!(f, "mock"),
        }
    }
}

/// Snapshot plus its origin and any error that forced a fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedData<T> {
    pub data: T,
    pub source: DataOrigin,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> FetchedData<T> {
    pub fn ok(data: T, source: DataOrigin) -> Self {
        Self {
            data,
            source,
            error: None,
        }
    }

    pub fn fallback(data: T, error: String) -> Self {
        Self {
            data,
            source: DataOrigin::Mock,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(strike: f64, ltp: f64) -> OptionContract {
        OptionContract {
            ltp,
            ..OptionContract::with_oi(strike, 100.0)
        }
    }

    #[test]
    fn test_normalized_sorts_dedups_and_drops_bad_strikes() {
        let chain = OptionChain {
            calls: vec![
                contract(22600.0, 1.0),
                contract(22500.0, 2.0),
                contract(0.0, 3.0),
                contract(22500.0, 4.0),
                contract(f64::NAN, 5.0),
            ],
            puts: vec![contract(22550.0, 6.0)],
            underlying_price: 22540.0,
        }
        .normalized();

        let strikes: Vec<f64> = chain.calls.iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![22500.0, 22600.0]);
        // first 22500 wins
        assert_eq!(chain.calls[0].ltp, 2.0);
        assert_eq!(chain.strikes(), vec![22500.0, 22550.0, 22600.0]);
    }

    #[test]
    fn test_carry_prev_ltp_matches_same_strike() {
        let previous = OptionChain {
            calls: vec![contract(100.0, 12.5)],
            puts: vec![contract(100.0, 3.5)],
            underlying_price: 101.0,
        };
        let mut current = OptionChain {
            calls: vec![contract(100.0, 13.0), contract(150.0, 1.0)],
            puts: vec![contract(100.0, 3.0)],
            underlying_price: 102.0,
        };

        current.carry_prev_ltp(&previous);

        assert_eq!(current.calls[0].prev_ltp, Some(12.5));
        assert_eq!(current.calls[1].prev_ltp, None);
        assert_eq!(current.puts[0].prev_ltp, Some(3.5));
    }

    #[test]
    fn test_index_flash() {
        let mut nifty = Index::new("NIFTY 50", "NIFTY 50", 22500.0, 150.75, 0.67);
        assert_eq!(nifty.flash(), Flash::Up);

        nifty.prev_price = Some(22600.0);
        assert_eq!(nifty.flash(), Flash::Down);

        nifty.prev_price = None;
        assert_eq!(nifty.flash(), Flash::Flat);
    }

    #[test]
    fn test_option_contract_wire_names() {
        let json = r#"{"strike":22500,"ltp":101.5,"chng":2.5,"chngInOI":1200,"oi":50000,"volume":800,"bidQty":75}"#;
        let parsed: OptionContract = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.chng_in_oi, 1200.0);
        assert_eq!(parsed.bid_qty, Some(75.0));
        assert_eq!(parsed.iv, None);

        let back = serde_json::to_value(&parsed).unwrap();
        assert!(back.get("chngInOI").is_some());
        assert!(back.get("ask").is_none());
    }
}
