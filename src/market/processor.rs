use crate::market::config;
use crate::market::models::{OptionChain, OptionContract};
use crate::market::rules::{self, Buildup};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Total buyer payoff (writer loss) if the underlying settled at `strike`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub strike: f64,
    pub payoff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxPain {
    pub chart_data: Vec<PayoffPoint>,
    pub max_pain_strike: f64,
    pub strikes: Vec<f64>,
}

impl MaxPain {
    fn empty() -> Self {
        Self {
            chart_data: Vec::new(),
            max_pain_strike: 0.0,
            strikes: Vec::new(),
        }
    }
}

/// Strike at which option writers lose the least at expiry.
///
/// For each candidate `k` in the union of strikes:
/// `Σ (k − call.strike)·call.oi` over calls below `k` plus
/// `Σ (put.strike − k)·put.oi` over puts above `k`.
/// The scan is ascending with a strict `<`, so the lowest strike wins ties.
/// Either side empty gives an empty result with strike 0.
pub fn calculate_max_pain(chain: &OptionChain) -> MaxPain {
    if chain.calls.is_empty() || chain.puts.is_empty() {
        return MaxPain::empty();
    }

    let strikes = chain.strikes();
    if strikes.is_empty() {
        return MaxPain::empty();
    }

    let chart_data: Vec<PayoffPoint> = strikes
        .iter()
        .map(|&k| PayoffPoint {
            strike: k,
            payoff: payoff_at(chain, k),
        })
        .collect();

    let mut min_payoff = f64::INFINITY;
    let mut max_pain_strike = 0.0;
    for point in &chart_data {
        if point.payoff < min_payoff {
            min_payoff = point.payoff;
            max_pain_strike = point.strike;
        }
    }

    MaxPain {
        chart_data,
        max_pain_strike,
        strikes,
    }
}

/// Intrinsic value owed to all holders if expiry settles at `expiry_strike`
pub fn payoff_at(chain: &OptionChain, expiry_strike: f64) -> f64 {
    let calls: f64 = chain
        .calls
        .iter()
        .filter(|c| c.strike < expiry_strike)
        .map(|c| (expiry_strike - c.strike) * c.oi)
        .sum();

    let puts: f64 = chain
        .puts
        .iter()
        .filter(|p| p.strike > expiry_strike)
        .map(|p| (p.strike - expiry_strike) * p.oi)
        .sum();

    calls + puts
}

/// Closest strike to the underlying, first one wins on equal distance; 0 when none
pub fn find_atm_strike(strikes: &[f64], underlying_price: f64) -> f64 {
    let Some(&first) = strikes.first() else {
        return 0.0;
    };
    let mut closest = first;
    for &strike in &strikes[1..] {
        if (strike - underlying_price).abs() < (closest - underlying_price).abs() {
            closest = strike;
        }
    }
    closest
}

/// Call and put side by side at one strike, with derived labels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeRow {
    pub strike: f64,
    pub call: Option<OptionContract>,
    pub put: Option<OptionContract>,
    pub call_buildup: Buildup,
    pub put_buildup: Buildup,
    pub oi_pcr: Option<f64>,
    pub volume_pcr: Option<f64>,
}

struct SideMaps<'a> {
    calls: HashMap<u64, &'a OptionContract>,
    puts: HashMap<u64, &'a OptionContract>,
}

impl<'a> SideMaps<'a> {
    // later duplicates overwrite earlier ones, same as building a Map from the array
    fn new(chain: &'a OptionChain) -> Self {
        Self {
            calls: chain.calls.iter().map(|c| (c.strike.to_bits(), c)).collect(),
            puts: chain.puts.iter().map(|p| (p.strike.to_bits(), p)).collect(),
        }
    }

    fn call(&self, strike: f64) -> Option<&'a OptionContract> {
        self.calls.get(&strike.to_bits()).copied()
    }

    fn put(&self, strike: f64) -> Option<&'a OptionContract> {
        self.puts.get(&strike.to_bits()).copied()
    }
}

pub fn build_strike_rows(chain: &OptionChain) -> Vec<StrikeRow> {
    let sides = SideMaps::new(chain);

    chain
        .strikes()
        .into_iter()
        .map(|strike| {
            let call = sides.call(strike);
            let put = sides.put(strike);
            StrikeRow {
                strike,
                call: call.cloned(),
                put: put.cloned(),
                call_buildup: rules::classify_buildup(call),
                put_buildup: rules::classify_buildup(put),
                oi_pcr: rules::oi_pcr(call, put),
                volume_pcr: rules::volume_pcr(call, put),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OiChangePoint {
    pub strike: f64,
    pub call_chng_oi: f64,
    pub put_chng_oi: f64,
    pub call_ltp_pct_chng: f64,
    pub put_ltp_pct_chng: f64,
}

/// Percent change of LTP against `ltp − chng`, rounded to 2 places; 0 when undefined
pub fn ltp_percent_change(option: Option<&OptionContract>) -> f64 {
    let Some(option) = option else {
        return 0.0;
    };
    if option.chng == 0.0 {
        return 0.0;
    }

    let prev_ltp = option.ltp - option.chng;
    if prev_ltp == 0.0 {
        return 0.0;
    }
    round2(option.chng / prev_ltp * 100.0)
}

pub fn oi_change_series(chain: &OptionChain) -> Vec<OiChangePoint> {
    let sides = SideMaps::new(chain);

    chain
        .strikes()
        .into_iter()
        .map(|strike| {
            let call = sides.call(strike);
            let put = sides.put(strike);
            OiChangePoint {
                strike,
                call_chng_oi: call.map(|c| c.chng_in_oi).unwrap_or(0.0),
                put_chng_oi: put.map(|p| p.chng_in_oi).unwrap_or(0.0),
                call_ltp_pct_chng: ltp_percent_change(call),
                put_ltp_pct_chng: ltp_percent_change(put),
            }
        })
        .collect()
}

/// Heaviest call strikes act as resistance, heaviest put strikes as support
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistance {
    pub resistance1: f64,
    pub resistance2: f64,
    pub support1: f64,
    pub support2: f64,
}

pub fn support_resistance(chain: &OptionChain) -> SupportResistance {
    let (resistance1, resistance2) = top_two_by_oi(&chain.calls);
    let (support1, support2) = top_two_by_oi(&chain.puts);

    SupportResistance {
        resistance1,
        resistance2,
        support1,
        support2,
    }
}

fn top_two_by_oi(side: &[OptionContract]) -> (f64, f64) {
    let mut by_oi: Vec<&OptionContract> = side.iter().collect();
    // stable: equal OI keeps chain order
    by_oi.sort_by(|a, b| b.oi.total_cmp(&a.oi));

    let first = by_oi.first().map(|o| o.strike).unwrap_or(0.0);
    let second = by_oi.get(1).map(|o| o.strike).unwrap_or(0.0);
    (first, second)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Call,
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuySellPoint {
    pub strike: f64,
    pub buy_qty: f64,
    pub sell_qty: f64,
}

/// Bid/ask queue quantities for strikes around ATM on one side
pub fn buy_sell_window(chain: &OptionChain, side: Side) -> Vec<BuySellPoint> {
    let options = match side {
        Side::Call => &chain.calls,
        Side::Put => &chain.puts,
    };

    let strikes: Vec<f64> = options.iter().map(|o| o.strike).collect();
    let atm_strike = find_atm_strike(&strikes, chain.underlying_price);
    if atm_strike == 0.0 {
        return Vec::new();
    }

    let Some(atm_index) = options.iter().position(|o| o.strike == atm_strike) else {
        return Vec::new();
    };
    let start = atm_index.saturating_sub(config::BUY_SELL_STRIKES_BELOW_ATM);
    let end = (atm_index + config::BUY_SELL_STRIKES_ABOVE_ATM + 1).min(options.len());

    options[start..end]
        .iter()
        .map(|o| BuySellPoint {
            strike: o.strike,
            buy_qty: o.bid_qty.unwrap_or(0.0),
            sell_qty: o.ask_qty.unwrap_or(0.0),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTotals {
    pub call_oi: f64,
    pub put_oi: f64,
    pub call_volume: f64,
    pub put_volume: f64,
    pub oi_pcr: Option<f64>,
    pub volume_pcr: Option<f64>,
}

pub fn chain_totals(chain: &OptionChain) -> ChainTotals {
    let call_oi: f64 = chain.calls.iter().map(|c| c.oi).sum();
    let put_oi: f64 = chain.puts.iter().map(|p| p.oi).sum();
    let call_volume: f64 = chain.calls.iter().map(|c| c.volume).sum();
    let put_volume: f64 = chain.puts.iter().map(|p| p.volume).sum();

    ChainTotals {
        call_oi,
        put_oi,
        call_volume,
        put_volume,
        oi_pcr: rules::ratio(put_oi, call_oi),
        volume_pcr: rules::ratio(put_volume, call_volume),
    }
}

/// Everything the dashboard derives from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAnalytics {
    pub underlying_price: f64,
    pub atm_strike: f64,
    pub max_pain: MaxPain,
    pub totals: ChainTotals,
    pub support_resistance: SupportResistance,
    pub rows: Vec<StrikeRow>,
    pub oi_change: Vec<OiChangePoint>,
    pub call_buy_sell: Vec<BuySellPoint>,
    pub put_buy_sell: Vec<BuySellPoint>,
}

pub fn analyze_chain(chain: &OptionChain) -> ChainAnalytics {
    let strikes = chain.strikes();

    ChainAnalytics {
        underlying_price: chain.underlying_price,
        atm_strike: find_atm_strike(&strikes, chain.underlying_price),
        max_pain: calculate_max_pain(chain),
        totals: chain_totals(chain),
        support_resistance: support_resistance(chain),
        rows: build_strike_rows(chain),
        oi_change: oi_change_series(chain),
        call_buy_sell: buy_sell_window(chain, Side::Call),
        put_buy_sell: buy_sell_window(chain, Side::Put),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
