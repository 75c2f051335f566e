use crate::market::config;
use crate::market::models::{Index, NiftyTick, OptionChain, OptionContract};
use crate::market::processor::round2;
use rand::Rng;

/// Seed prices for the tracked indices
pub fn initial_indices() -> Vec<Index> {
    vec![
        Index::new("NIFTY 50", "NIFTY 50", 22500.0, 150.75, 0.67),
        Index::new("NIFTY BANK", "NIFTY BANK", 48500.0, -250.40, -0.51),
        Index::new("NIFTY IT", "NIFTY IT", 34800.0, 300.10, 0.87),
        Index::new("SENSEX", "BSE SENSEX", 74000.0, 450.25, 0.61),
    ]
}

/// Synthesize a plausible chain around `underlying_price`.
///
/// Strikes are centred on the price rounded to the strike step and extend
/// `MOCK_STRIKES_EACH_SIDE` steps each way; non-positive strikes are skipped.
/// Pricing is illustrative only: intrinsic value plus an exponentially
/// decaying time value, and an IV smile that bottoms out at the money.
pub fn synthesize_chain<R: Rng>(underlying_price: f64, rng: &mut R) -> OptionChain {
    if !underlying_price.is_finite() || underlying_price <= 0.0 {
        return OptionChain::empty(underlying_price);
    }

    let base_strike = (underlying_price / config::STRIKE_STEP).round() * config::STRIKE_STEP;
    let strikes: Vec<f64> = (-config::MOCK_STRIKES_EACH_SIDE..=config::MOCK_STRIKES_EACH_SIDE)
        .map(|i| base_strike + f64::from(i) * config::STRIKE_STEP)
        .filter(|&strike| strike > 0.0)
        .collect();

    let calls = strikes
        .iter()
        .map(|&strike| synthesize_contract(strike, true, underlying_price, rng))
        .collect();
    let puts = strikes
        .iter()
        .map(|&strike| synthesize_contract(strike, false, underlying_price, rng))
        .collect();

    OptionChain {
        calls,
        puts,
        underlying_price,
    }
}

fn synthesize_contract<R: Rng>(
    strike: f64,
    is_call: bool,
    underlying_price: f64,
    rng: &mut R,
) -> OptionContract {
    let is_itm = if is_call {
        strike < underlying_price
    } else {
        strike > underlying_price
    };
    let distance = (strike - underlying_price).abs();
    let intrinsic = if is_itm { distance } else { 0.0 };

    // Time value peaks at the money
    let extrinsic = (60.0 * (-0.006 * distance).exp()).max(0.1);
    let noise = unit(rng) * (extrinsic * 0.05) - extrinsic * 0.025;
    let ltp = intrinsic + extrinsic + noise;

    let iv = 15.0 + 25.0 * (1.0 - (-0.003 * distance).exp()) + (unit(rng) * 2.0 - 1.0);

    let chng = (unit(rng) - 0.5) * ltp * 0.1;
    let chng_in_oi = ((unit(rng) - 0.4) * 50_000.0 + if is_itm { 10_000.0 } else { -5_000.0 }).floor();
    let oi = (unit(rng) * 200_000.0 + if is_itm { 150_000.0 } else { 20_000.0 }).floor();
    let volume = (unit(rng) * 10_000.0 + if is_itm { 5_000.0 } else { 2_000.0 }).floor();
    let bid_qty = (unit(rng) * volume * 0.5).floor();
    let ask_qty = (unit(rng) * volume * 0.5).floor();

    OptionContract {
        strike,
        ltp: round2(ltp),
        iv: Some(round2(iv)),
        chng: round2(chng),
        chng_in_oi,
        oi,
        volume,
        bid: Some(round2(ltp * 0.995)),
        ask: Some(round2(ltp * 1.005)),
        bid_qty: Some(bid_qty),
        ask_qty: Some(ask_qty),
        prev_ltp: None,
    }
}

/// One random-walk step per index, at most ±0.1% of price
pub fn update_index_prices<R: Rng>(indices: &[Index], rng: &mut R) -> Vec<Index> {
    indices
        .iter()
        .map(|index| {
            let previous_close = index.previous_close();
            let step = index.price * (unit(rng) - 0.5) * 0.002;
            let price = round2(index.price + step);
            let change = round2(price - previous_close);
            let change_percent = if previous_close != 0.0 {
                round2(change / previous_close * 100.0)
            } else {
                0.0
            };

            Index {
                price,
                change,
                change_percent,
                prev_price: Some(index.price),
                ..index.clone()
            }
        })
        .collect()
}

/// Move an index to a replayed tick, remembering the old price
pub fn apply_tick(index: &Index, tick: &NiftyTick) -> Index {
    let previous_close = tick.ltp - tick.change;
    let change_percent = if previous_close != 0.0 {
        tick.change / previous_close * 100.0
    } else {
        0.0
    };

    Index {
        price: tick.ltp,
        change: tick.change,
        change_percent,
        prev_price: Some(index.price),
        ..index.clone()
    }
}

/// Nudge one random call and one random put by up to half a percent
pub fn jitter_chain<R: Rng>(chain: &mut OptionChain, rng: &mut R) {
    jitter_one(&mut chain.calls, rng);
    jitter_one(&mut chain.puts, rng);
}

fn jitter_one<R: Rng>(side: &mut [OptionContract], rng: &mut R) {
    if side.is_empty() {
        return;
    }
    let picked = rng.gen_range(0..side.len());
    let contract = &mut side[picked];
    let moved = contract.ltp + (unit(rng) - 0.5) * contract.ltp * 0.01;
    contract.prev_ltp = Some(contract.ltp);
    contract.ltp = round2(moved).max(0.05);
}

fn unit<R: Rng>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..1.0)
}
