use nifty_pulse::market::{analyze_chain, calculate_max_pain, OptionChain, OptionContract};

#[cfg(test)]
mod tests {
    use super::*;

    fn side(rows: &[(f64, f64)]) -> Vec<OptionContract> {
        rows.iter().map(|&(k, oi)| OptionContract::with_oi(k, oi)).collect()
    }

    #[test]
    fn test_max_pain_skewed_put_writing() {
        // heavy put OI above spot drags max pain up
        let chain = OptionChain {
            calls: side(&[(22400.0, 1000.0), (22500.0, 1000.0), (22600.0, 1000.0)]),
            puts: side(&[(22400.0, 100.0), (22500.0, 100.0), (22600.0, 9000.0)]),
            underlying_price: 22480.0,
        };

        let result = calculate_max_pain(&chain);
        let payoffs: Vec<f64> = result.chart_data.iter().map(|p| p.payoff).collect();

        // 22400: puts 100*100 + 9000*200 = 1_810_000
        // 22500: calls 1000*100, puts 9000*100 = 1_000_000
        // 22600: calls 1000*200 + 1000*100 = 300_000
        assert_eq!(payoffs, vec![1_810_000.0, 1_000_000.0, 300_000.0]);
        assert_eq!(result.max_pain_strike, 22600.0);
    }

    #[test]
    fn test_max_pain_unions_mismatched_strikes() {
        let chain = OptionChain {
            calls: side(&[(100.0, 10.0), (120.0, 10.0)]),
            puts: side(&[(110.0, 10.0)]),
            underlying_price: 110.0,
        };

        let result = calculate_max_pain(&chain);
        assert_eq!(result.strikes, vec![100.0, 110.0, 120.0]);
        // 100: put 10*10 = 100; 110: call 10*10 = 100; 120: call 20*10 = 200
        assert_eq!(result.max_pain_strike, 100.0);
    }

    #[test]
    fn test_analyze_chain_on_empty_chain() {
        let analytics = analyze_chain(&OptionChain::empty(22500.0));

        assert_eq!(analytics.max_pain.max_pain_strike, 0.0);
        assert_eq!(analytics.atm_strike, 0.0);
        assert!(analytics.rows.is_empty());
        assert!(analytics.call_buy_sell.is_empty());
        assert_eq!(analytics.totals.oi_pcr, None);
        assert_eq!(analytics.support_resistance.resistance1, 0.0);
    }

    #[test]
    fn test_analytics_wire_names() {
        let chain = OptionChain {
            calls: side(&[(100.0, 10.0)]),
            puts: side(&[(100.0, 20.0)]),
            underlying_price: 100.0,
        };

        let json = serde_json::to_value(analyze_chain(&chain)).unwrap();
        assert_eq!(json["maxPain"]["maxPainStrike"], 100.0);
        assert_eq!(json["maxPain"]["chartData"][0]["payoff"], 0.0);
        assert_eq!(json["rows"][0]["oiPcr"], 2.0);
        assert_eq!(json["totals"]["oiPcr"], 2.0);
    }
}
