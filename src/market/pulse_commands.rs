use super::config;
use super::format;
use super::history::{MaxPainEntry, MaxPainHistory};
use super::models::{DataOrigin, Flash, Index, OptionChain};
use super::processor::{self, ChainAnalytics};
use super::rules::Bias;
use super::source::{self, MarketFeed, MarketSource};
use crate::utility::{AggregateTimer, Timer, TimingSummary};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Everything one refresh produced, as written to `snapshot.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub indices_source: DataOrigin,
    pub chain_source: DataOrigin,
    pub errors: Vec<String>,
    pub indices: Vec<Index>,
    pub analytics: ChainAnalytics,
}

/// What a finished watch loop leaves behind
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchReport {
    pub ticks: u64,
    pub timing: Option<TimingSummary>,
    pub max_pain_history: Vec<MaxPainEntry>,
}

/// Pulse command handler - snapshot and watch modes
pub struct PulseCommands;

impl PulseCommands {
    /// One fetch, printed as a table and saved as JSON
    pub async fn run_snapshot<S: MarketSource>(feed: &MarketFeed<S>, output: &Path) -> Result<Snapshot> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Nifty Pulse Snapshot".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let (snapshot, _chain) = Self::refresh(feed, &[], None).await;

        Self::print_indices(&snapshot.indices);
        Self::print_errors(&snapshot.errors);
        Self::print_analytics(&snapshot.analytics);

        std::fs::write(output, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("{} Saved snapshot to {}", "✓".green(), output.display());

        Ok(snapshot)
    }

    /// Refresh on an interval until the tick limit or Ctrl-C
    pub async fn run_watch<S: MarketSource>(
        feed: &MarketFeed<S>,
        period: Duration,
        max_ticks: Option<u64>,
    ) -> Result<WatchReport> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Nifty Pulse Watch".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!(
            "{} Refreshing every {}ms, Ctrl-C to stop",
            "ℹ".blue(),
            period.as_millis()
        );
        println!();

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut history = MaxPainHistory::new(chrono::Duration::seconds(config::MAX_PAIN_HISTORY_WINDOW_SECS));
        let mut timings = AggregateTimer::new("Refresh ticks");
        let mut indices: Vec<Index> = Vec::new();
        let mut previous_chain: Option<OptionChain> = None;
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut ctrl_c => {
                    info!("ctrl-c received, stopping watch");
                    break;
                }
            }

            let timer = Timer::start_with_threshold("refresh tick", config::SLOW_TICK_THRESHOLD_MS);
            let (snapshot, chain) = Self::refresh(feed, &indices, previous_chain.as_ref()).await;
            timings.record(timer.stop());
            ticks += 1;

            history.record(snapshot.generated_at, snapshot.analytics.max_pain.max_pain_strike);
            Self::print_tick_line(ticks, &snapshot);
            for error in &snapshot.errors {
                warn!(tick = ticks, %error, "refresh fell back to mock data");
            }

            indices = snapshot.indices;
            previous_chain = Some(chain);

            if max_ticks.is_some_and(|limit| ticks >= limit) {
                break;
            }
        }

        timings.print_summary();

        Ok(WatchReport {
            ticks,
            timing: timings.summary(),
            max_pain_history: history.entries(),
        })
    }

    /// Indices, then the chain around the primary index
    async fn refresh<S: MarketSource>(
        feed: &MarketFeed<S>,
        current: &[Index],
        previous_chain: Option<&OptionChain>,
    ) -> (Snapshot, OptionChain) {
        let indices = feed.updated_indices(current).await;
        let underlying = source::primary_price(&indices.data).unwrap_or_else(|| {
            warn!("{} missing from index quotes, chain will be empty", config::PRIMARY_INDEX);
            0.0
        });
        let chain = feed.chain(underlying, previous_chain).await;

        let errors = [indices.error, chain.error].into_iter().flatten().collect();
        let analytics = processor::analyze_chain(&chain.data);

        info!(
            underlying,
            max_pain = analytics.max_pain.max_pain_strike,
            strikes = analytics.rows.len(),
            source = %chain.source,
            "snapshot refreshed"
        );

        let snapshot = Snapshot {
            generated_at: Utc::now(),
            indices_source: indices.source,
            chain_source: chain.source,
            errors,
            indices: indices.data,
            analytics,
        };
        (snapshot, chain.data)
    }

    fn print_indices(indices: &[Index]) {
        println!("{}", "Indices".cyan().bold());
        for index in indices {
            let change = format::format_change(index.change, index.change_percent);
            let change = if index.change >= 0.0 { change.green() } else { change.red() };
            println!(
                "  {:<12} {} {:>12.2} {}",
                index.name,
                flash_marker(index.flash()),
                index.price,
                change
            );
        }
        println!();
    }

    fn print_errors(errors: &[String]) {
        for error in errors {
            println!("{} {}", "⚠".yellow(), error.yellow());
        }
        if !errors.is_empty() {
            println!();
        }
    }

    fn print_analytics(analytics: &ChainAnalytics) {
        let totals = &analytics.totals;
        let levels = &analytics.support_resistance;
        let max_pain = &analytics.max_pain;
        let min_payoff = max_pain
            .chart_data
            .iter()
            .find(|p| p.strike == max_pain.max_pain_strike)
            .map(|p| p.payoff)
            .unwrap_or(0.0);

        println!("{}", "Option chain".cyan().bold());
        println!("  Underlying: {:.2}  ATM: {}", analytics.underlying_price, analytics.atm_strike);
        println!(
            "  Max pain: {} ({})",
            max_pain.max_pain_strike.to_string().yellow().bold(),
            format::format_crore(min_payoff)
        );
        println!(
            "  OI: calls {} / puts {}  PCR {}  Volume PCR {}",
            format::format_lakh(totals.call_oi),
            format::format_lakh(totals.put_oi),
            format::format_ratio(totals.oi_pcr),
            format::format_ratio(totals.volume_pcr)
        );
        println!(
            "  Resistance: {} / {}  Support: {} / {}",
            levels.resistance1, levels.resistance2, levels.support1, levels.support2
        );
        println!();

        println!(
            "  {:>9} {:>9} {:>8} {:>8} {:<15} {:>6} {:<15} {:>8} {:>8} {:>9}",
            "Call LTP", "Call OI", "ΔOI", "Strike", "Call", "PCR", "Put", "ΔOI", "Put OI", "Put LTP"
        );

        let window = config::BUY_SELL_STRIKES_BELOW_ATM as f64 * config::STRIKE_STEP;
        for row in analytics
            .rows
            .iter()
            .filter(|row| (row.strike - analytics.atm_strike).abs() <= window)
        {
            let call_ltp = row.call.as_ref().map(|c| c.ltp).unwrap_or(0.0);
            let put_ltp = row.put.as_ref().map(|p| p.ltp).unwrap_or(0.0);
            let call_oi = row.call.as_ref().map(|c| c.oi).unwrap_or(0.0);
            let put_oi = row.put.as_ref().map(|p| p.oi).unwrap_or(0.0);
            let call_doi = row.call.as_ref().map(|c| c.chng_in_oi).unwrap_or(0.0);
            let put_doi = row.put.as_ref().map(|p| p.chng_in_oi).unwrap_or(0.0);

            let strike = format!("{:>8}", row.strike);
            let strike = if row.strike == analytics.atm_strike {
                strike.yellow().bold()
            } else {
                strike.normal()
            };

            println!(
                "  {:>9.2} {:>9} {:>8} {} {} {:>6} {} {:>8} {:>8} {:>9.2}",
                call_ltp,
                format::format_lakh(call_oi),
                format::format_thousands(call_doi),
                strike,
                bias_colored(&format!("{:<15}", row.call_buildup.label()), row.call_buildup.bias()),
                format::format_ratio(row.oi_pcr),
                bias_colored(&format!("{:<15}", row.put_buildup.label()), row.put_buildup.bias()),
                format::format_thousands(put_doi),
                format::format_lakh(put_oi),
                put_ltp
            );
        }
        println!();
    }

    fn print_tick_line(tick: u64, snapshot: &Snapshot) {
        let nifty = snapshot
            .indices
            .iter()
            .find(|index| index.symbol == config::PRIMARY_INDEX);

        let price = match nifty {
            Some(index) => format!(
                "{} {:.2} {}",
                flash_marker(index.flash()),
                index.price,
                format::format_change(index.change, index.change_percent)
            ),
            None => "n/a".to_string(),
        };

        println!(
            "{} #{:<4} {} {} | max pain {} | PCR {} | {}",
            "⏱".yellow(),
            tick,
            config::PRIMARY_INDEX.cyan(),
            price,
            snapshot.analytics.max_pain.max_pain_strike,
            format::format_ratio(snapshot.analytics.totals.oi_pcr),
            snapshot.chain_source
        );
    }
}

fn flash_marker(flash: Flash) -> ColoredString {
    match flash {
        Flash::Up => "▲".green(),
        Flash::Down => "▼".red(),
        Flash::Flat => "•".normal(),
    }
}

fn bias_colored(text: &str, bias: Bias) -> ColoredString {
    match bias {
        Bias::Bullish => text.green(),
        Bias::Bearish => text.red(),
        Bias::Neutral => text.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::source::MockSource;

    #[tokio::test]
    async fn test_refresh_uses_primary_index() {
        let feed = MarketFeed::new(MockSource::new(Some(2)), Some(2));
        let (snapshot, chain) = PulseCommands::refresh(&feed, &[], None).await;

        assert_eq!(chain.underlying_price, 22500.0);
        assert_eq!(snapshot.analytics.atm_strike, 22500.0);
        assert!(snapshot.errors.is_empty());
        assert_eq!(snapshot.chain_source, DataOrigin::Mock);
    }
}
