pub mod config;
pub mod csv_loader;
pub mod format;
pub mod history;
pub mod mock_data;
pub mod models;
pub mod processor;
pub mod pulse_api_server;
pub mod pulse_commands;
pub mod remote_client;
pub mod rules;
pub mod source;

// Re-exports (public API)
pub use history::{MaxPainEntry, MaxPainHistory};
pub use models::{DataOrigin, FetchedData, Flash, Index, NiftyTick, OptionChain, OptionContract};
pub use processor::{
    analyze_chain,
    build_strike_rows,
    buy_sell_window,
    calculate_max_pain,
    chain_totals,
    find_atm_strike,
    oi_change_series,
    support_resistance,
    ChainAnalytics,
    MaxPain,
    PayoffPoint,
    Side,
    StrikeRow,
};
pub use pulse_commands::PulseCommands;
pub use rules::{classify_buildup, oi_pcr, put_call_ratio, volume_pcr, Bias, Buildup, PcrMetric};
pub use source::{ConfiguredSource, CsvSource, MarketFeed, MarketSource, MockSource, RemoteSource};
