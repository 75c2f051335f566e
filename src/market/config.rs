use std::path::PathBuf;
use std::time::Duration;

// -----------------------------------------------
// STRIKE GRID
// -----------------------------------------------
pub const STRIKE_STEP: f64 = 50.0;
pub const MOCK_STRIKES_EACH_SIDE: i32 = 15;

// Strikes shown either side of ATM in the buy/sell quantity window
pub const BUY_SELL_STRIKES_BELOW_ATM: usize = 7;
pub const BUY_SELL_STRIKES_ABOVE_ATM: usize = 7;

// -----------------------------------------------
// INDICES
// -----------------------------------------------
pub const PRIMARY_INDEX: &str = "NIFTY 50";

// -----------------------------------------------
// CSV FIXTURES
// -----------------------------------------------
pub const NIFTY_TICK_FILE: &str = "nifty_tick.csv";
pub const CALLS_FILE: &str = "calls.csv";
pub const PUTS_FILE: &str = "puts.csv";
pub const DEFAULT_DATA_DIR: &str = "./data";

// -----------------------------------------------
// REMOTE BACKEND
// -----------------------------------------------
pub const REMOTE_INDICES_PATH: &str = "/api/indices";
pub const REMOTE_OPTION_CHAIN_PATH: &str = "/api/option-chain";
pub const REMOTE_CHAIN_SYMBOL: &str = "NIFTY";

pub fn remote_indices_url(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), REMOTE_INDICES_PATH)
}

pub fn remote_option_chain_url(base: &str, symbol: &str) -> String {
    format!(
        "{}{}?symbol={}",
        base.trim_end_matches('/'),
        REMOTE_OPTION_CHAIN_PATH,
        urlencoding::encode(symbol)
    )
}

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub const RETRY_BASE_DELAY_MS: u64 = 100;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 2;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// REFRESH LOOP
// -----------------------------------------------
pub const DEFAULT_REFRESH_MS: u64 = 3000;
pub const MIN_REFRESH_MS: u64 = 250;
pub const MAX_REFRESH_MS: u64 = 60_000;

// Ticks slower than this get a warning
pub const SLOW_TICK_THRESHOLD_MS: u128 = 500;

pub const MAX_PAIN_HISTORY_WINDOW_SECS: i64 = 60 * 60;

// -----------------------------------------------
// SERVER
// -----------------------------------------------
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const SNAPSHOT_OUTPUT_FILE: &str = "snapshot.json";

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Execution mode, `snapshot` unless overridden
pub fn get_execution_mode() -> String {
    std::env::var("PULSE_MODE").unwrap_or_else(|_| "snapshot".to_string())
}

/// Data source name, `mock` unless overridden
pub fn get_source_name() -> String {
    std::env::var("PULSE_SOURCE").unwrap_or_else(|_| "mock".to_string())
}

pub fn get_port() -> u16 {
    std::env::var("PULSE_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub fn get_data_dir() -> PathBuf {
    std::env::var("PULSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn get_log_dir() -> PathBuf {
    std::env::var("PULSE_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
}

/// Base URL of the remote backend; blank values count as unset
pub fn get_remote_url() -> Option<String> {
    std::env::var("PULSE_REMOTE_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_refresh_interval() -> Duration {
    let ms = std::env::var("PULSE_REFRESH_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_REFRESH_MS);
    Duration::from_millis(clamp_refresh_ms(ms))
}

pub fn clamp_refresh_ms(ms: u64) -> u64 {
    ms.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS)
}

/// Number of ticks before watch mode exits on its own
pub fn get_watch_ticks() -> Option<u64> {
    std::env::var("PULSE_WATCH_TICKS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&n| n > 0)
}

pub fn get_mock_seed() -> Option<u64> {
    std::env::var("PULSE_MOCK_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
}
