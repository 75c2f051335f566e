pub mod app_config;
pub mod error;
pub mod logging;
pub mod market;
pub mod utility;

// Re-exports for convenience
pub use error::{PulseError, Result};
pub use market::{MarketFeed, OptionChain, OptionContract};
