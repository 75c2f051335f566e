use crate::market::config;
use anyhow::{Result, bail};
use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Snapshot,
    Watch,
    Server,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Mode::Snapshot),
            "watch" => Ok(Mode::Watch),
            "server" => Ok(Mode::Server),
            other => bail!("Invalid mode '{}'. Use 'snapshot', 'watch' or 'server'", other),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Snapshot => write!(f, "snapshot"),
            Mode::Watch => write!(f, "watch"),
            Mode::Server => write!(f, "server"),
        }
    }
}

/// Application configuration handler
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub port: u16,
    pub source: String,
    pub data_dir: PathBuf,
    pub remote_url: Option<String>,
    pub refresh_interval: Duration,
    pub watch_ticks: Option<u64>,
    pub mock_seed: Option<u64>,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mode: config::get_execution_mode().parse()?,
            port: config::get_port(),
            source: config::get_source_name(),
            data_dir: config::get_data_dir(),
            remote_url: config::get_remote_url(),
            refresh_interval: config::get_refresh_interval(),
            watch_ticks: config::get_watch_ticks(),
            mock_seed: config::get_mock_seed(),
            log_dir: config::get_log_dir(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("PULSE_PORT must be a non-zero port");
        }
        Ok(())
    }

    pub fn print_banner(&self) {
        println!("{} Mode: {}", "→".cyan(), self.mode.to_string().yellow());
        println!("{} Source: {}", "→".cyan(), self.source.yellow());
        if self.mode == Mode::Watch {
            println!(
                "{} Refresh: {}ms",
                "→".cyan(),
                self.refresh_interval.as_millis()
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            mode: Mode::Snapshot,
            port: config::DEFAULT_PORT,
            source: "mock".to_string(),
            data_dir: PathBuf::from(config::DEFAULT_DATA_DIR),
            remote_url: None,
            refresh_interval: Duration::from_millis(config::DEFAULT_REFRESH_MS),
            watch_ticks: None,
            mock_seed: None,
            log_dir: PathBuf::from(config::DEFAULT_LOG_DIR),
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Watch".parse::<Mode>().unwrap(), Mode::Watch);
        assert_eq!(" server ".parse::<Mode>().unwrap(), Mode::Server);
        assert!("batch".parse::<Mode>().is_err());
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        assert!(sample().validate().is_ok());

        let bad = AppConfig { port: 0, ..sample() };
        assert!(bad.validate().is_err());
    }
}
