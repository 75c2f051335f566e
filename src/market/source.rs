use crate::error::{PulseError, Result};
use crate::market::config;
use crate::market::csv_loader;
use crate::market::mock_data;
use crate::market::models::{DataOrigin, FetchedData, Index, NiftyTick, OptionChain, OptionContract};
use crate::market::remote_client::RemoteClient;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Anything that can produce index quotes and an option chain
pub trait MarketSource: Send + Sync {
    fn kind(&self) -> DataOrigin;

    fn fetch_indices(&self) -> impl Future<Output = Result<Vec<Index>>> + Send;

    fn fetch_chain(&self, underlying_price: f64) -> impl Future<Output = Result<OptionChain>> + Send;
}

// -----------------------------------------------
// MOCK
// -----------------------------------------------

struct MockState {
    rng: StdRng,
    indices: Option<Vec<Index>>,
}

/// Synthesized data; indices random-walk from the seed list on every fetch
pub struct MockSource {
    state: Mutex<MockState>,
}

impl MockSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(MockState { rng, indices: None }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // the state stays usable even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn next_indices(&self) -> Vec<Index> {
        let mut state = self.lock();
        let state = &mut *state;
        let next = match &state.indices {
            None => mock_data::initial_indices(),
            Some(current) => mock_data::update_index_prices(current, &mut state.rng),
        };
        state.indices = Some(next.clone());
        next
    }

    /// One walk step from someone else's quotes, seeds when there are none
    pub fn walk_from(&self, current: &[Index]) -> Vec<Index> {
        if current.is_empty() {
            return mock_data::initial_indices();
        }
        mock_data::update_index_prices(current, &mut self.lock().rng)
    }

    pub fn chain(&self, underlying_price: f64) -> OptionChain {
        mock_data::synthesize_chain(underlying_price, &mut self.lock().rng)
    }
}

impl MarketSource for MockSource {
    fn kind(&self) -> DataOrigin {
        DataOrigin::Mock
    }

    fn fetch_indices(&self) -> impl Future<Output = Result<Vec<Index>>> + Send {
        let indices = self.next_indices();
        async move { Ok(indices) }
    }

    fn fetch_chain(&self, underlying_price: f64) -> impl Future<Output = Result<OptionChain>> + Send {
        let chain = self.chain(underlying_price);
        async move { Ok(chain) }
    }
}

// -----------------------------------------------
// CSV REPLAY
// -----------------------------------------------

struct ReplayChain {
    rng: StdRng,
    chain: OptionChain,
    served: bool,
}

/// Recorded ticks and a chain loaded from a data directory; after the first
/// fetch every tick nudges one call and one put
pub struct CsvSource {
    ticks: Vec<NiftyTick>,
    cursor: AtomicUsize,
    replay: Mutex<ReplayChain>,
}

impl CsvSource {
    pub fn open(data_dir: &Path, seed: Option<u64>) -> Result<Self> {
        let ticks = csv_loader::load_ticks(&data_dir.join(config::NIFTY_TICK_FILE))?;
        let calls = csv_loader::load_option_side(&data_dir.join(config::CALLS_FILE))?;
        let puts = csv_loader::load_option_side(&data_dir.join(config::PUTS_FILE))?;

        info!(
            dir = %data_dir.display(),
            ticks = ticks.len(),
            calls = calls.len(),
            puts = puts.len(),
            "csv data loaded"
        );

        Ok(Self::from_parts(ticks, calls, puts, seed))
    }

    pub fn from_parts(
        ticks: Vec<NiftyTick>,
        calls: Vec<OptionContract>,
        puts: Vec<OptionContract>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let chain = OptionChain {
            calls,
            puts,
            underlying_price: 0.0,
        }
        .normalized();

        Self {
            ticks,
            cursor: AtomicUsize::new(0),
            replay: Mutex::new(ReplayChain {
                rng,
                chain,
                served: false,
            }),
        }
    }

    /// Latest row first, then rows 1, 2, ... wrapping back to row 0
    fn next_tick(&self) -> Option<&NiftyTick> {
        if self.ticks.is_empty() {
            return None;
        }
        let len = self.ticks.len();
        let step = self.cursor.fetch_add(1, Ordering::Relaxed);
        let row = if step == 0 { len - 1 } else { step % len };
        self.ticks.get(row)
    }

    pub fn next_indices(&self) -> Vec<Index> {
        let seeds = mock_data::initial_indices();
        let Some(tick) = self.next_tick() else {
            return seeds;
        };

        seeds
            .into_iter()
            .map(|index| {
                if index.symbol == config::PRIMARY_INDEX {
                    mock_data::apply_tick(&index, tick)
                } else {
                    index
                }
            })
            .collect()
    }

    pub fn chain(&self, underlying_price: f64) -> OptionChain {
        let mut replay = self.replay.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let replay = &mut *replay;
        if replay.served {
            mock_data::jitter_chain(&mut replay.chain, &mut replay.rng);
        } else {
            replay.served = true;
        }

        OptionChain {
            underlying_price,
            ..replay.chain.clone()
        }
    }
}

impl MarketSource for CsvSource {
    fn kind(&self) -> DataOrigin {
        DataOrigin::Csv
    }

    fn fetch_indices(&self) -> impl Future<Output = Result<Vec<Index>>> + Send {
        let indices = self.next_indices();
        async move { Ok(indices) }
    }

    fn fetch_chain(&self, underlying_price: f64) -> impl Future<Output = Result<OptionChain>> + Send {
        let chain = self.chain(underlying_price);
        async move { Ok(chain) }
    }
}

// -----------------------------------------------
// REMOTE BACKEND
// -----------------------------------------------

pub struct RemoteSource {
    client: RemoteClient,
}

impl RemoteSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: RemoteClient::new(base_url)?,
        })
    }
}

impl MarketSource for RemoteSource {
    fn kind(&self) -> DataOrigin {
        DataOrigin::Live
    }

    fn fetch_indices(&self) -> impl Future<Output = Result<Vec<Index>>> + Send {
        self.client.fetch_indices()
    }

    fn fetch_chain(&self, underlying_price: f64) -> impl Future<Output = Result<OptionChain>> + Send {
        self.client.fetch_chain(underlying_price)
    }
}

// -----------------------------------------------
// SELECTION BY CONFIGURATION
// -----------------------------------------------

pub enum ConfiguredSource {
    Mock(MockSource),
    Csv(CsvSource),
    Remote(RemoteSource),
}

impl ConfiguredSource {
    /// `mock`, `csv` or `remote`; `remote` without a URL degrades to mock
    pub fn from_config(
        name: &str,
        data_dir: &Path,
        remote_url: Option<&str>,
        mock_seed: Option<u64>,
    ) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock(MockSource::new(mock_seed))),
            "csv" => Ok(Self::Csv(CsvSource::open(data_dir, mock_seed)?)),
            "remote" => match remote_url {
                Some(url) => Ok(Self::Remote(RemoteSource::new(url)?)),
                None => {
                    warn!("remote source selected without PULSE_REMOTE_URL, using mock data");
                    Ok(Self::Mock(MockSource::new(mock_seed)))
                }
            },
            other => Err(PulseError::InvalidArgument(format!(
                "unknown data source '{}', expected mock, csv or remote",
                other
            ))),
        }
    }
}

impl MarketSource for ConfiguredSource {
    fn kind(&self) -> DataOrigin {
        match self {
            Self::Mock(s) => s.kind(),
            Self::Csv(s) => s.kind(),
            Self::Remote(s) => s.kind(),
        }
    }

    fn fetch_indices(&self) -> impl Future<Output = Result<Vec<Index>>> + Send {
        async move {
            match self {
                Self::Mock(s) => s.fetch_indices().await,
                Self::Csv(s) => s.fetch_indices().await,
                Self::Remote(s) => s.fetch_indices().await,
            }
        }
    }

    fn fetch_chain(&self, underlying_price: f64) -> impl Future<Output = Result<OptionChain>> + Send {
        async move {
            match self {
                Self::Mock(s) => s.fetch_chain(underlying_price).await,
                Self::Csv(s) => s.fetch_chain(underlying_price).await,
                Self::Remote(s) => s.fetch_chain(underlying_price).await,
            }
        }
    }
}

// -----------------------------------------------
// FEED WITH MOCK FALLBACK
// -----------------------------------------------

/// The configured source, falling back to mock data whenever it fails
pub struct MarketFeed<S = ConfiguredSource> {
    source: S,
    fallback: MockSource,
}

impl<S: MarketSource> MarketFeed<S> {
    pub fn new(source: S, mock_seed: Option<u64>) -> Self {
        Self {
            source,
            fallback: MockSource::new(mock_seed),
        }
    }

    pub fn kind(&self) -> DataOrigin {
        self.source.kind()
    }

    pub async fn initial_indices(&self) -> FetchedData<Vec<Index>> {
        self.updated_indices(&[]).await
    }

    /// Fresh quotes with `prev_price` taken from `current` for known symbols
    pub async fn updated_indices(&self, current: &[Index]) -> FetchedData<Vec<Index>> {
        match self.source.fetch_indices().await {
            Ok(indices) => FetchedData::ok(carry_prev_prices(indices, current), self.source.kind()),
            Err(e) => {
                warn!(error = %e, "live index fetch failed, using mock data");
                FetchedData::fallback(
                    self.fallback.walk_from(current),
                    format!("Failed to fetch live indices. {}", e),
                )
            }
        }
    }

    /// Chain around `underlying_price`, `prev_ltp` filled from `previous` when given
    pub async fn chain(
        &self,
        underlying_price: f64,
        previous: Option<&OptionChain>,
    ) -> FetchedData<OptionChain> {
        let mut fetched = match self.source.fetch_chain(underlying_price).await {
            Ok(chain) => FetchedData::ok(chain, self.source.kind()),
            Err(e) => {
                warn!(error = %e, "live option chain fetch failed, using mock data");
                FetchedData::fallback(
                    self.fallback.chain(underlying_price),
                    format!("Failed to fetch live option chain. {}", e),
                )
            }
        };

        if let Some(previous) = previous {
            fetched.data.carry_prev_ltp(previous);
        }
        fetched
    }
}

fn carry_prev_prices(fresh: Vec<Index>, current: &[Index]) -> Vec<Index> {
    let previous: HashMap<&str, f64> = current
        .iter()
        .map(|index| (index.symbol.as_str(), index.price))
        .collect();

    fresh
        .into_iter()
        .map(|mut index| {
            if let Some(&price) = previous.get(index.symbol.as_str()) {
                index.prev_price = Some(price);
            }
            index
        })
        .collect()
}

/// Underlying used when the caller does not name one
pub fn primary_price(indices: &[Index]) -> Option<f64> {
    indices
        .iter()
        .find(|index| index.symbol == config::PRIMARY_INDEX)
        .map(|index| index.price)
}
