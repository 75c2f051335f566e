use super::config;
use super::history::{MaxPainEntry, MaxPainHistory};
use super::models::{DataOrigin, FetchedData, Index, OptionChain};
use super::processor::{self, ChainAnalytics};
use super::source::{self, MarketFeed};
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UnderlyingQuery {
    pub underlying: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }

    fn failed(error: String, start_time: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub source: DataOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub analytics: ChainAnalytics,
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    feed: Arc<MarketFeed>,
    live: Arc<RwLock<LiveState>>,
}

struct LiveState {
    indices: Vec<Index>,
    chain: Option<OptionChain>,
    history: MaxPainHistory,
}

impl AppState {
    pub fn new(feed: MarketFeed) -> Self {
        Self {
            feed: Arc::new(feed),
            live: Arc::new(RwLock::new(LiveState {
                indices: Vec::new(),
                chain: None,
                history: MaxPainHistory::new(chrono::Duration::seconds(
                    config::MAX_PAIN_HISTORY_WINDOW_SECS,
                )),
            })),
        }
    }

    async fn refresh_indices(&self) -> FetchedData<Vec<Index>> {
        let current = self.live.read().await.indices.clone();
        let fetched = self.feed.updated_indices(&current).await;
        self.live.write().await.indices = fetched.data.clone();
        fetched
    }

    /// Explicit underlying if valid, else the latest primary index price
    async fn resolve_underlying(&self, requested: Option<f64>) -> std::result::Result<f64, String> {
        if let Some(price) = requested {
            if price.is_finite() && price > 0.0 {
                return Ok(price);
            }
            return Err(format!("underlying must be a positive price, got {}", price));
        }

        let known = source::primary_price(&self.live.read().await.indices);
        let price = match known {
            Some(price) => price,
            None => source::primary_price(&self.refresh_indices().await.data)
                .ok_or_else(|| format!("no {} quote available", config::PRIMARY_INDEX))?,
        };
        Ok(price)
    }

    async fn refresh_chain(&self, underlying: f64) -> FetchedData<OptionChain> {
        let previous = self.live.read().await.chain.clone();
        let fetched = self.feed.chain(underlying, previous.as_ref()).await;
        self.live.write().await.chain = Some(fetched.data.clone());
        fetched
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /pulse_health
async fn health() -> &'static str {
    "OK"
}

/// GET /api/indices
async fn get_indices(State(app_state): State<AppState>) -> ApiResult<FetchedData<Vec<Index>>> {
    let start_time = Instant::now();
    let fetched = app_state.refresh_indices().await;
    (StatusCode::OK, Json(ApiResponse::ok(fetched, start_time)))
}

/// GET /api/option-chain?underlying=22500
async fn get_option_chain(
    Query(query): Query<UnderlyingQuery>,
    State(app_state): State<AppState>,
) -> ApiResult<FetchedData<OptionChain>> {
    let start_time = Instant::now();

    match app_state.resolve_underlying(query.underlying).await {
        Ok(underlying) => {
            let fetched = app_state.refresh_chain(underlying).await;
            (StatusCode::OK, Json(ApiResponse::ok(fetched, start_time)))
        }
        Err(e) => {
            warn!(error = %e, "option chain request rejected");
            (StatusCode::BAD_REQUEST, Json(ApiResponse::failed(e, start_time)))
        }
    }
}

/// GET /api/analytics?underlying=22500
async fn get_analytics(
    Query(query): Query<UnderlyingQuery>,
    State(app_state): State<AppState>,
) -> ApiResult<AnalyticsResponse> {
    let start_time = Instant::now();

    let underlying = match app_state.resolve_underlying(query.underlying).await {
        Ok(underlying) => underlying,
        Err(e) => {
            warn!(error = %e, "analytics request rejected");
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::failed(e, start_time)));
        }
    };

    let fetched = app_state.refresh_chain(underlying).await;
    let analytics = processor::analyze_chain(&fetched.data);
    app_state
        .live
        .write()
        .await
        .history
        .record(Utc::now(), analytics.max_pain.max_pain_strike);

    let response = AnalyticsResponse {
        source: fetched.source,
        error: fetched.error,
        analytics,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response, start_time)))
}

/// GET /api/max-pain/history
async fn get_max_pain_history(State(app_state): State<AppState>) -> ApiResult<Vec<MaxPainEntry>> {
    let start_time = Instant::now();
    let entries = app_state.live.read().await.history.entries();
    (StatusCode::OK, Json(ApiResponse::ok(entries, start_time)))
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/pulse_health", get(health))
        .route("/api/indices", get(get_indices))
        .route("/api/option-chain", get(get_option_chain))
        .route("/api/analytics", get(get_analytics))
        .route("/api/max-pain/history", get(get_max_pain_history))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(port: u16, feed: MarketFeed) -> Result<()> {
    let source = feed.kind();
    let app = router(AppState::new(feed));

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, %source, "pulse api server listening");
    println!("🚀 Pulse API Server running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /pulse_health");
    println!("   GET  /api/indices");
    println!("   GET  /api/option-chain?underlying=22500");
    println!("   GET  /api/analytics?underlying=22500");
    println!("   GET  /api/max-pain/history");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("ctrl-c received, shutting down");
        })
        .await?;

    Ok(())
}
