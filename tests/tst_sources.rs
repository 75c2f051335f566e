use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use nifty_pulse::PulseError;
use nifty_pulse::market::remote_client::RemoteClient;
use nifty_pulse::market::{CsvSource, DataOrigin, MarketFeed, MarketSource, RemoteSource};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(test)]
mod tests {
    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nifty-pulse-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // -----------------------------------------------
    // CSV
    // -----------------------------------------------

    #[tokio::test]
    async fn test_csv_source_replays_fixture() {
        let dir = fixture_dir("csv");
        std::fs::write(
            dir.join("nifty_tick.csv"),
            "Timestamp,LTP,Change\n2025-06-20 09:15:00,22480,-20\n2025-06-20 09:15:01,22520.5,20.5\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("calls.csv"),
            "strike,last,change,OI,ttq,bPrice,sPrice,bQty,sQty,chngInOI\n\
             22550,40,-2,60000,900,39.8,40.2,50,75,-1000\n\
             22500,70,5,90000,1200,69.5,70.5,150,100,2500\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("puts.csv"),
            "strike,last,change,OI,ttq,bPrice,sPrice,bQty,sQty,chngInOI\n\
             22500,50,-4,110000,1500,49.5,50.5,200,300,4000\n\
             oops,1,1,1,1,1,1,1,1,1\n",
        )
        .unwrap();

        let feed = MarketFeed::new(CsvSource::open(&dir, Some(1)).unwrap(), Some(1));
        let indices = feed.initial_indices().await;
        assert_eq!(indices.source, DataOrigin::Csv);
        let nifty = indices.data.iter().find(|i| i.symbol == "NIFTY 50").unwrap();
        // latest row comes first
        assert_eq!(nifty.price, 22520.5);
        assert_eq!(nifty.change, 20.5);

        let chain = feed.chain(nifty.price, None).await;
        assert_eq!(chain.source, DataOrigin::Csv);
        assert_eq!(chain.data.underlying_price, 22520.5);
        let call_strikes: Vec<f64> = chain.data.calls.iter().map(|c| c.strike).collect();
        assert_eq!(call_strikes, vec![22500.0, 22550.0]);
        assert_eq!(chain.data.puts.len(), 1);
        assert_eq!(chain.data.puts[0].bid_qty, Some(200.0));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_csv_source_with_missing_files() {
        let dir = fixture_dir("csv-empty");
        let source = CsvSource::open(&dir, Some(1)).unwrap();

        let indices = source.fetch_indices().await.unwrap();
        assert_eq!(indices.len(), 4);
        assert!(source.fetch_chain(22500.0).await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    // -----------------------------------------------
    // REMOTE
    // -----------------------------------------------

    async fn indices_ok() -> Json<Value> {
        Json(json!([
            {"symbol": "NIFTY 50", "name": "NIFTY 50", "price": 22610.5, "change": 110.5, "changePercent": 0.49},
            {"symbol": "NIFTY BANK", "name": "NIFTY BANK", "price": 48400.0, "change": -100.0, "changePercent": -0.21}
        ]))
    }

    async fn chain_ok(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        if params.get("symbol").map(String::as_str) != Some("NIFTY") {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "unknown symbol"})));
        }
        let body = json!({
            "calls": [
                {"strike": 22650, "ltp": 60.0, "iv": 14.2, "chng": 3.0, "chngInOI": 1000, "oi": 80000, "volume": 900, "bid": 59.5, "ask": 60.5},
                {"strike": 22600, "ltp": 85.0, "iv": 13.9, "chng": 4.0, "chngInOI": 2000, "oi": 95000, "volume": 1100, "bid": 84.5, "ask": 85.5}
            ],
            "puts": [
                {"strike": 22600, "ltp": 70.0, "iv": 14.8, "chng": -6.0, "chngInOI": 3000, "oi": 120000, "volume": 1300, "bid": 69.5, "ask": 70.5}
            ],
            "underlyingPrice": 0
        });
        (StatusCode::OK, Json(body))
    }

    #[tokio::test]
    async fn test_remote_source_fetches_and_replaces_underlying() {
        let base = serve(
            Router::new()
                .route("/api/indices", get(indices_ok))
                .route("/api/option-chain", get(chain_ok)),
        )
        .await;

        let feed = MarketFeed::new(RemoteSource::new(&base).unwrap(), Some(1));

        let indices = feed.initial_indices().await;
        assert_eq!(indices.source, DataOrigin::Live);
        assert!(indices.error.is_none());
        assert_eq!(indices.data.len(), 2);
        assert_eq!(indices.data[0].change_percent, 0.49);

        let chain = feed.chain(22610.5, None).await;
        assert_eq!(chain.source, DataOrigin::Live);
        assert_eq!(chain.data.underlying_price, 22610.5);
        assert_eq!(chain.data.calls[0].strike, 22600.0);
        assert_eq!(chain.data.calls[0].iv, Some(13.9));
    }

    #[tokio::test]
    async fn test_remote_client_fails_fast_on_client_error() {
        let hits = Arc::new(AtomicUsize::new(0));

        async fn not_found(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, &'static str) {
            hits.fetch_add(1, Ordering::SeqCst);
            (StatusCode::NOT_FOUND, "no such route")
        }

        let base = serve(
            Router::new()
                .route("/api/indices", get(not_found))
                .with_state(hits.clone()),
        )
        .await;

        let client = RemoteClient::new(&base).unwrap();
        let err = client.fetch_indices().await.unwrap_err();

        assert!(matches!(err, PulseError::RemoteStatus { status, .. } if status == StatusCode::NOT_FOUND));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_server_error_retries_then_falls_back() {
        let hits = Arc::new(AtomicUsize::new(0));

        async fn broken(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, Json<Value>) {
            hits.fetch_add(1, Ordering::SeqCst);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to connect to broker API"})),
            )
        }

        let base = serve(
            Router::new()
                .route("/api/indices", get(broken))
                .with_state(hits.clone()),
        )
        .await;

        let feed = MarketFeed::new(RemoteSource::new(&base).unwrap(), Some(3));
        let indices = feed.initial_indices().await;

        // first attempt plus three retries
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert_eq!(indices.source, DataOrigin::Mock);
        let error = indices.error.unwrap();
        assert!(error.starts_with("Failed to fetch live indices."));
        assert!(error.contains("Failed to connect to broker API"));
        assert_eq!(indices.data.len(), 4);
    }

    #[tokio::test]
    async fn test_remote_error_body_on_success_status() {
        async fn soft_error() -> Json<Value> {
            Json(json!({"error": "API response was empty"}))
        }

        let base = serve(Router::new().route("/api/option-chain", get(soft_error))).await;

        let err = RemoteClient::new(&base)
            .unwrap()
            .fetch_chain(22500.0)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Remote backend error: API response was empty");
    }
}
