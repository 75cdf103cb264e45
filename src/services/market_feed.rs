use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time;

use crate::models::{MarketSnapshot, MarketStock};
use crate::AppState;

#[derive(Clone)]
pub struct MarketFeedClient {
    http: Client,
    base_url: String,
}

impl MarketFeedClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub async fn fetch_snapshot(&self) -> Result<MarketSnapshot, String> {
        let res = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("market feed request failed: {status} {body}"));
        }

        res.json::<MarketSnapshot>().await.map_err(|e| e.to_string())
    }
}

#[derive(Default)]
struct CacheInner {
    stocks: MarketSnapshot,
    fetched_at: Option<DateTime<Utc>>,
}

/// Latest known market snapshot. Readers never see mid-refresh state and
/// never depend on how the snapshot arrived.
#[derive(Clone, Default)]
pub struct MarketCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, symbol: &str) -> Option<MarketStock> {
        self.inner.read().await.stocks.get(symbol).cloned()
    }

    pub async fn all(&self) -> MarketSnapshot {
        self.inner.read().await.stocks.clone()
    }

    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.fetched_at
    }

    pub async fn replace(&self, snapshot: MarketSnapshot) {
        let mut inner = self.inner.write().await;
        inner.stocks = snapshot;
        inner.fetched_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoverRow {
    pub symbol: String,
    pub name: String,
    pub ltp: f64,
    pub point_change: f64,
    pub percent_change: f64,
}

fn mover_row(symbol: &str, stock: &MarketStock) -> MoverRow {
    MoverRow {
        symbol: symbol.to_string(),
        name: stock.name.clone(),
        ltp: stock.ltp,
        point_change: stock.point_change,
        percent_change: stock.percent_change,
    }
}

/// Top-N gainers and losers by percent change.
pub fn market_movers(snapshot: &MarketSnapshot, count: usize) -> (Vec<MoverRow>, Vec<MoverRow>) {
    let mut rows: Vec<MoverRow> = snapshot
        .iter()
        .map(|(symbol, stock)| mover_row(symbol, stock))
        .collect();

    rows.sort_by(|a, b| {
        b.percent_change
            .partial_cmp(&a.percent_change)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let gainers = rows.iter().take(count).cloned().collect();
    let losers = rows.iter().rev().take(count).cloned().collect();
    (gainers, losers)
}

/// Background refresh of the market snapshot. A failed or empty fetch keeps
/// the last known snapshot in place.
pub fn spawn_market_poller(state: AppState) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(state.settings.market_poll_secs.max(1)));

        loop {
            interval.tick().await;

            match state.market_feed.fetch_snapshot().await {
                Ok(snapshot) if !snapshot.is_empty() => {
                    tracing::debug!("market snapshot refreshed: {} scrips", snapshot.len());
                    state.market.replace(snapshot).await;
                    let _ = state.events_tx.send("marketUpdated".to_string());
                }
                Ok(_) => {
                    tracing::warn!("market feed returned an empty snapshot, keeping last known values");
                }
                Err(e) => {
                    tracing::warn!("market feed sync failed ({e}), keeping last known values");
                }
            }
        }
    });
}
