use std::net::SocketAddr;
use std::sync::Arc;

use nepfolio::services::market_feed::{spawn_market_poller, MarketCache, MarketFeedClient};
use nepfolio::services::portfolio_service::CommitLocks;
use nepfolio::store::{MemStore, RtdbClient, TreeStore};
use nepfolio::{config, routes, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    let store: Arc<dyn TreeStore> = if settings.store_url.trim().is_empty() {
        tracing::warn!("STORE_URL is empty, using the in-memory store (data is not persisted)");
        Arc::new(MemStore::new())
    } else {
        tracing::info!("using document store at {}", settings.store_url);
        Arc::new(RtdbClient::new(
            settings.store_url.clone(),
            settings.store_auth.clone(),
        ))
    };

    let (events_tx, _events_rx) = tokio::sync::broadcast::channel::<String>(64);

    let state = AppState {
        market_feed: MarketFeedClient::new(settings.market_feed_url.clone()),
        market: MarketCache::new(),
        store,
        settings: settings.clone(),
        events_tx,
        commit_locks: CommitLocks::new(),
    };

    spawn_market_poller(state.clone());

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>().unwrap(), settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
