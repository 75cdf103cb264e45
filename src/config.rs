use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    // Document store. Empty STORE_URL selects the in-memory store.
    pub store_url: String,
    pub store_auth: String,

    pub market_feed_url: String,
    pub market_poll_secs: u64,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let store_url = env::var("STORE_URL").unwrap_or_default();
    let store_auth = env::var("STORE_AUTH_TOKEN").unwrap_or_default();

    let market_feed_url = env::var("MARKET_FEED_URL")
        .unwrap_or_else(|_| "http://localhost:5000/api/nepse".to_string());

    let market_poll_secs = env::var("MARKET_POLL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60);

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());
    let jwt_cookie_name = env::var("JWT_COOKIE_NAME").unwrap_or_else(|_| "auth".to_string());

    Settings {
        host,
        port,
        store_url,
        store_auth,
        market_feed_url,
        market_poll_secs,
        jwt_secret,
        jwt_cookie_name,
    }
}
