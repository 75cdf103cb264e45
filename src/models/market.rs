use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One scrip in the market feed snapshot.
///
/// The feed is best-effort and possibly partial, so every field tolerates
/// being absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStock {
    #[serde(default)]
    pub name: String,

    /// Last traded price.
    #[serde(default)]
    pub ltp: f64,

    #[serde(default)]
    pub previous_close: f64,

    #[serde(default)]
    pub sector: String,

    #[serde(default)]
    pub point_change: f64,

    #[serde(default)]
    pub percent_change: f64,
}

/// Symbol -> scrip map as delivered by the feed.
pub type MarketSnapshot = HashMap<String, MarketStock>;
