use serde::{Deserialize, Serialize};

/// One position per user per symbol, stored at `users/{uid}/holdings/{SYMBOL}`.
///
/// A holding whose units reach zero is deleted from the store, never kept as
/// a zero-unit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub company_name: String,

    pub units: i64,

    /// Weighted-average cost per unit, rounded to 2 decimals on write.
    /// Unchanged by a SELL.
    pub wacc: f64,

    /// RFC3339 instant of the last mutation.
    pub last_updated: String,

    /// Optimistic concurrency stamp, incremented on every write and used as
    /// the compare-and-swap guard of the commit batch.
    #[serde(default)]
    pub version: i64,
}
