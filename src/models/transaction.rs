use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxKind::Buy => write!(f, "BUY"),
            TxKind::Sell => write!(f, "SELL"),
        }
    }
}

/// A submitted order, before normalization and validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub symbol: String,

    #[serde(rename = "type")]
    pub kind: TxKind,

    pub units: i64,
    pub price: f64,

    #[serde(default)]
    pub company_name: Option<String>,
}

/// Immutable history record at `users/{uid}/transactions/{key}`.
///
/// Created exactly once per accepted transaction, deleted only by the
/// pruning policy, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub symbol: String,
    pub company_name: String,

    #[serde(rename = "type")]
    pub kind: TxKind,

    pub units: i64,
    pub price: f64,

    /// Epoch milliseconds at creation; the pruner's sort key.
    pub timestamp: i64,
}
