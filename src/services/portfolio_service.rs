//! Position ledger and transaction-history pruning.
//!
//! The ledger is the sole writer of a user's holdings subtree; the pruner is
//! the sole deleter of the transactions subtree. One accepted transaction
//! produces exactly one holding write and one history insert, committed as a
//! single atomic batch, followed by a separate pruning pass.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::models::{Holding, MarketSnapshot, TransactionInput, TransactionRecord, TxKind};
use crate::store::{self, StoreError, TreeStore, WriteGuard};
use crate::AppState;

/// Retention bounds for the transaction history.
const HISTORY_CAP: usize = 20;
const PER_SYMBOL_CAP: usize = 2;

const COMMIT_RETRIES: u32 = 3;

/// Per-user commit serialization. Two submissions for the same user never
/// interleave their read-modify-write cycles within this process; the
/// version guard on the commit batch covers the rest.
#[derive(Clone, Default)]
pub struct CommitLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CommitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn for_user(&self, uid: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(uid.to_string()).or_default().clone()
    }
}

/// Canonical store key for a scrip: non-alphanumerics stripped, upper-cased.
pub fn normalize_symbol(raw: &str) -> String {
    let re = Regex::new(r"[^A-Za-z0-9]").unwrap();
    re.replace_all(raw, "").to_uppercase()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn holdings_path(uid: &str) -> String {
    format!("users/{uid}/holdings")
}

fn holding_path(uid: &str, symbol: &str) -> String {
    format!("users/{uid}/holdings/{symbol}")
}

fn transactions_path(uid: &str) -> String {
    format!("users/{uid}/transactions")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub tx_id: String,
    pub symbol: String,

    #[serde(rename = "type")]
    pub kind: TxKind,

    pub units: i64,
    pub price: f64,

    /// Post-transaction holding; absent when the sell exhausted the position.
    pub holding: Option<Holding>,
}

/// Applies one BUY/SELL to the user's ledger.
///
/// Validates, reads the current holding, recomputes units and weighted
/// average cost, and commits holding + history record + profile stamp in one
/// guarded batch. The pruning pass runs afterwards and its failure is never
/// surfaced: it cannot affect financial correctness, only storage growth.
pub async fn apply_transaction(
    state: &AppState,
    uid: &str,
    input: TransactionInput,
) -> Result<TransactionReceipt, LedgerError> {
    let symbol = normalize_symbol(&input.symbol);
    if symbol.is_empty() {
        return Err(LedgerError::Validation("Enter a valid symbol.".into()));
    }
    if input.units <= 0 {
        return Err(LedgerError::Validation("Enter a valid number of units.".into()));
    }
    if !input.price.is_finite() || input.price <= 0.0 {
        return Err(LedgerError::Validation("Enter a valid price.".into()));
    }

    let lock = state.commit_locks.for_user(uid).await;
    let _commit = lock.lock().await;

    let path = holding_path(uid, &symbol);
    let mut attempt = 0;

    let receipt = loop {
        attempt += 1;

        let raw = state.store.get(&path).await?;
        let current: Option<Holding> = match &raw {
            Some(v) => Some(serde_json::from_value(v.clone()).map_err(|e| {
                LedgerError::StoreUnavailable(format!("corrupt holding at {path}: {e}"))
            })?),
            None => None,
        };

        let held_units = current.as_ref().map(|h| h.units).unwrap_or(0);
        let held_wacc = current.as_ref().map(|h| h.wacc).unwrap_or(0.0);

        // Display name priority: transaction -> market feed -> prior holding
        // -> the symbol itself.
        let supplied = input.company_name.clone().filter(|n| !n.trim().is_empty());
        let company_name = match supplied {
            Some(n) => n,
            None => match state.market.get(&symbol).await.filter(|s| !s.name.is_empty()) {
                Some(s) => s.name,
                None => current
                    .as_ref()
                    .map(|h| h.company_name.clone())
                    .unwrap_or_else(|| symbol.clone()),
            },
        };

        let (new_units, new_wacc) = match input.kind {
            TxKind::Buy => {
                let units = held_units + input.units;
                let total_cost =
                    held_units as f64 * held_wacc + input.units as f64 * input.price;
                (units, round2(total_cost / units as f64))
            }
            TxKind::Sell => {
                if held_units < input.units {
                    return Err(LedgerError::InsufficientHoldings {
                        symbol,
                        have: held_units,
                        requested: input.units,
                    });
                }
                // Cost basis of the remaining units does not move on disposal.
                (held_units - input.units, held_wacc)
            }
        };

        let now = Utc::now();
        let now_iso = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let new_holding = (new_units > 0).then(|| Holding {
            symbol: symbol.clone(),
            company_name: company_name.clone(),
            units: new_units,
            wacc: new_wacc,
            last_updated: now_iso.clone(),
            version: current.as_ref().map(|h| h.version).unwrap_or(0) + 1,
        });

        let record = TransactionRecord {
            symbol: symbol.clone(),
            company_name,
            kind: input.kind,
            units: input.units,
            price: input.price,
            timestamp: now.timestamp_millis(),
        };

        let tx_id = store::push_key();

        let mut updates: store::Updates = BTreeMap::new();
        updates.insert(
            path.clone(),
            new_holding
                .as_ref()
                .map(|h| serde_json::to_value(h).expect("holding serializes")),
        );
        updates.insert(
            format!("{}/{tx_id}", transactions_path(uid)),
            Some(serde_json::to_value(&record).expect("transaction serializes")),
        );
        updates.insert(
            format!("users/{uid}/userInfo/lastTransactionAt"),
            Some(json!(now_iso)),
        );

        // Guard on the stored value, not the deserialized default: a holding
        // written before the version stamp existed has no field to match.
        let guard = WriteGuard {
            path: format!("{path}/version"),
            expect: raw
                .as_ref()
                .and_then(|v| v.get("version").cloned())
                .filter(|v| !v.is_null()),
        };

        match state.store.write_batch(updates, Some(guard)).await {
            Ok(()) => {
                break TransactionReceipt {
                    tx_id,
                    symbol,
                    kind: input.kind,
                    units: input.units,
                    price: input.price,
                    holding: new_holding,
                };
            }
            Err(StoreError::Conflict(_)) if attempt < COMMIT_RETRIES => continue,
            Err(StoreError::Conflict(p)) => {
                return Err(LedgerError::StoreUnavailable(format!(
                    "persistent write conflict at {p}"
                )));
            }
            Err(e) => return Err(e.into()),
        }
    };

    let _ = state.events_tx.send("holdingsUpdated".to_string());
    let _ = state.events_tx.send("transactionsUpdated".to_string());

    if let Err(e) = prune_history(state, uid).await {
        tracing::warn!("history prune failed for {uid}: {e}");
    }

    Ok(receipt)
}

/// Bounds stored history while keeping it representative per symbol: walking
/// newest to oldest, a record survives iff fewer than `HISTORY_CAP` records
/// have been kept and it is at most the `PER_SYMBOL_CAP`-th occurrence of
/// its symbol. Idempotent; a no-op on empty history.
pub async fn prune_history(state: &AppState, uid: &str) -> Result<usize, StoreError> {
    let path = transactions_path(uid);

    let Some(tree) = state.store.get(&path).await? else {
        return Ok(0);
    };
    let Some(map) = tree.as_object() else {
        return Ok(0);
    };

    // Field access stays tolerant; a malformed record sorts as oldest and
    // gets pruned with the rest.
    let mut all: Vec<(String, i64, String)> = map
        .iter()
        .map(|(key, tx)| {
            let ts = tx.get("timestamp").and_then(Value::as_i64).unwrap_or(0);
            let sym = tx
                .get("symbol")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            (key.clone(), ts, sym)
        })
        .collect();

    all.sort_by(|a, b| b.1.cmp(&a.1));

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut kept = 0usize;
    let mut deletes: store::Updates = BTreeMap::new();

    for (key, _ts, sym) in all {
        let n = seen.entry(sym).or_insert(0);
        *n += 1;
        if kept < HISTORY_CAP && *n <= PER_SYMBOL_CAP {
            kept += 1;
        } else {
            deletes.insert(format!("{path}/{key}"), None);
        }
    }

    if deletes.is_empty() {
        return Ok(0);
    }

    let removed = deletes.len();
    state.store.write_batch(deletes, None).await?;
    Ok(removed)
}

pub async fn list_holdings(state: &AppState, uid: &str) -> Result<Vec<Holding>, LedgerError> {
    let Some(tree) = state.store.get(&holdings_path(uid)).await? else {
        return Ok(vec![]);
    };
    let Some(map) = tree.as_object() else {
        return Ok(vec![]);
    };

    let mut out = vec![];
    for (key, v) in map {
        match serde_json::from_value::<Holding>(v.clone()) {
            Ok(h) => out.push(h),
            Err(e) => tracing::warn!("skipping malformed holding {key} for {uid}: {e}"),
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    pub id: String,

    #[serde(flatten)]
    pub record: TransactionRecord,
}

/// Retained history, newest first.
pub async fn list_transactions(
    state: &AppState,
    uid: &str,
) -> Result<Vec<TransactionEntry>, LedgerError> {
    let Some(tree) = state.store.get(&transactions_path(uid)).await? else {
        return Ok(vec![]);
    };
    let Some(map) = tree.as_object() else {
        return Ok(vec![]);
    };

    let mut out: Vec<TransactionEntry> = vec![];
    for (key, v) in map {
        match serde_json::from_value::<TransactionRecord>(v.clone()) {
            Ok(record) => out.push(TransactionEntry {
                id: key.clone(),
                record,
            }),
            Err(e) => tracing::warn!("skipping malformed transaction {key} for {uid}: {e}"),
        }
    }

    out.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
    Ok(out)
}

fn pnl_class(pnl: f64) -> &'static str {
    if pnl > 0.0 {
        "up"
    } else if pnl < 0.0 {
        "down"
    } else {
        "flat"
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    pub symbol: String,
    pub company_name: String,
    pub units: i64,
    pub wacc: f64,

    /// Live price, or the cost basis when the feed lacks the symbol.
    pub last_price: f64,
    pub live: bool,

    pub cost: f64,
    pub value: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub pnl_class: &'static str,
}

/// Valuation of holdings against the latest snapshot. The wacc fallback is
/// display-only and never written back.
pub fn holding_views(holdings: &[Holding], market: &MarketSnapshot) -> Vec<HoldingView> {
    holdings
        .iter()
        .map(|h| {
            let quote = market.get(&h.symbol);
            let last_price = quote.map(|s| s.ltp).unwrap_or(h.wacc);

            let cost = h.units as f64 * h.wacc;
            let value = h.units as f64 * last_price;
            let pnl = value - cost;
            let pnl_pct = if cost > 0.0 { pnl / cost * 100.0 } else { 0.0 };

            HoldingView {
                symbol: h.symbol.clone(),
                company_name: h.company_name.clone(),
                units: h.units,
                wacc: h.wacc,
                last_price,
                live: quote.is_some(),
                cost,
                value,
                pnl,
                pnl_pct,
                pnl_class: pnl_class(pnl),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSlice {
    pub name: String,
    pub value: f64,
    pub pct: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub invested: f64,
    pub value: f64,
    pub pnl: f64,
    pub pnl_pct: f64,

    /// Sum of `(ltp - previousClose) * units` over symbols with a live quote.
    pub day_pnl: f64,

    pub holdings_count: usize,
    pub sectors: Vec<SectorSlice>,
}

pub fn portfolio_summary(holdings: &[Holding], market: &MarketSnapshot) -> PortfolioSummary {
    let mut invested = 0.0;
    let mut value = 0.0;
    let mut day_pnl = 0.0;
    let mut sectors: HashMap<String, f64> = HashMap::new();

    for h in holdings {
        let quote = market.get(&h.symbol);
        let ltp = quote.map(|s| s.ltp).unwrap_or(h.wacc);
        let prev_close = quote.map(|s| s.previous_close).unwrap_or(h.wacc);

        let held_value = h.units as f64 * ltp;

        invested += h.units as f64 * h.wacc;
        value += held_value;
        day_pnl += (ltp - prev_close) * h.units as f64;

        if held_value > 0.0 {
            let sector = quote
                .map(|s| s.sector.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Others".to_string());
            *sectors.entry(sector).or_insert(0.0) += held_value;
        }
    }

    let pnl = value - invested;
    let pnl_pct = if invested > 0.0 { pnl / invested * 100.0 } else { 0.0 };

    let mut sectors: Vec<SectorSlice> = sectors
        .into_iter()
        .map(|(name, sector_value)| SectorSlice {
            name,
            value: sector_value,
            pct: if value > 0.0 { sector_value / value * 100.0 } else { 0.0 },
        })
        .collect();
    sectors.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));

    PortfolioSummary {
        invested,
        value,
        pnl,
        pnl_pct,
        day_pnl,
        holdings_count: holdings.len(),
        sectors,
    }
}
