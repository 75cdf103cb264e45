pub mod holding;
pub mod market;
pub mod transaction;
pub mod user;

pub use holding::Holding;
pub use market::{MarketSnapshot, MarketStock};
pub use transaction::{TransactionInput, TransactionRecord, TxKind};
pub use user::CurrentUser;
