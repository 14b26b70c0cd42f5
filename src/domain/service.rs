// ドメインサービス
// 在庫調整エンジンの構成要素（解決 → 十分性検証 → 一括実行）

mod batch_adjustment_executor;
mod stock_ledger_resolver;
mod sufficiency_validator;

pub use batch_adjustment_executor::BatchAdjustmentExecutor;
pub use stock_ledger_resolver::{ResolvedLine, StockLedgerResolver};
pub use sufficiency_validator::SufficiencyValidator;
