// 駆動される側アダプター（リポジトリ実装、ロガーなど）

mod in_memory_product_repository;
mod product_repository;
mod stock_transaction;
mod tracing_logger;

pub use in_memory_product_repository::InMemoryProductRepository;
pub use product_repository::MySqlProductRepository;
pub use stock_transaction::MySqlStockTransaction;
pub use tracing_logger::TracingLogger;
