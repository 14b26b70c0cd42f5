use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::product_repository::{fetch_products, RowLock};
use crate::domain::model::{Product, ProductId, QuantityUpdate};
use crate::domain::port::{RepositoryError, StockTransaction};
use async_trait::async_trait;
use sqlx::{MySql, Transaction};

/// MySQL在庫トランザクション
/// 読み取った行はコミットまたはロールバックまで FOR UPDATE でロックされる。
/// コミットされずにドロップされた場合、sqlxが自動的にロールバックする
pub struct MySqlStockTransaction {
    tx: Transaction<'static, MySql>,
}

impl MySqlStockTransaction {
    pub(super) fn new(tx: Transaction<'static, MySql>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl StockTransaction for MySqlStockTransaction {
    async fn find_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        fetch_products(&mut *self.tx, product_ids, RowLock::ForUpdate).await
    }

    async fn apply_quantity_updates(
        &mut self,
        updates: &[QuantityUpdate],
    ) -> Result<(), RepositoryError> {
        for update in updates {
            let result = sqlx::query(
                r#"
                UPDATE product_variants
                SET quantity_on_hand = ?
                WHERE id = ? AND product_id = ?
                "#,
            )
            .bind(update.new_quantity)
            .bind(update.variant_id.to_string())
            .bind(update.product_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("在庫数の更新に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

            // 部分適用は許さない
            if result.rows_affected() != 1 {
                return Err(RepositoryError::OperationFailed(format!(
                    "在庫数の更新対象が見つかりません: product {}, variant {}",
                    update.product_id, update.variant_id
                )));
            }
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのロールバックに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)
    }
}
