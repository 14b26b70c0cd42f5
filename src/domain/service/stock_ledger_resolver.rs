use crate::domain::error::AdjustmentError;
use crate::domain::model::{AdjustmentBatch, AdjustmentLine, Product, Variant};
use crate::domain::port::StockTransaction;

/// 解決済みの調整明細
/// 明細と、トランザクション内で読んだ時点のバリアントのスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    pub line: AdjustmentLine,
    pub variant: Variant,
}

/// 在庫台帳リゾルバー
/// 調整明細を所有する商品とバリアントに結びつける。読み取りのみで変更はしない
pub struct StockLedgerResolver;

impl StockLedgerResolver {
    /// バッチ内の全明細を解決する
    ///
    /// # Arguments
    /// * `tx` - 書き込みと同じトランザクション
    /// * `batch` - 調整バッチ
    ///
    /// # Returns
    /// * `Ok(Vec<ResolvedLine>)` - 入力と同じ順序の解決結果
    /// * `Err(AdjustmentError::ProductNotFound)` - 参照された商品が一つでも存在しない
    /// * `Err(AdjustmentError::VariantNotFound)` - 商品内にバリアントが存在しない
    /// * `Err(AdjustmentError::StorageFailure)` - 読み取り失敗
    pub async fn resolve(
        tx: &mut dyn StockTransaction,
        batch: &AdjustmentBatch,
    ) -> Result<Vec<ResolvedLine>, AdjustmentError> {
        let product_ids = batch.distinct_product_ids();
        let products = tx.find_products(&product_ids).await?;
        Self::resolve_against(&products, batch)
    }

    /// 取得済みの商品集約に対して明細を解決する
    pub fn resolve_against(
        products: &[Product],
        batch: &AdjustmentBatch,
    ) -> Result<Vec<ResolvedLine>, AdjustmentError> {
        // 件数が一致しなければ、最初に欠けている商品IDを報告する
        let product_ids = batch.distinct_product_ids();
        if products.len() != product_ids.len() {
            let missing = product_ids
                .into_iter()
                .find(|id| !products.iter().any(|product| product.id() == *id));
            return Err(match missing {
                Some(id) => AdjustmentError::ProductNotFound(id),
                None => AdjustmentError::StorageFailure(
                    "取得した商品数が要求と一致しません".to_string(),
                ),
            });
        }

        batch
            .lines()
            .iter()
            .map(|line| {
                let product = products
                    .iter()
                    .find(|product| product.id() == line.product_id())
                    .ok_or(AdjustmentError::ProductNotFound(line.product_id()))?;
                let variant = product.variant(line.variant_id()).ok_or(
                    AdjustmentError::VariantNotFound {
                        product_id: line.product_id(),
                        variant_id: line.variant_id(),
                    },
                )?;
                Ok(ResolvedLine {
                    line: *line,
                    variant: variant.clone(),
                })
            })
            .collect()
    }
}
