use crate::domain::error::{AdjustmentError, DomainError};
use crate::domain::model::{AdjustmentMode, ProductId, QuantityUpdate, Variant, VariantId};
use crate::domain::port::{Logger, StockTransaction};
use crate::domain::service::ResolvedLine;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 一括調整エグゼキューター
/// 検証済みの明細から新しい在庫数を計算し、一つの原子的な書き込みとして適用する
pub struct BatchAdjustmentExecutor {
    logger: Arc<dyn Logger>,
}

impl BatchAdjustmentExecutor {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// 更新計画を作る
    /// 同じバリアントへの明細は一つの更新にまとめ、最初に現れた順に並べる
    ///
    /// # Returns
    /// * `Ok(Vec<QuantityUpdate>)` - バリアントごとの新しい在庫数
    /// * `Err(AdjustmentError)` - 減算で在庫不足、または加算で数値が溢れた
    pub fn plan(
        resolved: &[ResolvedLine],
        mode: AdjustmentMode,
    ) -> Result<Vec<QuantityUpdate>, AdjustmentError> {
        let mut order: Vec<VariantId> = Vec::new();
        let mut working: HashMap<VariantId, (ProductId, Variant)> = HashMap::new();

        for entry in resolved {
            let variant_id = entry.variant.id();
            let (_, variant) = working.entry(variant_id).or_insert_with(|| {
                order.push(variant_id);
                (entry.line.product_id(), entry.variant.clone())
            });

            let quantity = entry.line.quantity();
            let applied = match mode {
                AdjustmentMode::Debit => variant.debit(quantity),
                AdjustmentMode::Credit => variant.credit(quantity),
            };
            applied.map_err(|err| match err {
                DomainError::InsufficientStock {
                    requested,
                    available,
                } => AdjustmentError::InsufficientStock {
                    product_id: entry.line.product_id(),
                    variant_id,
                    requested,
                    available,
                },
                _ => AdjustmentError::StorageFailure(format!(
                    "在庫数が表現可能な範囲を超えます: variant {}",
                    variant_id
                )),
            })?;
        }

        Ok(order
            .into_iter()
            .filter_map(|variant_id| working.remove(&variant_id))
            .map(|(product_id, variant)| QuantityUpdate {
                product_id,
                variant_id: variant.id(),
                new_quantity: variant.quantity_on_hand(),
            })
            .collect())
    }

    /// 更新計画をトランザクションに適用してコミットする
    /// 書き込みが一件でも失敗すればロールバックし、変更は一切残らない
    ///
    /// # Arguments
    /// * `tx` - 解決時と同じトランザクション（成功・失敗にかかわらず消費される）
    /// * `resolved` - 解決・検証済みの明細
    /// * `mode` - 調整モード
    /// * `correlation_id` - ログ用の相関ID
    pub async fn execute(
        &self,
        mut tx: Box<dyn StockTransaction>,
        resolved: &[ResolvedLine],
        mode: AdjustmentMode,
        correlation_id: Uuid,
    ) -> Result<Vec<QuantityUpdate>, AdjustmentError> {
        let updates = match Self::plan(resolved, mode) {
            Ok(updates) => updates,
            Err(err) => {
                self.abort(tx, correlation_id).await;
                return Err(err);
            }
        };

        if let Err(err) = tx.apply_quantity_updates(&updates).await {
            self.abort(tx, correlation_id).await;
            return Err(err.into());
        }

        tx.commit().await?;

        let mut context = HashMap::new();
        context.insert("updated_variants".to_string(), updates.len().to_string());
        self.logger.debug(
            "BatchAdjustmentExecutor",
            "Quantity updates committed",
            Some(correlation_id),
            Some(context),
        );

        Ok(updates)
    }

    /// トランザクションを中断して解放する
    /// ロールバック自体の失敗は記録するだけで、元のエラーを優先する
    pub async fn abort(&self, tx: Box<dyn StockTransaction>, correlation_id: Uuid) {
        if let Err(err) = tx.rollback().await {
            let mut context = HashMap::new();
            context.insert("error".to_string(), err.to_string());
            self.logger.warn(
                "BatchAdjustmentExecutor",
                "Rollback failed; transaction discarded with its session",
                Some(correlation_id),
                Some(context),
            );
        }
    }
}
