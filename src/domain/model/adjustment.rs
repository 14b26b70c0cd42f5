use crate::domain::error::DomainError;
use crate::domain::model::{ProductId, UnitPrice, VariantId};
use std::collections::HashSet;

/// 調整モード
/// 一つのバッチは全行が販売（減算）か、全行が返品・再入荷（加算）のどちらか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentMode {
    /// 販売による減算
    Debit,
    /// 返品・再入荷による加算
    Credit,
}

impl AdjustmentMode {
    /// 再入荷フラグから作成
    pub fn from_restock_flag(restock: bool) -> Self {
        if restock {
            AdjustmentMode::Credit
        } else {
            AdjustmentMode::Debit
        }
    }

    pub fn is_debit(&self) -> bool {
        matches!(self, AdjustmentMode::Debit)
    }
}

/// 調整明細
/// 一回の呼び出しの間だけ存在し、永続化されない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentLine {
    product_id: ProductId,
    variant_id: VariantId,
    quantity: u32,
}

impl AdjustmentLine {
    /// 新しい調整明細を作成
    /// 数量は1以上である必要がある
    pub fn new(
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            product_id,
            variant_id,
            quantity,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn variant_id(&self) -> VariantId {
        self.variant_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// 調整バッチ
/// 明細の順序は呼び出し側の指定どおりに保持する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentBatch {
    lines: Vec<AdjustmentLine>,
    mode: AdjustmentMode,
}

impl AdjustmentBatch {
    pub fn new(lines: Vec<AdjustmentLine>, mode: AdjustmentMode) -> Self {
        Self { lines, mode }
    }

    /// 販売バッチを作成
    pub fn debit(lines: Vec<AdjustmentLine>) -> Self {
        Self::new(lines, AdjustmentMode::Debit)
    }

    /// 返品・再入荷バッチを作成
    pub fn credit(lines: Vec<AdjustmentLine>) -> Self {
        Self::new(lines, AdjustmentMode::Credit)
    }

    pub fn lines(&self) -> &[AdjustmentLine] {
        &self.lines
    }

    pub fn mode(&self) -> AdjustmentMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 参照されている商品IDを重複なしで取得
    /// 最初に現れた順序を保つ
    pub fn distinct_product_ids(&self) -> Vec<ProductId> {
        let mut seen = HashSet::new();
        self.lines
            .iter()
            .map(|line| line.product_id())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// 在庫数の更新指示
/// 対象バリアントと新しい在庫数の組で、書き込みプリミティブに渡す
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityUpdate {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub new_quantity: u32,
}

/// 販売確定した明細
/// 注文側が再読込なしで実際の販売単価を記録できるよう単価を返す
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargedLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub unit_price_charged: UnitPrice,
}

/// 在庫調整の成功結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentReceipt {
    /// 販売バッチ: 入力と同じ順序で明細ごとの販売単価
    Debited(Vec<ChargedLine>),
    /// 返品・再入荷バッチ: 明細データなし
    Credited,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_line_requires_positive_quantity() {
        let result = AdjustmentLine::new(ProductId::new(), VariantId::new(), 0);
        assert_eq!(result.unwrap_err(), DomainError::InvalidQuantity);
    }

    #[test]
    fn test_mode_from_restock_flag() {
        assert_eq!(AdjustmentMode::from_restock_flag(true), AdjustmentMode::Credit);
        assert_eq!(AdjustmentMode::from_restock_flag(false), AdjustmentMode::Debit);
        assert!(AdjustmentMode::Debit.is_debit());
        assert!(!AdjustmentMode::Credit.is_debit());
    }

    #[test]
    fn test_distinct_product_ids_keeps_first_seen_order() {
        let p1 = ProductId::new();
        let p2 = ProductId::new();
        let batch = AdjustmentBatch::debit(vec![
            AdjustmentLine::new(p2, VariantId::new(), 1).unwrap(),
            AdjustmentLine::new(p1, VariantId::new(), 1).unwrap(),
            AdjustmentLine::new(p2, VariantId::new(), 1).unwrap(),
        ]);

        assert_eq!(batch.distinct_product_ids(), vec![p2, p1]);
    }
}
