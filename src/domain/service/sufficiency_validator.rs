use crate::domain::error::{AdjustmentError, DomainError};
use crate::domain::model::VariantId;
use crate::domain::service::ResolvedLine;
use std::collections::HashMap;

/// 在庫十分性バリデーター
/// 販売バッチでのみ実行する
pub struct SufficiencyValidator;

impl SufficiencyValidator {
    /// 各明細の要求数量が手持ち在庫を超えていないか検証する
    /// 同じバリアントを指す明細が複数あれば、前の明細を差し引いた残量で検証する
    ///
    /// # Returns
    /// * `Ok(())` - 全明細が十分
    /// * `Err(AdjustmentError::InsufficientStock)` - 最初に不足した明細
    pub fn validate(resolved: &[ResolvedLine]) -> Result<(), AdjustmentError> {
        let mut working: HashMap<VariantId, _> = HashMap::new();

        for entry in resolved {
            let variant = working
                .entry(entry.variant.id())
                .or_insert_with(|| entry.variant.clone());

            variant
                .debit(entry.line.quantity())
                .map_err(|err| match err {
                    DomainError::InsufficientStock {
                        requested,
                        available,
                    } => AdjustmentError::InsufficientStock {
                        product_id: entry.line.product_id(),
                        variant_id: entry.line.variant_id(),
                        requested,
                        available,
                    },
                    other => AdjustmentError::StorageFailure(other.to_string()),
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AdjustmentLine, ProductId, UnitPrice, Variant};

    fn resolved(product_id: ProductId, variant: &Variant, quantity: u32) -> ResolvedLine {
        ResolvedLine {
            line: AdjustmentLine::new(product_id, variant.id(), quantity).unwrap(),
            variant: variant.clone(),
        }
    }

    fn variant(quantity: u32) -> Variant {
        Variant::new(None, None, UnitPrice::new(50_000).unwrap(), quantity).unwrap()
    }

    #[test]
    fn test_sufficient_stock_passes() {
        let product_id = ProductId::new();
        let v = variant(10);
        assert!(SufficiencyValidator::validate(&[resolved(product_id, &v, 10)]).is_ok());
    }

    #[test]
    fn test_first_insufficient_line_is_reported() {
        let product_id = ProductId::new();
        let v1 = variant(2);
        let v2 = variant(1);
        let lines = vec![
            resolved(product_id, &v1, 1),
            resolved(product_id, &v2, 5),
            resolved(product_id, &v1, 9),
        ];

        let err = SufficiencyValidator::validate(&lines).unwrap_err();
        assert_eq!(
            err,
            AdjustmentError::InsufficientStock {
                product_id,
                variant_id: v2.id(),
                requested: 5,
                available: 1,
            }
        );
    }

    #[test]
    fn test_repeated_variant_is_validated_cumulatively() {
        let product_id = ProductId::new();
        let v = variant(5);
        let lines = vec![resolved(product_id, &v, 3), resolved(product_id, &v, 3)];

        let err = SufficiencyValidator::validate(&lines).unwrap_err();
        assert_eq!(
            err,
            AdjustmentError::InsufficientStock {
                product_id,
                variant_id: v.id(),
                requested: 3,
                available: 2,
            }
        );
    }
}
