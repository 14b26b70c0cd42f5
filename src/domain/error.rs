use crate::domain::model::{ProductId, VariantId};
use crate::domain::port::RepositoryError;

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 在庫不足（要求数量が手持ち在庫を超えている）
    InsufficientStock { requested: u32, available: u32 },
    /// 無効な数量（例: 0以下の数量、上限超過の初期在庫）
    InvalidQuantity,
    /// 同じバリアントIDが商品内で重複している
    DuplicateVariant(VariantId),
    /// 無効な値
    InvalidValue(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InsufficientStock {
                requested,
                available,
            } => write!(
                f,
                "Insufficient stock: requested {}, available {}",
                requested, available
            ),
            DomainError::InvalidQuantity => write!(f, "Invalid quantity"),
            DomainError::DuplicateVariant(id) => write!(f, "Duplicate variant: {}", id),
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// 在庫調整エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentErrorKind {
    /// 商品またはバリアントが存在しない（呼び出し側の誤り、または古い参照）
    NotFound,
    /// 在庫不足（業務ルール違反、呼び出し側で回復可能）
    InsufficientStock,
    /// ストレージ障害（呼び出し側でリトライまたは汎用エラー表示）
    StorageFailure,
}

/// 在庫調整エラー
/// 解決・検証・実行のどこで失敗しても、呼び出し側にはこの型が一つだけ返る
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdjustmentError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Variant not found: product {product_id}, variant {variant_id}")]
    VariantNotFound {
        product_id: ProductId,
        variant_id: VariantId,
    },

    #[error(
        "Insufficient stock: product {product_id}, variant {variant_id} (requested {requested}, available {available})"
    )]
    InsufficientStock {
        product_id: ProductId,
        variant_id: VariantId,
        requested: u32,
        available: u32,
    },

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl AdjustmentError {
    /// エラーの分類を取得
    pub fn kind(&self) -> AdjustmentErrorKind {
        match self {
            AdjustmentError::ProductNotFound(_) | AdjustmentError::VariantNotFound { .. } => {
                AdjustmentErrorKind::NotFound
            }
            AdjustmentError::InsufficientStock { .. } => AdjustmentErrorKind::InsufficientStock,
            AdjustmentError::StorageFailure(_) => AdjustmentErrorKind::StorageFailure,
        }
    }
}

impl From<RepositoryError> for AdjustmentError {
    fn from(err: RepositoryError) -> Self {
        AdjustmentError::StorageFailure(err.to_string())
    }
}
