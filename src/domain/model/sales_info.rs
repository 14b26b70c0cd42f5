use crate::domain::model::{ImageAsset, Product, ProductId, Variant, VariantId};

/// バリアントの販売情報
/// 注文画面などで、商品名と表示用画像をバリアントと一緒に見せるためのビュー
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSalesInfo {
    pub product_id: ProductId,
    pub product_name: String,
    pub display_image: Option<ImageAsset>,
    pub variant: Variant,
}

impl VariantSalesInfo {
    /// 商品集約から指定バリアントの販売情報を組み立てる
    ///
    /// # Returns
    /// * `Some(VariantSalesInfo)` - バリアントが商品内に存在する
    /// * `None` - バリアントが存在しない
    pub fn from_product(product: &Product, variant_id: VariantId) -> Option<Self> {
        let variant = product.variant(variant_id)?;
        Some(Self {
            product_id: product.id(),
            product_name: product.name().to_string(),
            display_image: product.display_image_for(variant).cloned(),
            variant: variant.clone(),
        })
    }
}

/// 複数バリアントの販売情報検索の結果（要求IDごと）
#[derive(Debug, Clone, PartialEq)]
pub enum SalesInfoLookup {
    Found(VariantSalesInfo),
    Missing(VariantId),
}
