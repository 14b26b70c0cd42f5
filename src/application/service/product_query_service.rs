use crate::application::ApplicationError;
use crate::domain::model::{Product, ProductId, SalesInfoLookup, VariantId, VariantSalesInfo};
use crate::domain::port::ProductRepository;
use std::sync::Arc;

/// 商品クエリサービス
/// 読み取り専用の商品・販売情報の照会を提供する
pub struct ProductQueryService {
    product_repository: Arc<dyn ProductRepository>,
}

impl ProductQueryService {
    /// 新しい商品クエリサービスを作成
    ///
    /// # Arguments
    /// * `product_repository` - 商品リポジトリ
    pub fn new(product_repository: Arc<dyn ProductRepository>) -> Self {
        Self { product_repository }
    }

    /// 商品IDで商品を取得
    ///
    /// # Returns
    /// * `Ok(Some(Product))` - 商品が見つかった
    /// * `Ok(None)` - 商品が見つからなかった
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_product_by_id(
        &self,
        product_id: ProductId,
    ) -> Result<Option<Product>, ApplicationError> {
        self.product_repository
            .find_by_id(product_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// バリアント一件の販売情報を取得
    ///
    /// # Arguments
    /// * `variant_id` - バリアントID
    ///
    /// # Returns
    /// * `Ok(VariantSalesInfo)` - 商品名・表示画像・バリアント
    /// * `Err(ApplicationError::NotFound)` - どの商品にも属していない
    pub async fn get_variant_sales_info(
        &self,
        variant_id: VariantId,
    ) -> Result<VariantSalesInfo, ApplicationError> {
        let products = self
            .product_repository
            .find_by_variant_ids(&[variant_id])
            .await?;

        products
            .iter()
            .find_map(|product| VariantSalesInfo::from_product(product, variant_id))
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("バリアントが見つかりません: {}", variant_id))
            })
    }

    /// 複数バリアントの販売情報を要求順に取得
    /// 見つからないIDは `SalesInfoLookup::Missing` として結果に残す
    ///
    /// # Arguments
    /// * `variant_ids` - バリアントIDのリスト
    ///
    /// # Returns
    /// * `Ok(Vec<SalesInfoLookup>)` - 要求IDごとの結果
    /// * `Err(ApplicationError::NotFound)` - 一件も見つからなかった
    pub async fn get_multiple_variant_sales_info(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<SalesInfoLookup>, ApplicationError> {
        let products = self
            .product_repository
            .find_by_variant_ids(variant_ids)
            .await?;

        if products.is_empty() {
            return Err(ApplicationError::NotFound(
                "指定されたバリアントを含む商品が見つかりません".to_string(),
            ));
        }

        Ok(variant_ids
            .iter()
            .map(|variant_id| {
                products
                    .iter()
                    .find_map(|product| VariantSalesInfo::from_product(product, *variant_id))
                    .map(SalesInfoLookup::Found)
                    .unwrap_or(SalesInfoLookup::Missing(*variant_id))
            })
            .collect())
    }
}
