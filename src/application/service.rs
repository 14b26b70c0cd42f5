use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CategoryId, ClassificationGroup, DetailAttribute, ImageAsset, Product, ProductCode, UnitPrice,
    Variant,
};
use crate::domain::port::ProductRepository;
use std::sync::Arc;

mod inventory_adjustment_service;
mod product_query_service;

pub use inventory_adjustment_service::{AdjustmentPhase, InventoryAdjustmentService};
pub use product_query_service::ProductQueryService;

/// 登録するバリアントの入力
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub unit_price: u32,
    pub quantity_on_hand: u32,
    pub image: Option<ImageAsset>,
}

/// 登録する商品の入力
/// 画像はアップロード済みの参照を受け取る
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub code: u32,
    pub name: String,
    pub category_id: CategoryId,
    pub description: String,
    pub weight_grams: u32,
    pub cover_image: Option<ImageAsset>,
    pub gallery: Vec<ImageAsset>,
    pub details: Vec<DetailAttribute>,
    pub classifications: Vec<ClassificationGroup>,
    pub variants: Vec<NewVariant>,
}

/// 商品カタログアプリケーションサービス
/// 在庫調整の対象となる商品集約を登録する
pub struct ProductCatalogService {
    product_repository: Arc<dyn ProductRepository>,
}

impl ProductCatalogService {
    /// 新しい商品カタログサービスを作成
    ///
    /// # Arguments
    /// * `product_repository` - 商品リポジトリ
    pub fn new(product_repository: Arc<dyn ProductRepository>) -> Self {
        Self { product_repository }
    }

    /// 商品をバリアントごと登録する
    ///
    /// # Arguments
    /// * `request` - 商品の入力
    ///
    /// # Returns
    /// * `Ok(Product)` - 登録された商品
    /// * `Err(ApplicationError::DomainError)` - 入力が業務ルールに違反している
    /// * `Err(ApplicationError::RepositoryError)` - 保存失敗
    pub async fn register_product(&self, request: NewProduct) -> Result<Product, ApplicationError> {
        if request.name.trim().is_empty() {
            return Err(DomainError::InvalidValue("商品名は必須です".to_string()).into());
        }
        if request.variants.is_empty() {
            return Err(
                DomainError::InvalidValue("バリアントが一つ以上必要です".to_string()).into(),
            );
        }

        let mut product = Product::new(
            self.product_repository.next_identity(),
            ProductCode::new(request.code)?,
            request.name,
            request.category_id,
            request.description,
            request.weight_grams,
        );

        if let Some(cover) = request.cover_image {
            product.set_cover_image(cover);
        }
        for image in request.gallery {
            product.add_gallery_image(image);
        }
        for detail in request.details {
            product.add_detail(detail.name, detail.value);
        }
        for group in request.classifications {
            product.add_classification(group);
        }
        for input in request.variants {
            let mut variant = Variant::new(
                input.option1,
                input.option2,
                UnitPrice::new(input.unit_price)?,
                input.quantity_on_hand,
            )?;
            if let Some(image) = input.image {
                variant = variant.with_image(image);
            }
            product.add_variant(variant)?;
        }

        self.product_repository.save(&product).await?;
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryProductRepository;

    fn request() -> NewProduct {
        NewProduct {
            code: 3001,
            name: "キャップ".to_string(),
            category_id: CategoryId::from_uuid(uuid::Uuid::new_v4()),
            description: "コットン100%".to_string(),
            weight_grams: 120,
            cover_image: Some(ImageAsset::new("cover", "https://cdn.example/cap.jpg")),
            gallery: vec![],
            details: vec![DetailAttribute {
                name: "素材".to_string(),
                value: "綿".to_string(),
            }],
            classifications: vec![],
            variants: vec![NewVariant {
                option1: Some("紺".to_string()),
                option2: None,
                unit_price: 35_000,
                quantity_on_hand: 12,
                image: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_register_product_persists_aggregate() {
        let repository = Arc::new(InMemoryProductRepository::new());
        let service = ProductCatalogService::new(repository.clone());

        let product = service.register_product(request()).await.unwrap();
        let variant_id = product.variants()[0].id();

        assert_eq!(product.details().len(), 1);
        assert_eq!(
            repository.quantity_of(product.id(), variant_id).await,
            Some(12)
        );
    }

    #[tokio::test]
    async fn test_register_product_rejects_out_of_range_price() {
        let service = ProductCatalogService::new(Arc::new(InMemoryProductRepository::new()));
        let mut req = request();
        req.variants[0].unit_price = 999;

        let result = service.register_product(req).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::InvalidValue(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_product_rejects_zero_stock_variant() {
        let service = ProductCatalogService::new(Arc::new(InMemoryProductRepository::new()));
        let mut req = request();
        req.variants[0].quantity_on_hand = 0;

        let result = service.register_product(req).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::InvalidQuantity))
        ));
    }

    #[tokio::test]
    async fn test_register_product_requires_variants() {
        let service = ProductCatalogService::new(Arc::new(InMemoryProductRepository::new()));
        let mut req = request();
        req.variants.clear();

        assert!(service.register_product(req).await.is_err());
    }
}
