use crate::domain::model::{ClassificationGroup, DetailAttribute, ImageAsset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 商品登録用のリクエストDTO
/// 画像はアップロード済みの参照（public_id, url）で受け取る
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterProductRequest {
    pub code: u32,
    pub name: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub description: String,
    pub weight_grams: u32,
    #[serde(default)]
    pub cover_image: Option<ImageAsset>,
    #[serde(default)]
    pub gallery: Vec<ImageAsset>,
    #[serde(default)]
    pub details: Vec<DetailAttribute>,
    #[serde(default)]
    pub classifications: Vec<ClassificationGroup>,
    pub variants: Vec<VariantRequest>,
}

/// バリアント登録用のリクエストDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct VariantRequest {
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    pub unit_price: u32,
    pub quantity_on_hand: u32,
    #[serde(default)]
    pub image: Option<ImageAsset>,
}

/// 在庫調整明細のリクエストDTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentLineRequest {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub quantity: u32,
}

/// 在庫調整用のリクエストDTO
/// restock が true なら返品・再入荷（加算）、省略または false なら販売（減算）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustInventoryRequest {
    pub lines: Vec<AdjustmentLineRequest>,
    #[serde(default)]
    pub restock: bool,
}

/// 複数バリアントの販売情報取得用のリクエストDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct SalesInfoBatchRequest {
    pub variant_ids: Vec<Uuid>,
}
