use crate::domain::model::{
    AdjustmentReceipt, ClassificationGroup, DetailAttribute, ImageAsset, Product, SalesInfoLookup,
    Variant, VariantSalesInfo,
};
use serde::{Deserialize, Serialize};

/// 画像参照用のレスポンスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub public_id: String,
    pub url: String,
}

impl From<&ImageAsset> for ImageResponse {
    fn from(image: &ImageAsset) -> Self {
        Self {
            public_id: image.public_id.clone(),
            url: image.url.clone(),
        }
    }
}

/// バリアント用のレスポンスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResponse {
    pub variant_id: String,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub unit_price: u32,
    pub quantity_on_hand: u32,
    pub image: Option<ImageResponse>,
}

impl VariantResponse {
    pub fn from_variant(variant: &Variant) -> Self {
        Self {
            variant_id: variant.id().to_string(),
            option1: variant.option1().map(str::to_string),
            option2: variant.option2().map(str::to_string),
            unit_price: variant.unit_price().amount(),
            quantity_on_hand: variant.quantity_on_hand(),
            image: variant.image().map(ImageResponse::from),
        }
    }
}

/// 商品詳細用のレスポンスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    pub product_id: String,
    pub code: u32,
    pub name: String,
    pub category_id: String,
    pub description: String,
    pub weight_grams: u32,
    pub cover_image: Option<ImageResponse>,
    pub gallery: Vec<ImageResponse>,
    pub hidden: bool,
    pub deleted: bool,
    pub details: Vec<DetailAttribute>,
    pub classifications: Vec<ClassificationGroup>,
    pub variants: Vec<VariantResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductDetailResponse {
    /// ドメインオブジェクトからProductDetailResponseを作成
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id().to_string(),
            code: product.code().value(),
            name: product.name().to_string(),
            category_id: product.category_id().to_string(),
            description: product.description().to_string(),
            weight_grams: product.weight_grams(),
            cover_image: product.cover_image().map(ImageResponse::from),
            gallery: product.gallery().iter().map(ImageResponse::from).collect(),
            hidden: product.is_hidden(),
            deleted: product.is_deleted(),
            details: product.details().to_vec(),
            classifications: product.classifications().to_vec(),
            variants: product
                .variants()
                .iter()
                .map(VariantResponse::from_variant)
                .collect(),
            created_at: product.created_at().to_rfc3339(),
            updated_at: product.updated_at().to_rfc3339(),
        }
    }
}

/// 販売確定明細用のレスポンスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargedLineResponse {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: u32,
    pub unit_price_charged: u32,
}

/// 在庫調整結果用のレスポンスDTO
/// status は "debited" または "credited"。credited の場合 lines は空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentResponse {
    pub status: String,
    pub lines: Vec<ChargedLineResponse>,
}

impl AdjustmentResponse {
    pub fn from_receipt(receipt: &AdjustmentReceipt) -> Self {
        match receipt {
            AdjustmentReceipt::Debited(lines) => Self {
                status: "debited".to_string(),
                lines: lines
                    .iter()
                    .map(|line| ChargedLineResponse {
                        product_id: line.product_id.to_string(),
                        variant_id: line.variant_id.to_string(),
                        quantity: line.quantity,
                        unit_price_charged: line.unit_price_charged.amount(),
                    })
                    .collect(),
            },
            AdjustmentReceipt::Credited => Self {
                status: "credited".to_string(),
                lines: Vec::new(),
            },
        }
    }
}

/// バリアント販売情報用のレスポンスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInfoResponse {
    pub product_id: String,
    pub product_name: String,
    pub display_image: Option<ImageResponse>,
    pub variant: VariantResponse,
}

impl SalesInfoResponse {
    pub fn from_sales_info(info: &VariantSalesInfo) -> Self {
        Self {
            product_id: info.product_id.to_string(),
            product_name: info.product_name.clone(),
            display_image: info.display_image.as_ref().map(ImageResponse::from),
            variant: VariantResponse::from_variant(&info.variant),
        }
    }
}

/// 複数販売情報の要求IDごとの結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInfoEntryResponse {
    pub variant_id: String,
    pub found: bool,
    pub sales_info: Option<SalesInfoResponse>,
}

impl SalesInfoEntryResponse {
    pub fn from_lookup(lookup: &SalesInfoLookup) -> Self {
        match lookup {
            SalesInfoLookup::Found(info) => Self {
                variant_id: info.variant.id().to_string(),
                found: true,
                sales_info: Some(SalesInfoResponse::from_sales_info(info)),
            },
            SalesInfoLookup::Missing(variant_id) => Self {
                variant_id: variant_id.to_string(),
                found: false,
                sales_info: None,
            },
        }
    }
}

/// 複数販売情報用のレスポンスDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInfoBatchResponse {
    pub results: Vec<SalesInfoEntryResponse>,
}
