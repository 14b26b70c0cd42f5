// ドメインモデル（エンティティと値オブジェクト）

mod adjustment;
mod product;
mod sales_info;
mod value_objects;

pub use value_objects::{CategoryId, ImageAsset, ProductCode, ProductId, UnitPrice, VariantId};

pub use adjustment::{
    AdjustmentBatch, AdjustmentLine, AdjustmentMode, AdjustmentReceipt, ChargedLine,
    QuantityUpdate,
};
pub use product::{
    ClassificationGroup, ClassificationOption, DetailAttribute, Product, ProductRecord, Variant,
};
pub use sales_info::{SalesInfoLookup, VariantSalesInfo};
