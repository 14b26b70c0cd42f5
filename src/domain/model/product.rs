use crate::domain::error::DomainError;
use crate::domain::model::{
    CategoryId, ImageAsset, ProductCode, ProductId, QuantityUpdate, UnitPrice, VariantId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 商品詳細の属性（名前と値の組）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAttribute {
    pub name: String,
    pub value: String,
}

/// 分類グループの選択肢
/// 例: 色グループの「赤」。選択肢ごとに画像を持てる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationOption {
    pub name: String,
    pub image: Option<ImageAsset>,
}

/// バリアントを表示用にまとめる分類グループ（色・サイズなどの軸）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationGroup {
    pub name: String,
    pub level: u8,
    pub options: Vec<ClassificationOption>,
}

impl ClassificationGroup {
    /// 名前で選択肢を検索
    pub fn option(&self, name: &str) -> Option<&ClassificationOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

/// バリアント（SKU）
/// 商品集約の子エンティティで、販売単価と手持ち在庫数を持つ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    id: VariantId,
    option1: Option<String>,
    option2: Option<String>,
    unit_price: UnitPrice,
    quantity_on_hand: u32,
    image: Option<ImageAsset>,
}

impl Variant {
    /// 手持ち在庫数の上限
    pub const MAX_QUANTITY: u32 = 999_999;

    /// 新しいバリアントを作成
    ///
    /// # Arguments
    /// * `option1` - 第1分類の選択肢名
    /// * `option2` - 第2分類の選択肢名
    /// * `unit_price` - 販売単価
    /// * `quantity_on_hand` - 初期在庫数（1以上999,999以下）
    pub fn new(
        option1: Option<String>,
        option2: Option<String>,
        unit_price: UnitPrice,
        quantity_on_hand: u32,
    ) -> Result<Self, DomainError> {
        if quantity_on_hand == 0 || quantity_on_hand > Self::MAX_QUANTITY {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id: VariantId::new(),
            option1,
            option2,
            unit_price,
            quantity_on_hand,
            image: None,
        })
    }

    /// データベースから取得したデータでバリアントを再構築
    /// 販売で0まで減った在庫もそのまま受け入れる
    pub fn reconstruct(
        id: VariantId,
        option1: Option<String>,
        option2: Option<String>,
        unit_price: UnitPrice,
        quantity_on_hand: u32,
        image: Option<ImageAsset>,
    ) -> Self {
        Self {
            id,
            option1,
            option2,
            unit_price,
            quantity_on_hand,
            image,
        }
    }

    /// バリアント画像を設定
    pub fn with_image(mut self, image: ImageAsset) -> Self {
        self.image = Some(image);
        self
    }

    pub fn id(&self) -> VariantId {
        self.id
    }

    pub fn option1(&self) -> Option<&str> {
        self.option1.as_deref()
    }

    pub fn option2(&self) -> Option<&str> {
        self.option2.as_deref()
    }

    pub fn unit_price(&self) -> UnitPrice {
        self.unit_price
    }

    /// 手持ち在庫数を取得
    pub fn quantity_on_hand(&self) -> u32 {
        self.quantity_on_hand
    }

    pub fn image(&self) -> Option<&ImageAsset> {
        self.image.as_ref()
    }

    /// 指定された数量の在庫が利用可能かチェック
    pub fn has_available_stock(&self, quantity: u32) -> bool {
        self.quantity_on_hand >= quantity
    }

    /// 在庫を減らす（販売）
    ///
    /// # Returns
    /// * `Ok(())` - 減算成功
    /// * `Err(DomainError::InsufficientStock)` - 在庫不足（在庫数は変わらない）
    pub fn debit(&mut self, quantity: u32) -> Result<(), DomainError> {
        if !self.has_available_stock(quantity) {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available: self.quantity_on_hand,
            });
        }
        self.quantity_on_hand -= quantity;
        Ok(())
    }

    /// 在庫を戻す（返品・再入荷）
    /// 上限チェックはストレージの制約で行う
    pub fn credit(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.quantity_on_hand = self
            .quantity_on_hand
            .checked_add(quantity)
            .ok_or(DomainError::InvalidQuantity)?;
        Ok(())
    }

    pub(crate) fn set_quantity_on_hand(&mut self, quantity: u32) {
        self.quantity_on_hand = quantity;
    }
}

/// 永続化層から商品を再構築するためのデータ
pub struct ProductRecord {
    pub id: ProductId,
    pub code: ProductCode,
    pub name: String,
    pub category_id: CategoryId,
    pub description: String,
    pub weight_grams: u32,
    pub cover_image: Option<ImageAsset>,
    pub gallery: Vec<ImageAsset>,
    pub deleted: bool,
    pub hidden: bool,
    pub details: Vec<DetailAttribute>,
    pub classifications: Vec<ClassificationGroup>,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品集約
/// 詳細属性・分類グループ・バリアントを所有する
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    code: ProductCode,
    name: String,
    category_id: CategoryId,
    description: String,
    weight_grams: u32,
    cover_image: Option<ImageAsset>,
    gallery: Vec<ImageAsset>,
    deleted: bool,
    hidden: bool,
    details: Vec<DetailAttribute>,
    classifications: Vec<ClassificationGroup>,
    variants: Vec<Variant>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// 新しい商品を作成
    /// バリアント・画像などは後から追加する
    pub fn new(
        id: ProductId,
        code: ProductCode,
        name: String,
        category_id: CategoryId,
        description: String,
        weight_grams: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            code,
            name,
            category_id,
            description,
            weight_grams,
            cover_image: None,
            gallery: Vec::new(),
            deleted: false,
            hidden: false,
            details: Vec::new(),
            classifications: Vec::new(),
            variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースから取得したデータで商品を再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(record: ProductRecord) -> Result<Self, DomainError> {
        let mut product = Self {
            id: record.id,
            code: record.code,
            name: record.name,
            category_id: record.category_id,
            description: record.description,
            weight_grams: record.weight_grams,
            cover_image: record.cover_image,
            gallery: record.gallery,
            deleted: record.deleted,
            hidden: record.hidden,
            details: record.details,
            classifications: record.classifications,
            variants: Vec::with_capacity(record.variants.len()),
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        for variant in record.variants {
            product.push_variant(variant)?;
        }
        Ok(product)
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    /// 商品コードを取得（一度割り当てたら変更しない）
    pub fn code(&self) -> ProductCode {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn weight_grams(&self) -> u32 {
        self.weight_grams
    }

    pub fn cover_image(&self) -> Option<&ImageAsset> {
        self.cover_image.as_ref()
    }

    pub fn gallery(&self) -> &[ImageAsset] {
        &self.gallery
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn details(&self) -> &[DetailAttribute] {
        &self.details
    }

    pub fn classifications(&self) -> &[ClassificationGroup] {
        &self.classifications
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// バリアントIDでバリアントを検索
    /// 配列の位置ではなく識別子で参照する
    pub fn variant(&self, variant_id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.id() == variant_id)
    }

    /// 詳細属性を追加
    pub fn add_detail(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.details.push(DetailAttribute {
            name: name.into(),
            value: value.into(),
        });
        self.touch();
    }

    /// 分類グループを追加
    pub fn add_classification(&mut self, group: ClassificationGroup) {
        self.classifications.push(group);
        self.touch();
    }

    /// バリアントを追加
    ///
    /// # Returns
    /// * `Ok(())` - 追加成功
    /// * `Err(DomainError::DuplicateVariant)` - 同じIDのバリアントが既に存在する
    pub fn add_variant(&mut self, variant: Variant) -> Result<(), DomainError> {
        self.push_variant(variant)?;
        self.touch();
        Ok(())
    }

    pub fn set_cover_image(&mut self, image: ImageAsset) {
        self.cover_image = Some(image);
        self.touch();
    }

    pub fn add_gallery_image(&mut self, image: ImageAsset) {
        self.gallery.push(image);
        self.touch();
    }

    /// 商品を非表示にする
    pub fn hide(&mut self) {
        self.hidden = true;
        self.touch();
    }

    /// 商品を再表示する
    pub fn show(&mut self) {
        self.hidden = false;
        self.touch();
    }

    /// バリアントの表示用画像を決定する
    /// 第1分類の選択肢に画像があればそれを、なければカバー画像を使う
    pub fn display_image_for(&self, variant: &Variant) -> Option<&ImageAsset> {
        variant
            .option1()
            .and_then(|option_name| {
                self.classifications
                    .iter()
                    .find_map(|group| group.option(option_name))
            })
            .and_then(|option| option.image.as_ref())
            .or(self.cover_image.as_ref())
    }

    /// 確定した在庫数の更新を集約に反映する（ストレージアダプター専用）
    ///
    /// # Returns
    /// * `true` - 対象バリアントに反映した
    /// * `false` - 対象バリアントが存在しない
    pub(crate) fn apply_quantity_update(&mut self, update: &QuantityUpdate) -> bool {
        match self
            .variants
            .iter_mut()
            .find(|variant| variant.id() == update.variant_id)
        {
            Some(variant) => {
                variant.set_quantity_on_hand(update.new_quantity);
                true
            }
            None => false,
        }
    }

    fn push_variant(&mut self, variant: Variant) -> Result<(), DomainError> {
        if self.variant(variant.id()).is_some() {
            return Err(DomainError::DuplicateVariant(variant.id()));
        }
        self.variants.push(variant);
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
