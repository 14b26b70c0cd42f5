use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::stock_transaction::MySqlStockTransaction;
use crate::domain::model::{
    CategoryId, ClassificationGroup, DetailAttribute, ImageAsset, Product, ProductCode, ProductId,
    ProductRecord, UnitPrice, Variant, VariantId,
};
use crate::domain::port::{ProductRepository, RepositoryError, StockStore, StockTransaction};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

// MySQL関連のインポート
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlConnection, Pool, QueryBuilder, Row};

/// MySQL商品リポジトリ
/// 商品集約の永続化と、在庫調整用トランザクションの開始を担当する
#[derive(Clone)]
pub struct MySqlProductRepository {
    pool: Pool<MySql>,
}

impl MySqlProductRepository {
    /// 新しいMySQL商品リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

/// 行ロックの取り方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RowLock {
    /// 通常の読み取り
    None,
    /// SELECT ... FOR UPDATE（トランザクション終了まで行を排他ロック）
    ForUpdate,
}

/// 指定された商品IDの集約をバリアント込みで取得する
/// 存在しないIDは結果に含まれない
pub(super) async fn fetch_products(
    conn: &mut MySqlConnection,
    product_ids: &[ProductId],
    lock: RowLock,
) -> Result<Vec<Product>, RepositoryError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut product_query = QueryBuilder::<MySql>::new(
        r#"
        SELECT id, code, name, category_id, description, weight_grams,
               cover_image_public_id, cover_image_url,
               gallery_json, details_json, classifications_json,
               is_deleted, is_hidden, created_at, updated_at
        FROM products
        WHERE id IN ("#,
    );
    let mut separated = product_query.separated(", ");
    for id in product_ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(")");
    if lock == RowLock::ForUpdate {
        product_query.push(" FOR UPDATE");
    }

    let product_rows = product_query
        .build()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

    let mut variant_query = QueryBuilder::<MySql>::new(
        r#"
        SELECT id, product_id, option1, option2, unit_price, quantity_on_hand,
               image_public_id, image_url
        FROM product_variants
        WHERE product_id IN ("#,
    );
    let mut separated = variant_query.separated(", ");
    for id in product_ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(") ORDER BY product_id ASC, position ASC");
    if lock == RowLock::ForUpdate {
        variant_query.push(" FOR UPDATE");
    }

    let variant_rows = variant_query
        .build()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("バリアントの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

    // 商品IDごとにバリアントをグループ化
    let mut variants_by_product: HashMap<String, Vec<Variant>> = HashMap::new();
    for row in &variant_rows {
        let product_id: String = row.get("product_id");
        variants_by_product
            .entry(product_id)
            .or_default()
            .push(variant_from_row(row)?);
    }

    product_rows
        .iter()
        .map(|row| {
            let id: String = row.get("id");
            let variants = variants_by_product.remove(&id).unwrap_or_default();
            product_from_row(row, variants)
        })
        .collect()
}

fn variant_from_row(row: &MySqlRow) -> Result<Variant, RepositoryError> {
    let id = VariantId::from_string(row.get("id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("バリアントIDの解析に失敗しました: {}", e))
    })?;
    let unit_price = UnitPrice::new(row.get::<u32, _>("unit_price")).map_err(|e| {
        RepositoryError::FetchFailed(format!("販売単価の構築に失敗しました: {}", e))
    })?;

    Ok(Variant::reconstruct(
        id,
        row.get::<Option<String>, _>("option1"),
        row.get::<Option<String>, _>("option2"),
        unit_price,
        row.get::<u32, _>("quantity_on_hand"),
        image_from_columns(
            row.get::<Option<String>, _>("image_public_id"),
            row.get::<Option<String>, _>("image_url"),
        ),
    ))
}

fn product_from_row(row: &MySqlRow, variants: Vec<Variant>) -> Result<Product, RepositoryError> {
    let id = ProductId::from_string(row.get("id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e))
    })?;
    let code = ProductCode::new(row.get::<u32, _>("code")).map_err(|e| {
        RepositoryError::FetchFailed(format!("商品コードの構築に失敗しました: {}", e))
    })?;
    let category_id = CategoryId::from_string(row.get("category_id")).map_err(|e| {
        RepositoryError::FetchFailed(format!("カテゴリIDの解析に失敗しました: {}", e))
    })?;

    let gallery: Vec<ImageAsset> = decode_json(row.get("gallery_json"), "ギャラリー画像")?;
    let details: Vec<DetailAttribute> = decode_json(row.get("details_json"), "詳細属性")?;
    let classifications: Vec<ClassificationGroup> =
        decode_json(row.get("classifications_json"), "分類グループ")?;

    Product::reconstruct(ProductRecord {
        id,
        code,
        name: row.get("name"),
        category_id,
        description: row.get("description"),
        weight_grams: row.get::<u32, _>("weight_grams"),
        cover_image: image_from_columns(
            row.get::<Option<String>, _>("cover_image_public_id"),
            row.get::<Option<String>, _>("cover_image_url"),
        ),
        gallery,
        deleted: row.get::<bool, _>("is_deleted"),
        hidden: row.get::<bool, _>("is_hidden"),
        details,
        classifications,
        variants,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
    .map_err(|e| RepositoryError::FetchFailed(format!("商品集約の再構築に失敗しました: {}", e)))
}

fn image_from_columns(public_id: Option<String>, url: Option<String>) -> Option<ImageAsset> {
    match (public_id, url) {
        (Some(public_id), Some(url)) => Some(ImageAsset { public_id, url }),
        _ => None,
    }
}

fn decode_json<T: DeserializeOwned>(raw: &str, label: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| {
        RepositoryError::FetchFailed(format!("{}のJSON解析に失敗しました: {}", label, e))
    })
}

fn encode_json<T: serde::Serialize>(value: &T, label: &str) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| {
        RepositoryError::OperationFailed(format!("{}のJSON変換に失敗しました: {}", label, e))
    })
}

#[async_trait]
impl ProductRepository for MySqlProductRepository {
    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        let gallery_json = encode_json(&product.gallery(), "ギャラリー画像")?;
        let details_json = encode_json(&product.details(), "詳細属性")?;
        let classifications_json = encode_json(&product.classifications(), "分類グループ")?;
        let cover = product.cover_image();

        // 商品データをproductsテーブルにUPSERT（商品コードは更新しない）
        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, category_id, description, weight_grams,
                cover_image_public_id, cover_image_url,
                gallery_json, details_json, classifications_json,
                is_deleted, is_hidden, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                category_id = VALUES(category_id),
                description = VALUES(description),
                weight_grams = VALUES(weight_grams),
                cover_image_public_id = VALUES(cover_image_public_id),
                cover_image_url = VALUES(cover_image_url),
                gallery_json = VALUES(gallery_json),
                details_json = VALUES(details_json),
                classifications_json = VALUES(classifications_json),
                is_deleted = VALUES(is_deleted),
                is_hidden = VALUES(is_hidden),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(product.id().to_string())
        .bind(product.code().value())
        .bind(product.name())
        .bind(product.category_id().to_string())
        .bind(product.description())
        .bind(product.weight_grams())
        .bind(cover.map(|image| image.public_id.as_str()))
        .bind(cover.map(|image| image.url.as_str()))
        .bind(gallery_json)
        .bind(details_json)
        .bind(classifications_json)
        .bind(product.is_deleted())
        .bind(product.is_hidden())
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("商品の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        // 既存のバリアントを削除
        sqlx::query("DELETE FROM product_variants WHERE product_id = ?")
            .bind(product.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("バリアントの削除に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        // バリアントを順序付きでINSERT
        for (position, variant) in product.variants().iter().enumerate() {
            let image = variant.image();
            sqlx::query(
                r#"
                INSERT INTO product_variants (
                    id, product_id, position, option1, option2,
                    unit_price, quantity_on_hand, image_public_id, image_url
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(variant.id().to_string())
            .bind(product.id().to_string())
            .bind(position as u32)
            .bind(variant.option1())
            .bind(variant.option2())
            .bind(variant.unit_price().amount())
            .bind(variant.quantity_on_hand())
            .bind(image.map(|image| image.public_id.as_str()))
            .bind(image.map(|image| image.url.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("バリアントの保存に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;
        }

        // トランザクションをコミット
        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DatabaseError::ConnectionError(format!("接続の取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        let products = fetch_products(&mut conn, &[product_id], RowLock::None).await?;
        Ok(products.into_iter().next())
    }

    async fn find_by_variant_ids(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if variant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DatabaseError::ConnectionError(format!("接続の取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        let mut query =
            QueryBuilder::<MySql>::new("SELECT DISTINCT product_id FROM product_variants WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in variant_ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let rows = query
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("バリアント所有商品の検索に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        let mut product_ids = Vec::with_capacity(rows.len());
        for row in rows {
            let product_id = ProductId::from_string(row.get("product_id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("商品IDの解析に失敗しました: {}", e))
            })?;
            product_ids.push(product_id);
        }

        fetch_products(&mut conn, &product_ids, RowLock::None).await
    }

    fn next_identity(&self) -> ProductId {
        ProductId::new()
    }
}

#[async_trait]
impl StockStore for MySqlProductRepository {
    async fn begin(&self) -> Result<Box<dyn StockTransaction>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Ok(Box::new(MySqlStockTransaction::new(tx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_from_columns_requires_both_values() {
        assert_eq!(
            image_from_columns(Some("id".to_string()), Some("https://cdn/a.jpg".to_string())),
            Some(ImageAsset::new("id", "https://cdn/a.jpg"))
        );
        assert_eq!(image_from_columns(Some("id".to_string()), None), None);
        assert_eq!(image_from_columns(None, None), None);
    }

    #[test]
    fn test_json_columns_round_trip_details() {
        let details = vec![DetailAttribute {
            name: "素材".to_string(),
            value: "綿".to_string(),
        }];
        let raw = encode_json(&details, "詳細属性").unwrap();
        let decoded: Vec<DetailAttribute> = decode_json(&raw, "詳細属性").unwrap();
        assert_eq!(decoded, details);
    }

    #[test]
    fn test_decode_json_reports_label() {
        let result: Result<Vec<DetailAttribute>, _> = decode_json("not json", "詳細属性");
        match result {
            Err(RepositoryError::FetchFailed(msg)) => assert!(msg.contains("詳細属性")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
