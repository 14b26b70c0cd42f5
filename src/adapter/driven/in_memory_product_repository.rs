use crate::domain::model::{Product, ProductId, QuantityUpdate, Variant, VariantId};
use crate::domain::port::{ProductRepository, RepositoryError, StockStore, StockTransaction};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type ProductTable = HashMap<ProductId, Product>;

/// インメモリ商品リポジトリ
/// テストとローカル実行用。トランザクションはテーブル全体のロックで直列化する
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<Mutex<ProductTable>>,
    fail_next_write: Arc<AtomicBool>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次の在庫書き込みを一度だけ失敗させる（障害注入）
    pub fn inject_write_failure(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// 現在コミット済みの在庫数を取得
    pub async fn quantity_of(&self, product_id: ProductId, variant_id: VariantId) -> Option<u32> {
        let products = self.products.lock().await;
        products
            .get(&product_id)
            .and_then(|product| product.variant(variant_id))
            .map(Variant::quantity_on_hand)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.lock().await;
        products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.lock().await;
        Ok(products.get(&product_id).cloned())
    }

    async fn find_by_variant_ids(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.lock().await;
        Ok(products
            .values()
            .filter(|product| variant_ids.iter().any(|id| product.variant(*id).is_some()))
            .cloned()
            .collect())
    }

    fn next_identity(&self) -> ProductId {
        ProductId::new()
    }
}

#[async_trait]
impl StockStore for InMemoryProductRepository {
    async fn begin(&self) -> Result<Box<dyn StockTransaction>, RepositoryError> {
        let products = self.products.clone().lock_owned().await;
        Ok(Box::new(InMemoryStockTransaction {
            products,
            staged: Vec::new(),
            fail_next_write: self.fail_next_write.clone(),
        }))
    }
}

/// インメモリ在庫トランザクション
/// 書き込みはコミットまで保留し、ドロップ時にロックごと破棄される
struct InMemoryStockTransaction {
    products: OwnedMutexGuard<ProductTable>,
    staged: Vec<QuantityUpdate>,
    fail_next_write: Arc<AtomicBool>,
}

#[async_trait]
impl StockTransaction for InMemoryStockTransaction {
    async fn find_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(product_ids
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect())
    }

    async fn apply_quantity_updates(
        &mut self,
        updates: &[QuantityUpdate],
    ) -> Result<(), RepositoryError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::OperationFailed(
                "注入された書き込み障害".to_string(),
            ));
        }

        // 全件を検証してから保留する（一件でも不正なら何も保留しない）
        for update in updates {
            if update.new_quantity > Variant::MAX_QUANTITY {
                return Err(RepositoryError::OperationFailed(format!(
                    "在庫数の上限制約に違反しました: variant {} = {}",
                    update.variant_id, update.new_quantity
                )));
            }
            let exists = self
                .products
                .get(&update.product_id)
                .and_then(|product| product.variant(update.variant_id))
                .is_some();
            if !exists {
                return Err(RepositoryError::OperationFailed(format!(
                    "更新対象のバリアントが見つかりません: product {}, variant {}",
                    update.product_id, update.variant_id
                )));
            }
        }

        self.staged.extend_from_slice(updates);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryStockTransaction {
            mut products,
            staged,
            ..
        } = *self;
        for update in &staged {
            if let Some(product) = products.get_mut(&update.product_id) {
                product.apply_quantity_update(update);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CategoryId, ProductCode, UnitPrice};

    async fn seeded(quantity: u32) -> (InMemoryProductRepository, ProductId, VariantId) {
        let repository = InMemoryProductRepository::new();
        let mut product = Product::new(
            repository.next_identity(),
            ProductCode::new(1).unwrap(),
            "商品".to_string(),
            CategoryId::from_uuid(uuid::Uuid::new_v4()),
            "説明".to_string(),
            100,
        );
        let variant = Variant::new(None, None, UnitPrice::new(50_000).unwrap(), quantity).unwrap();
        let variant_id = variant.id();
        product.add_variant(variant).unwrap();
        repository.save(&product).await.unwrap();
        (repository, product.id(), variant_id)
    }

    #[tokio::test]
    async fn test_commit_applies_staged_updates() {
        let (repository, product_id, variant_id) = seeded(10).await;

        let mut tx = repository.begin().await.unwrap();
        tx.apply_quantity_updates(&[QuantityUpdate {
            product_id,
            variant_id,
            new_quantity: 7,
        }])
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repository.quantity_of(product_id, variant_id).await, Some(7));
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_updates() {
        let (repository, product_id, variant_id) = seeded(10).await;

        let mut tx = repository.begin().await.unwrap();
        tx.apply_quantity_updates(&[QuantityUpdate {
            product_id,
            variant_id,
            new_quantity: 1,
        }])
        .await
        .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(repository.quantity_of(product_id, variant_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_drop_discards_staged_updates() {
        let (repository, product_id, variant_id) = seeded(10).await;

        {
            let mut tx = repository.begin().await.unwrap();
            tx.apply_quantity_updates(&[QuantityUpdate {
                product_id,
                variant_id,
                new_quantity: 2,
            }])
            .await
            .unwrap();
        }

        assert_eq!(repository.quantity_of(product_id, variant_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_max_quantity_constraint_rejects_whole_write() {
        let (repository, product_id, variant_id) = seeded(10).await;

        let mut tx = repository.begin().await.unwrap();
        let result = tx
            .apply_quantity_updates(&[QuantityUpdate {
                product_id,
                variant_id,
                new_quantity: Variant::MAX_QUANTITY + 1,
            }])
            .await;
        assert!(result.is_err());
        tx.commit().await.unwrap();

        assert_eq!(repository.quantity_of(product_id, variant_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_find_by_variant_ids() {
        let (repository, product_id, variant_id) = seeded(3).await;

        let found = repository.find_by_variant_ids(&[variant_id]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), product_id);

        let none = repository
            .find_by_variant_ids(&[VariantId::new()])
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
