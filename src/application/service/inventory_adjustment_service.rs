use crate::domain::error::{AdjustmentError, AdjustmentErrorKind};
use crate::domain::model::{AdjustmentBatch, AdjustmentMode, AdjustmentReceipt, ChargedLine};
use crate::domain::port::{Logger, StockStore, StockTransaction};
use crate::domain::service::{
    BatchAdjustmentExecutor, ResolvedLine, StockLedgerResolver, SufficiencyValidator,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

const COMPONENT: &str = "InventoryAdjustmentService";

/// 在庫調整の進行段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentPhase {
    Pending,
    Resolving,
    /// 販売バッチのみ
    Validating,
    Executing,
    Committed,
    Aborted,
}

impl AdjustmentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentPhase::Pending => "Pending",
            AdjustmentPhase::Resolving => "Resolving",
            AdjustmentPhase::Validating => "Validating",
            AdjustmentPhase::Executing => "Executing",
            AdjustmentPhase::Committed => "Committed",
            AdjustmentPhase::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for AdjustmentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 在庫調整サービス
///
/// 解決 → 検証（販売のみ）→ 実行 を一つのトランザクションで行う窓口。
/// どの段階で失敗してもトランザクションは中断・解放され、呼び出し側には
/// `AdjustmentError` が一つだけ返る。部分的な適用が観測されることはない。
pub struct InventoryAdjustmentService {
    stock_store: Arc<dyn StockStore>,
    executor: BatchAdjustmentExecutor,
    logger: Arc<dyn Logger>,
}

impl InventoryAdjustmentService {
    /// 新しい在庫調整サービスを作成
    ///
    /// # Arguments
    /// * `stock_store` - トランザクションを提供する在庫ストア
    /// * `logger` - ロガー
    pub fn new(stock_store: Arc<dyn StockStore>, logger: Arc<dyn Logger>) -> Self {
        Self {
            stock_store,
            executor: BatchAdjustmentExecutor::new(logger.clone()),
            logger,
        }
    }

    /// 在庫を一括調整する
    ///
    /// # Arguments
    /// * `batch` - 調整明細と調整モード
    ///
    /// # Returns
    /// * `Ok(AdjustmentReceipt::Debited)` - 販売バッチ成功。入力順に明細ごとの販売単価
    /// * `Ok(AdjustmentReceipt::Credited)` - 返品・再入荷バッチ成功
    /// * `Err(AdjustmentError)` - 失敗。在庫は一切変更されていない
    pub async fn adjust_inventory(
        &self,
        batch: AdjustmentBatch,
    ) -> Result<AdjustmentReceipt, AdjustmentError> {
        let correlation_id = Uuid::new_v4();
        let mode = batch.mode();

        if batch.is_empty() {
            return Ok(Self::receipt(mode, &[]));
        }

        let mut context = HashMap::new();
        context.insert("mode".to_string(), format!("{:?}", mode));
        context.insert("lines".to_string(), batch.lines().len().to_string());
        self.logger.info(
            COMPONENT,
            "Inventory adjustment started",
            Some(correlation_id),
            Some(context),
        );

        let mut phase = AdjustmentPhase::Pending;
        let mut tx = match self.stock_store.begin().await {
            Ok(tx) => tx,
            Err(err) => return Err(self.aborted(phase, correlation_id, err.into())),
        };

        phase = AdjustmentPhase::Resolving;
        let resolved = match StockLedgerResolver::resolve(&mut *tx, &batch).await {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.abort_with(tx, phase, correlation_id, err).await),
        };

        if mode.is_debit() {
            phase = AdjustmentPhase::Validating;
            if let Err(err) = SufficiencyValidator::validate(&resolved) {
                return Err(self.abort_with(tx, phase, correlation_id, err).await);
            }
        }

        // 実行段階ではトランザクションの所有権をエグゼキューターに渡す
        phase = AdjustmentPhase::Executing;
        let updates = self
            .executor
            .execute(tx, &resolved, mode, correlation_id)
            .await
            .map_err(|err| self.aborted(phase, correlation_id, err))?;

        phase = AdjustmentPhase::Committed;
        let mut context = HashMap::new();
        context.insert("phase".to_string(), phase.to_string());
        context.insert("updated_variants".to_string(), updates.len().to_string());
        self.logger.info(
            COMPONENT,
            "Inventory adjustment committed",
            Some(correlation_id),
            Some(context),
        );

        Ok(Self::receipt(mode, &resolved))
    }

    fn receipt(mode: AdjustmentMode, resolved: &[ResolvedLine]) -> AdjustmentReceipt {
        match mode {
            AdjustmentMode::Debit => AdjustmentReceipt::Debited(
                resolved
                    .iter()
                    .map(|entry| ChargedLine {
                        product_id: entry.line.product_id(),
                        variant_id: entry.line.variant_id(),
                        quantity: entry.line.quantity(),
                        unit_price_charged: entry.variant.unit_price(),
                    })
                    .collect(),
            ),
            AdjustmentMode::Credit => AdjustmentReceipt::Credited,
        }
    }

    async fn abort_with(
        &self,
        tx: Box<dyn StockTransaction>,
        phase: AdjustmentPhase,
        correlation_id: Uuid,
        err: AdjustmentError,
    ) -> AdjustmentError {
        self.executor.abort(tx, correlation_id).await;
        self.aborted(phase, correlation_id, err)
    }

    /// 中断を記録してエラーをそのまま返す
    fn aborted(
        &self,
        phase: AdjustmentPhase,
        correlation_id: Uuid,
        err: AdjustmentError,
    ) -> AdjustmentError {
        let mut context = HashMap::new();
        context.insert("phase".to_string(), phase.to_string());
        context.insert("kind".to_string(), format!("{:?}", err.kind()));
        context.insert("error".to_string(), err.to_string());

        let message = "Inventory adjustment aborted";
        match err.kind() {
            AdjustmentErrorKind::StorageFailure => {
                self.logger
                    .error(COMPONENT, message, Some(correlation_id), Some(context))
            }
            AdjustmentErrorKind::NotFound | AdjustmentErrorKind::InsufficientStock => {
                self.logger
                    .warn(COMPONENT, message, Some(correlation_id), Some(context))
            }
        }

        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryProductRepository;
    use crate::domain::model::{
        AdjustmentLine, CategoryId, Product, ProductCode, ProductId, QuantityUpdate, UnitPrice,
        Variant, VariantId,
    };
    use crate::domain::port::{ProductRepository, RepositoryError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 出力されたログを記録するロガー
    #[derive(Default)]
    struct RecordingLogger {
        entries: Mutex<Vec<(String, String, HashMap<String, String>)>>,
    }

    impl RecordingLogger {
        fn record(&self, level: &str, message: &str, context: Option<HashMap<String, String>>) {
            self.entries.lock().unwrap().push((
                level.to_string(),
                message.to_string(),
                context.unwrap_or_default(),
            ));
        }

        fn aborted_phase(&self) -> Option<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .find(|(_, message, _)| message == "Inventory adjustment aborted")
                .and_then(|(_, _, context)| context.get("phase").cloned())
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, _: &str, message: &str, _: Option<Uuid>, context: Option<HashMap<String, String>>) {
            self.record("debug", message, context);
        }
        fn info(&self, _: &str, message: &str, _: Option<Uuid>, context: Option<HashMap<String, String>>) {
            self.record("info", message, context);
        }
        fn warn(&self, _: &str, message: &str, _: Option<Uuid>, context: Option<HashMap<String, String>>) {
            self.record("warn", message, context);
        }
        fn error(&self, _: &str, message: &str, _: Option<Uuid>, context: Option<HashMap<String, String>>) {
            self.record("error", message, context);
        }
    }

    /// トランザクションの開始・終了回数を数えるストア
    struct CountingStore {
        inner: InMemoryProductRepository,
        begun: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
    }

    struct CountingTransaction {
        inner: Box<dyn StockTransaction>,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StockStore for CountingStore {
        async fn begin(&self) -> Result<Box<dyn StockTransaction>, RepositoryError> {
            self.begun.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingTransaction {
                inner: self.inner.begin().await?,
                finished: self.finished.clone(),
            }))
        }
    }

    #[async_trait]
    impl StockTransaction for CountingTransaction {
        async fn find_products(
            &mut self,
            product_ids: &[ProductId],
        ) -> Result<Vec<Product>, RepositoryError> {
            self.inner.find_products(product_ids).await
        }

        async fn apply_quantity_updates(
            &mut self,
            updates: &[QuantityUpdate],
        ) -> Result<(), RepositoryError> {
            self.inner.apply_quantity_updates(updates).await
        }

        async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
            self.finished.fetch_add(1, Ordering::SeqCst);
            self.inner.commit().await
        }

        async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
            self.finished.fetch_add(1, Ordering::SeqCst);
            self.inner.rollback().await
        }
    }

    /// セッションを取得できないストア
    struct UnavailableStore;

    #[async_trait]
    impl StockStore for UnavailableStore {
        async fn begin(&self) -> Result<Box<dyn StockTransaction>, RepositoryError> {
            Err(RepositoryError::ConnectionFailed("connection refused".to_string()))
        }
    }

    struct Fixture {
        service: InventoryAdjustmentService,
        repository: InMemoryProductRepository,
        logger: Arc<RecordingLogger>,
        begun: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
        product_id: ProductId,
        variant_id: VariantId,
    }

    async fn fixture(quantity: u32) -> Fixture {
        let repository = InMemoryProductRepository::new();
        let mut product = Product::new(
            repository.next_identity(),
            ProductCode::new(1001).unwrap(),
            "スニーカー".to_string(),
            CategoryId::from_uuid(Uuid::new_v4()),
            "説明".to_string(),
            800,
        );
        let variant = Variant::new(
            Some("白".to_string()),
            Some("26cm".to_string()),
            UnitPrice::new(50_000).unwrap(),
            quantity,
        )
        .unwrap();
        let variant_id = variant.id();
        product.add_variant(variant).unwrap();
        repository.save(&product).await.unwrap();

        let begun = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let logger = Arc::new(RecordingLogger::default());
        let store = CountingStore {
            inner: repository.clone(),
            begun: begun.clone(),
            finished: finished.clone(),
        };

        Fixture {
            service: InventoryAdjustmentService::new(Arc::new(store), logger.clone()),
            repository,
            logger,
            begun,
            finished,
            product_id: product.id(),
            variant_id,
        }
    }

    fn line(product_id: ProductId, variant_id: VariantId, quantity: u32) -> AdjustmentLine {
        AdjustmentLine::new(product_id, variant_id, quantity).unwrap()
    }

    #[tokio::test]
    async fn test_debit_returns_charged_lines_and_commits() {
        let f = fixture(10).await;

        let receipt = f
            .service
            .adjust_inventory(AdjustmentBatch::debit(vec![line(f.product_id, f.variant_id, 3)]))
            .await
            .unwrap();

        assert_eq!(
            receipt,
            AdjustmentReceipt::Debited(vec![ChargedLine {
                product_id: f.product_id,
                variant_id: f.variant_id,
                quantity: 3,
                unit_price_charged: UnitPrice::new(50_000).unwrap(),
            }])
        );
        assert_eq!(f.repository.quantity_of(f.product_id, f.variant_id).await, Some(7));
        assert_eq!(f.begun.load(Ordering::SeqCst), 1);
        assert_eq!(f.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_credit_returns_bare_acknowledgement() {
        let f = fixture(4).await;

        let receipt = f
            .service
            .adjust_inventory(AdjustmentBatch::credit(vec![line(f.product_id, f.variant_id, 6)]))
            .await
            .unwrap();

        assert_eq!(receipt, AdjustmentReceipt::Credited);
        assert_eq!(f.repository.quantity_of(f.product_id, f.variant_id).await, Some(10));
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_in_validating_phase() {
        let f = fixture(4).await;

        let err = f
            .service
            .adjust_inventory(AdjustmentBatch::debit(vec![line(f.product_id, f.variant_id, 10)]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AdjustmentError::InsufficientStock {
                product_id: f.product_id,
                variant_id: f.variant_id,
                requested: 10,
                available: 4,
            }
        );
        assert_eq!(f.repository.quantity_of(f.product_id, f.variant_id).await, Some(4));
        assert_eq!(f.finished.load(Ordering::SeqCst), 1);
        assert_eq!(f.logger.aborted_phase().as_deref(), Some("Validating"));
    }

    #[tokio::test]
    async fn test_unknown_product_aborts_in_resolving_phase() {
        let f = fixture(10).await;
        let unknown = ProductId::new();

        let err = f
            .service
            .adjust_inventory(AdjustmentBatch::debit(vec![
                line(f.product_id, f.variant_id, 1),
                line(unknown, VariantId::new(), 1),
            ]))
            .await
            .unwrap_err();

        assert_eq!(err, AdjustmentError::ProductNotFound(unknown));
        assert_eq!(f.repository.quantity_of(f.product_id, f.variant_id).await, Some(10));
        assert_eq!(f.finished.load(Ordering::SeqCst), 1);
        assert_eq!(f.logger.aborted_phase().as_deref(), Some("Resolving"));
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_in_executing_phase() {
        let f = fixture(10).await;
        f.repository.inject_write_failure();

        let err = f
            .service
            .adjust_inventory(AdjustmentBatch::debit(vec![line(f.product_id, f.variant_id, 2)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AdjustmentErrorKind::StorageFailure);
        assert_eq!(f.repository.quantity_of(f.product_id, f.variant_id).await, Some(10));
        assert_eq!(f.finished.load(Ordering::SeqCst), 1);
        assert_eq!(f.logger.aborted_phase().as_deref(), Some("Executing"));
    }

    #[tokio::test]
    async fn test_credit_over_ceiling_is_storage_failure() {
        let f = fixture(999_000).await;

        let err = f
            .service
            .adjust_inventory(AdjustmentBatch::credit(vec![line(
                f.product_id,
                f.variant_id,
                1_000,
            )]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AdjustmentErrorKind::StorageFailure);
        assert_eq!(
            f.repository.quantity_of(f.product_id, f.variant_id).await,
            Some(999_000)
        );
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_open_transaction() {
        let f = fixture(10).await;

        let debit = f.service.adjust_inventory(AdjustmentBatch::debit(vec![])).await;
        let credit = f.service.adjust_inventory(AdjustmentBatch::credit(vec![])).await;

        assert_eq!(debit, Ok(AdjustmentReceipt::Debited(vec![])));
        assert_eq!(credit, Ok(AdjustmentReceipt::Credited));
        assert_eq!(f.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_storage_failure() {
        let logger = Arc::new(RecordingLogger::default());
        let service = InventoryAdjustmentService::new(Arc::new(UnavailableStore), logger.clone());

        let err = service
            .adjust_inventory(AdjustmentBatch::debit(vec![line(
                ProductId::new(),
                VariantId::new(),
                1,
            )]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AdjustmentErrorKind::StorageFailure);
        assert_eq!(logger.aborted_phase().as_deref(), Some("Pending"));
    }
}
