// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{ImageAsset, Product, ProductId, QuantityUpdate, VariantId};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 商品リポジトリトレイト
/// 商品集約の永続化を抽象化する
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 商品集約をバリアントごと保存する
    ///
    /// # Arguments
    /// * `product` - 保存する商品
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗
    async fn save(&self, product: &Product) -> Result<(), RepositoryError>;

    /// 商品IDで商品を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Product))` - 商品が見つかった
    /// * `Ok(None)` - 商品が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// 指定されたバリアントIDのいずれかを含む商品を取得する
    ///
    /// # Arguments
    /// * `variant_ids` - 検索するバリアントIDのリスト
    ///
    /// # Returns
    /// * `Ok(Vec<Product>)` - 該当する商品（重複なし、順不同）
    /// * `Err(RepositoryError)` - 取得失敗
    async fn find_by_variant_ids(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<Product>, RepositoryError>;

    /// 新しい一意の商品IDを生成する
    fn next_identity(&self) -> ProductId;
}

/// 在庫ストアトレイト
/// 在庫調整の読み取りと書き込みを一つのトランザクションに束ねる
#[async_trait]
pub trait StockStore: Send + Sync {
    /// トランザクションを開始する
    ///
    /// # Returns
    /// * `Ok(Box<dyn StockTransaction>)` - 開始したトランザクション
    /// * `Err(RepositoryError)` - セッションを取得できなかった
    async fn begin(&self) -> Result<Box<dyn StockTransaction>, RepositoryError>;
}

/// 在庫トランザクション
///
/// 実装はコミットされずにドロップされた場合、未確定の変更をすべて破棄して
/// セッションを解放しなければならない（タスクのキャンセルや接続断の経路）。
#[async_trait]
pub trait StockTransaction: Send {
    /// 指定された商品IDの集約をトランザクション内で一度に取得する
    /// 存在しない商品は結果に含まれない
    async fn find_products(&mut self, product_ids: &[ProductId])
        -> Result<Vec<Product>, RepositoryError>;

    /// 在庫数の更新をまとめて適用する
    /// 一件でも適用できなければ全体を失敗として返す
    async fn apply_quantity_updates(
        &mut self,
        updates: &[QuantityUpdate],
    ) -> Result<(), RepositoryError>;

    /// コミットする
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    /// ロールバックする
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// 画像ストレージトレイト
/// 商品の作成・更新処理が使う外部コラボレーター（在庫調整では使わない）
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// 画像をアップロードし、保存済みアセット参照を返す
    ///
    /// # Arguments
    /// * `owner_id` - 画像を所有する商品ID
    /// * `payloads` - 画像ファイルの生データ
    async fn upload(
        &self,
        owner_id: ProductId,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<ImageAsset>, RepositoryError>;

    /// 公開IDで画像を削除する
    async fn delete(&self, public_ids: &[String]) -> Result<(), RepositoryError>;
}
