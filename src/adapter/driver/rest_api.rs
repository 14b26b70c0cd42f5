use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    AdjustInventoryRequest, RegisterProductRequest, SalesInfoBatchRequest,
};
use crate::adapter::driver::response_dto::{
    AdjustmentResponse, ProductDetailResponse, SalesInfoBatchResponse, SalesInfoEntryResponse,
    SalesInfoResponse,
};
use crate::application::service::{
    InventoryAdjustmentService, NewProduct, NewVariant, ProductCatalogService, ProductQueryService,
};
use crate::application::ApplicationError;
use crate::domain::error::{AdjustmentError, DomainError};
use crate::domain::model::{
    AdjustmentBatch, AdjustmentLine, AdjustmentMode, CategoryId, ProductId, VariantId,
};
use crate::domain::port::{Logger, ProductRepository, StockStore};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
}

impl ApiError {
    fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            requested: None,
            available: None,
        }
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub adjustment_service: Arc<InventoryAdjustmentService>,
    pub catalog_service: Arc<ProductCatalogService>,
    pub query_service: Arc<ProductQueryService>,
}

impl AppState {
    /// リポジトリと在庫ストアからサービス一式を組み立てる
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        stock_store: Arc<dyn StockStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            adjustment_service: Arc::new(InventoryAdjustmentService::new(stock_store, logger)),
            catalog_service: Arc::new(ProductCatalogService::new(product_repository.clone())),
            query_service: Arc::new(ProductQueryService::new(product_repository)),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/products", post(register_product))
        .route("/products/:product_id", get(get_product_by_id))
        .route("/inventory/adjustments", post(adjust_inventory))
        .route("/variants/sales-info", post(get_multiple_variant_sales_info))
        .route("/variants/:variant_id/sales-info", get(get_variant_sales_info))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn parse_id(raw: &str, label: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(format!("無効な{}形式です", label), "INVALID_ID")),
        )
    })
}

// 商品登録エンドポイント
async fn register_product(
    State(state): State<AppState>,
    Json(request): Json<RegisterProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductDetailResponse>)> {
    let new_product = NewProduct {
        code: request.code,
        name: request.name,
        category_id: CategoryId::from_uuid(request.category_id),
        description: request.description,
        weight_grams: request.weight_grams,
        cover_image: request.cover_image,
        gallery: request.gallery,
        details: request.details,
        classifications: request.classifications,
        variants: request
            .variants
            .into_iter()
            .map(|variant| NewVariant {
                option1: variant.option1,
                option2: variant.option2,
                unit_price: variant.unit_price,
                quantity_on_hand: variant.quantity_on_hand,
                image: variant.image,
            })
            .collect(),
    };

    let product = state
        .catalog_service
        .register_product(new_product)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ProductDetailResponse::from_product(&product)),
    ))
}

// 商品詳細取得エンドポイント
async fn get_product_by_id(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<ProductDetailResponse>> {
    let product_id = ProductId::from_uuid(parse_id(&product_id, "商品ID")?);

    match state.query_service.get_product_by_id(product_id).await {
        Ok(Some(product)) => Ok(Json(ProductDetailResponse::from_product(&product))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                "指定された商品が見つかりません",
                "PRODUCT_NOT_FOUND",
            )),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// 在庫一括調整エンドポイント
async fn adjust_inventory(
    State(state): State<AppState>,
    Json(request): Json<AdjustInventoryRequest>,
) -> ApiResult<Json<AdjustmentResponse>> {
    let lines = request
        .lines
        .iter()
        .map(|line| {
            AdjustmentLine::new(
                ProductId::from_uuid(line.product_id),
                VariantId::from_uuid(line.variant_id),
                line.quantity,
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_domain_error)?;

    let batch = AdjustmentBatch::new(lines, AdjustmentMode::from_restock_flag(request.restock));
    let receipt = state
        .adjustment_service
        .adjust_inventory(batch)
        .await
        .map_err(map_adjustment_error)?;

    Ok(Json(AdjustmentResponse::from_receipt(&receipt)))
}

// バリアント販売情報取得エンドポイント
async fn get_variant_sales_info(
    State(state): State<AppState>,
    Path(variant_id): Path<String>,
) -> ApiResult<Json<SalesInfoResponse>> {
    let variant_id = VariantId::from_uuid(parse_id(&variant_id, "バリアントID")?);

    let info = state
        .query_service
        .get_variant_sales_info(variant_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(SalesInfoResponse::from_sales_info(&info)))
}

// 複数バリアント販売情報取得エンドポイント
async fn get_multiple_variant_sales_info(
    State(state): State<AppState>,
    Json(request): Json<SalesInfoBatchRequest>,
) -> ApiResult<Json<SalesInfoBatchResponse>> {
    let variant_ids: Vec<VariantId> = request
        .variant_ids
        .into_iter()
        .map(VariantId::from_uuid)
        .collect();

    let lookups = state
        .query_service
        .get_multiple_variant_sales_info(&variant_ids)
        .await
        .map_err(map_application_error)?;

    Ok(Json(SalesInfoBatchResponse {
        results: lookups.iter().map(SalesInfoEntryResponse::from_lookup).collect(),
    }))
}

// 在庫調整エラーをHTTPレスポンスに変換
fn map_adjustment_error(err: AdjustmentError) -> (StatusCode, Json<ApiError>) {
    let message = err.to_string();
    match err {
        AdjustmentError::ProductNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(message, "PRODUCT_NOT_FOUND")),
        ),
        AdjustmentError::VariantNotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(message, "VARIANT_NOT_FOUND")),
        ),
        AdjustmentError::InsufficientStock {
            requested,
            available,
            ..
        } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                requested: Some(requested),
                available: Some(available),
                ..ApiError::new(message, "INSUFFICIENT_STOCK")
            }),
        ),
        AdjustmentError::StorageFailure(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(message, "STORAGE_FAILURE")),
        ),
    }
}

// アプリケーションエラーをHTTPレスポンスに変換
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(repo_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(repo_err.to_string(), "REPOSITORY_ERROR")),
        ),
        ApplicationError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(msg, "NOT_FOUND")),
        ),
    }
}

// ドメインエラーをHTTPレスポンスに変換
fn map_domain_error(err: DomainError) -> (StatusCode, Json<ApiError>) {
    match err {
        DomainError::InvalidQuantity => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("無効な数量です", "INVALID_QUANTITY")),
        ),
        DomainError::InvalidValue(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(msg, "INVALID_VALUE")),
        ),
        DomainError::DuplicateVariant(id) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                format!("バリアントIDが重複しています: {}", id),
                "DUPLICATE_VARIANT",
            )),
        ),
        DomainError::InsufficientStock {
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                requested: Some(requested),
                available: Some(available),
                ..ApiError::new("在庫不足です", "INSUFFICIENT_STOCK")
            }),
        ),
    }
}
