use catalog_inventory::adapter::driven::{MySqlProductRepository, TracingLogger};
use catalog_inventory::adapter::driver::rest_api::{create_router, AppState};
use catalog_inventory::adapter::{DatabaseConfig, DatabaseMigration, ServerConfig};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    tracing::info!(
        host = %db_config.host,
        port = db_config.port,
        database = %db_config.database,
        "Database configuration loaded"
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(db_config.max_connections)
        .connect(&db_config.connection_string())
        .await?;

    DatabaseMigration::new(pool.clone()).run().await?;

    // 商品リポジトリは集約の永続化と在庫トランザクションの両方を担う
    let repository = Arc::new(MySqlProductRepository::new(pool));
    let state = AppState::new(
        repository.clone(),
        repository,
        Arc::new(TracingLogger::new()),
    );

    let app = create_router().layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );
    let app = app.with_state(state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_address).await?;
    tracing::info!(address = %server_config.bind_address, "Catalog inventory service listening");

    axum::serve(listener, app).await?;

    Ok(())
}
