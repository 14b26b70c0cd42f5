use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};

/// 適用順に並べたマイグレーション（名前, SQL）
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_products_table",
        include_str!("../../migrations/001_create_products_table.sql"),
    ),
    (
        "002_create_product_variants_table",
        include_str!("../../migrations/002_create_product_variants_table.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを順番に実行する
    /// 各SQLは CREATE TABLE IF NOT EXISTS なので何度実行してもよい
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, migration_sql) in MIGRATIONS {
            tracing::debug!(migration = name, "Running migration");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", name, e))
                })?;
        }

        tracing::info!(count = MIGRATIONS.len(), "Database migrations applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_idempotent() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        for (_, sql) in MIGRATIONS {
            assert!(sql.contains("CREATE TABLE IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_variant_quantity_ceiling_is_enforced_by_schema() {
        let (_, variants_sql) = MIGRATIONS[1];
        assert!(variants_sql.contains("quantity_on_hand <= 999999"));
    }
}
