use crate::domain::port::RepositoryError;

/// データベースエラー型
/// sqlxのエラーをアダプター内で分類し、リポジトリエラーに変換する
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseError {
    /// 接続・トランザクション開始の失敗
    ConnectionError(String),
    /// SQL実行の失敗（制約違反を含む）
    QueryError(String),
    /// マイグレーションの失敗
    MigrationError(String),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::QueryError(msg) => write!(f, "Database query error: {}", msg),
            DatabaseError::MigrationError(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) | DatabaseError::MigrationError(msg) => {
                RepositoryError::OperationFailed(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_maps_to_connection_failed() {
        let err: RepositoryError = DatabaseError::ConnectionError("refused".to_string()).into();
        assert_eq!(err, RepositoryError::ConnectionFailed("refused".to_string()));
    }

    #[test]
    fn test_query_error_maps_to_operation_failed() {
        let err: RepositoryError =
            DatabaseError::QueryError("check constraint violated".to_string()).into();
        assert_eq!(
            err,
            RepositoryError::OperationFailed("check constraint violated".to_string())
        );
    }
}
