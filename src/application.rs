// アプリケーション層
// ユースケースを組み立て、ドメインサービスとポートを協調させる

pub mod error;
pub mod service;

pub use error::ApplicationError;
