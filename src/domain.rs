// ドメイン層
// 商品集約・在庫調整エンジン・外部依存のポート

pub mod error;
pub mod model;
pub mod port;
pub mod service;
