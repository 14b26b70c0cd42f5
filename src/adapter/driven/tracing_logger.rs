use crate::domain::port::Logger;
use std::collections::HashMap;
use uuid::Uuid;

/// tracingによるロガー実装
/// Loggerポートの呼び出しを構造化フィールド付きのtracingイベントに変換する。
/// 出力先とフィルタは起動時に登録されたsubscriberが決める
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

/// 追加コンテキストをキー順の `k=v` 列に整形する
fn format_context(context: Option<HashMap<String, String>>) -> String {
    let Some(context) = context else {
        return String::new();
    };

    let mut pairs: Vec<(String, String)> = context.into_iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_correlation_id(correlation_id: Option<Uuid>) -> String {
    correlation_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl Logger for TracingLogger {
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::debug!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::info!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::warn!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::error!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }
}
