//! # ヘルスチェック共通型
//!
//! Liveness / Readiness エンドポイントが返すレスポンス型を提供する。
//!
//! - Liveness（`GET /health`）: プロセスが生きているかのみを示す。
//!   外部依存には一切アクセスしない。
//! - Readiness（`GET /health/ready`）: バックエンドストアへの接続状態を
//!   含め、トラフィックを受けられる状態かを示す。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness チェックレスポンス
///
/// `status` は常に `"ok"`、`timestamp` はレスポンス生成時刻（RFC 3339）。
///
/// ## 使用例
///
/// ```
/// use chrono::Utc;
/// use dodai_shared::HealthResponse;
///
/// let response = HealthResponse {
///     status:    "ok".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(response.status, "ok");
/// ```
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（常に `"ok"`）
    pub status:    String,
    /// レスポンス生成時刻（RFC 3339 形式でシリアライズされる）
    pub timestamp: DateTime<Utc>,
}

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// チェック成功
    Ok,
    /// チェック失敗
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// 全依存サービスが利用可能
    Ready,
    /// 一部の依存サービスが利用不可
    NotReady,
}

/// Readiness チェックレスポンス
///
/// `status` は全体のステータス、`checks` は個別チェック結果
/// （キー: チェック名、値: ステータス）を示す。
/// 失敗理由の詳細は含めない（レスポンスは二値の健全性のみを報告する）。
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// 全体のステータス
    pub status:    ReadinessStatus,
    /// レスポンス生成時刻（RFC 3339 形式でシリアライズされる）
    pub timestamp: DateTime<Utc>,
    /// 個別チェック結果（キー: チェック名、値: ステータス）
    pub checks:    HashMap<String, CheckStatus>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_health_responseのserializeで正しいjson形状にする() {
        let response = HealthResponse {
            status:    "ok".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ok");
        // timestamp は RFC 3339 としてパース可能な文字列であること
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_check_status_okのserialize結果() {
        let json = serde_json::to_value(CheckStatus::Ok).unwrap();
        assert_eq!(json, serde_json::json!("ok"));
    }

    #[test]
    fn test_check_status_errorのserialize結果() {
        let json = serde_json::to_value(CheckStatus::Error).unwrap();
        assert_eq!(json, serde_json::json!("error"));
    }

    #[test]
    fn test_readiness_status_readyのserialize結果() {
        let json = serde_json::to_value(ReadinessStatus::Ready).unwrap();
        assert_eq!(json, serde_json::json!("ready"));
    }

    #[test]
    fn test_readiness_status_not_readyのserialize結果() {
        let json = serde_json::to_value(ReadinessStatus::NotReady).unwrap();
        assert_eq!(json, serde_json::json!("not_ready"));
    }

    #[test]
    fn test_readiness_response_readyのserialize結果() {
        let mut checks = HashMap::new();
        checks.insert("database".to_string(), CheckStatus::Ok);
        let response = ReadinessResponse {
            status: ReadinessStatus::Ready,
            timestamp: Utc::now(),
            checks,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ready");
        assert_eq!(json["checks"]["database"], "ok");
    }

    #[test]
    fn test_readiness_response_not_readyのserialize結果() {
        let mut checks = HashMap::new();
        checks.insert("database".to_string(), CheckStatus::Error);
        let response = ReadinessResponse {
            status: ReadinessStatus::NotReady,
            timestamp: Utc::now(),
            checks,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "not_ready");
        assert_eq!(json["checks"]["database"], "error");
    }
}
