//! # ヘルスチェックハンドラ
//!
//! API の稼働状態を確認するためのエンドポイント。
//!
//! - `/health` — Liveness Check（外部依存に触れず、常に `"ok"` を返す）
//! - `/health/ready` — Readiness Check（バックエンドストアへの接続状態を確認）
//!
//! レスポンス型は [`dodai_shared::HealthResponse`] / [`dodai_shared::ReadinessResponse`] を参照。

use std::{collections::HashMap, sync::Arc};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use dodai_infra::Store;
use dodai_shared::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};

/// Liveness チェックエンドポイント
///
/// プロセスが生きてリクエストに応答できることのみを示す。
/// 依存サービスには一切アクセスしない。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:    "ok".to_string(),
        timestamp: Utc::now(),
    })
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub store: Arc<dyn Store>,
}

/// Readiness Check エンドポイント
///
/// バックエンドストアに軽量クエリを発行して接続状態を確認する。
/// 成功 → 200、失敗 → 503。失敗理由はログにのみ記録し、
/// レスポンスには含めない（二値の健全性のみを報告する）。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let database = match state.store.ping().await {
        Ok(()) => CheckStatus::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
    };

    let mut checks = HashMap::new();
    checks.insert("database".to_string(), database);

    let all_ok = checks.values().all(|s| matches!(s, CheckStatus::Ok));
    let status = if all_ok {
        ReadinessStatus::Ready
    } else {
        ReadinessStatus::NotReady
    };
    let http_status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(ReadinessResponse {
            status,
            timestamp: Utc::now(),
            checks,
        }),
    )
}
