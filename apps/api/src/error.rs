//! # エラー型定義とエラートランスレータ
//!
//! API 全体で使用するエラー型と、エラーを HTTP レスポンスに変換する
//! 終端ミドルウェアを提供する。
//!
//! ## 設計方針
//!
//! ハンドラーとミドルウェアは自分でエラーレスポンスを組み立てず、
//! [`ApiError`] を伝播するだけにする。エンベロープへの変換は
//! [`translate_error`] が唯一のレンダリングポイントとして行う。
//! これにより、どこで発生したエラーでも同一のエンベロープ形式が保証される。
//!
//! ## 変換の優先順位
//!
//! 1. [`ApiError::App`] — ステータス・コード・メッセージをそのまま使用
//! 2. [`ApiError::Validation`] — 400 / `VALIDATION_ERROR` / フィールド別詳細
//! 3. [`ApiError::Internal`] — 500。本番環境では固定メッセージに置き換え、
//!    それ以外ではエラーチェーンとスタック相当の情報を含める
//!
//! ステータス 500 以上のエラーは、サニタイズ前の内容をログに出力してから
//! レスポンスを送出する。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dodai_shared::{ErrorResponse, FieldIssue};
use http::StatusCode;

use crate::config::Environment;

/// API のエラー型
///
/// すべてのハンドラー・ミドルウェアの失敗はこの型に収束する。
/// 変換先のエンベロープは [`translate_error`] のみが構築する。
#[derive(Debug)]
pub enum ApiError {
    /// 業務ロジックが意図的に発生させるエラー
    ///
    /// ステータス・機械可読コード・メッセージをエラーの発生地点で
    /// 確定させる。環境に関わらずそのままクライアントに返される。
    App {
        status:  StatusCode,
        code:    String,
        message: String,
    },

    /// リクエスト入力のバリデーション失敗
    ///
    /// フィールドパスと理由のリストを保持する。常に 400 になる。
    Validation(Vec<FieldIssue>),

    /// 分類されないエラー（インフラ障害・想定外の実行時エラー）
    ///
    /// 常に 500 になる。本番環境では内容を一切開示しない。
    Internal(anyhow::Error),
}

impl ApiError {
    /// 業務エラーを作成する
    pub fn app(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::App {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// このエラーに対応する HTTP ステータス
    pub fn status(&self) -> StatusCode {
        match self {
            Self::App { status, .. } => *status,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::App { code, message, .. } => write!(f, "{code}: {message}"),
            Self::Validation(issues) => write!(f, "バリデーションエラー（{} 件）", issues.len()),
            Self::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl From<dodai_infra::InfraError> for ApiError {
    fn from(e: dodai_infra::InfraError) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

/// `IntoResponse` 実装
///
/// ここではエンベロープを構築しない。エラー値を extensions に格納した
/// 素のレスポンスを返し、[`translate_error`] がそれを取り出して
/// レンダリングする。extensions は `Clone` を要求するため `Arc` で包む。
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(Arc::new(self));
        response
    }
}

/// エラートランスレータ（終端ミドルウェア）
///
/// ルートの直外側にレイヤーし、上流から伝播してきた [`ApiError`] を
/// 統一エンベロープの JSON レスポンスに変換する。エラーを含まない
/// レスポンスはそのまま通過させる。
pub async fn translate_error(
    State(environment): State<Environment>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;

    let Some(error) = response.extensions_mut().remove::<Arc<ApiError>>() else {
        return response;
    };

    let status = error.status();

    // 500 以上はサニタイズ前の内容を必ずログに残す
    if status.is_server_error() {
        tracing::error!(error = ?error, status = %status, "サーバーエラーが発生しました");
    }

    let envelope = match error.as_ref() {
        ApiError::App { code, message, .. } => {
            ErrorResponse::new(message.clone()).with_code(code.clone())
        }
        ApiError::Validation(issues) => ErrorResponse::new("Validation error")
            .with_code("VALIDATION_ERROR")
            .with_details(issues.clone()),
        ApiError::Internal(e) => {
            if environment.is_production() {
                ErrorResponse::internal_error()
            } else {
                ErrorResponse::new(e.to_string()).with_stack(format!("{e:?}"))
            }
        }
    };

    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_appエラーが指定したステータスを返す() {
        let error = ApiError::app(StatusCode::FORBIDDEN, "FORBIDDEN", "アクセス権がありません");

        assert_eq!(error.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_validationエラーのステータスは400になる() {
        let error = ApiError::Validation(vec![FieldIssue {
            field:  "email".to_string(),
            reason: "invalid email".to_string(),
        }]);

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internalエラーのステータスは500になる() {
        let error = ApiError::Internal(anyhow::anyhow!("boom"));

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_infra_errorがinternalに変換される() {
        let error: ApiError = dodai_infra::InfraError::unexpected("接続喪失").into();

        assert!(matches!(error, ApiError::Internal(_)));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_responseがエラー値をextensionsに格納する() {
        let response =
            ApiError::app(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let stored = response.extensions().get::<Arc<ApiError>>();
        assert!(stored.is_some());
    }

    #[test]
    fn test_displayがコードとメッセージを含む() {
        let error = ApiError::app(StatusCode::FORBIDDEN, "FORBIDDEN", "アクセス権がありません");

        assert_eq!(error.to_string(), "FORBIDDEN: アクセス権がありません");
    }
}
