//! # ルーター構築
//!
//! 設定とストアからアプリケーション全体の [`Router`] を組み立てる。
//!
//! `main` と統合テストの双方がここを呼ぶことで、テストが本番と
//! 同一のミドルウェアスタックを通るようにする。

use std::sync::Arc;

use axum::{
    Router, extract::DefaultBodyLimit, middleware::from_fn_with_state, routing::get,
};
use dodai_infra::Store;
use dodai_shared::observability::{MakeRequestUuidV7, make_request_span};
use http::{HeaderValue, StatusCode, header};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    config::AppConfig,
    error::{ApiError, translate_error},
    handler::{ReadinessState, health_check, readiness_check},
    validation::BODY_LIMIT,
};

/// アプリケーションの [`Router`] を構築する
///
/// レイヤー順序（下に書いたものが外側）:
/// 1. translate_error（ルート直外・最内）: 伝播したエラーをエンベロープに変換
/// 2. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
/// 3. TraceLayer: カスタムスパンに request_id を含め、全ログに自動注入
/// 4. SetRequestIdLayer: リクエスト受信時に UUID v7 を生成（またはクライアント提供値を使用）
/// 5. CompressionLayer: gzip 圧縮
/// 6. DefaultBodyLimit: ボディサイズ上限（10 MiB）
/// 7. CorsLayer: CORS 制御
/// 8. SetResponseHeaderLayer（最外）: セキュリティヘッダー
pub fn build_app(config: &AppConfig, store: Arc<dyn Store>) -> Router {
    let readiness_state = Arc::new(ReadinessState { store });

    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .fallback(not_found)
        .layer(from_fn_with_state(config.environment, translate_error))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer(&config.cors_origin))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// CORS レイヤーを構築する
///
/// - `"*"`: 任意のオリジンを許可（資格情報なし）
/// - それ以外: 単一オリジンのみを許可し、資格情報付きリクエストを受ける
fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    // 起動時の設定検証でヘッダー値として妥当なことを確認済み
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_credentials(true)
            .allow_methods([
                http::Method::GET,
                http::Method::POST,
                http::Method::PUT,
                http::Method::PATCH,
                http::Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE]),
        Err(_) => CorsLayer::new().allow_origin(Any),
    }
}

/// 未定義ルート用のフォールバックハンドラ
///
/// 404 も他のエラーと同じエンベロープで返す。
async fn not_found() -> ApiError {
    ApiError::app(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
}
