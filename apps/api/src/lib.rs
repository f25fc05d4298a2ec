//! # Dodai API サーバー
//!
//! 最小構成の HTTP サービススキャフォールド。
//!
//! 業務ルートを持たず、横断的なリクエスト/レスポンスパイプラインのみを
//! 提供する:
//!
//! - **設定ローダ**: 環境変数からの型付き設定読み込みと起動時検証（[`config`]）
//! - **エラー分類とトランスレータ**: 型付きエラーから統一エンベロープへの
//!   一元変換（[`error`]）
//! - **リクエストバリデーション**: ルート単位のスキーマ検証ミドルウェア
//!   （[`validation`]）
//! - **ヘルスチェック**: Liveness / Readiness プローブ（[`handler::health`]）
//!
//! 業務ルートは [`app::build_app`] の Router に追加し、必要に応じて
//! [`validation::RequestSchemas`] を `route_layer` で適用する。

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod validation;
