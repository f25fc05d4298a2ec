//! # エラーレスポンスエンベロープ
//!
//! すべてのエラーレスポンスで共通の JSON エンベロープを提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は api サービスの責務（shared に axum 依存を入れない）
//! - `code` / `details` / `stack` は省略可能で、存在しない場合は
//!   JSON に出力しない
//! - `stack` と内部エラーメッセージは本番環境では決して設定されない
//!   （設定可否の判断は api 側のエラートランスレータが行う）

use serde::{Deserialize, Serialize};

/// バリデーション失敗の個別項目
///
/// `field` は失敗したフィールドのパス、`reason` は人間可読な理由。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field:  String,
    pub reason: String,
}

/// エラーレスポンスエンベロープ
///
/// すべてのエラーレスポンスで統一された形式。
/// `status` は常に `"error"` で、クライアント側が成功レスポンスと
/// 機械的に区別するための判別子となる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status:  String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code:    Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack:   Option<String>,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// メッセージのみのエンベロープを作成する。
    /// 省略可能フィールドはビルダー風メソッドで付加する。
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status:  "error".to_string(),
            message: message.into(),
            code:    None,
            details: None,
            stack:   None,
        }
    }

    /// 機械可読なエラーコードを設定する
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// バリデーション失敗の詳細を設定する
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldIssue>) -> Self {
        self.details = Some(details);
        self
    }

    /// スタックトレース相当の文字列を設定する
    ///
    /// 本番環境では呼び出してはならない（呼び出し可否の判断は
    /// エラートランスレータが行う）。
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// 500 Internal Server Error 用の固定エンベロープ
    ///
    /// message は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new("Internal server error")
    }
}
