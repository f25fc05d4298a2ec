//! # リクエストバリデーションミドルウェア
//!
//! ルートごとに宣言されたスキーマで body / query / path パラメータを
//! 検証するミドルウェアを提供する。
//!
//! ## 設計方針
//!
//! - スキーマは [`Schema`] トレイト（「検証して正規化値を返すか、
//!   フィールド別の失敗リストを返す」という単一操作）として抽象化し、
//!   具体的な検証エンジンを差し替え可能にする
//! - 検証は body → query → params の順で行い、最初に失敗した入力の
//!   詳細のみを報告する（複数の入力位置の失敗を 1 レスポンスに
//!   集約しない）
//! - 成功時は正規化された値が生の値を置き換える。文字列化された数値の
//!   型変換（query の `"42"` → `42` など）もここで行われるため、
//!   ハンドラーは型付きの値だけを扱えばよい
//! - 失敗時はレスポンスを直接構築せず [`crate::error::ApiError`] を
//!   伝播する（レンダリングはエラートランスレータの責務）

use std::{marker::PhantomData, sync::Arc};

use axum::{
    body::{Body, to_bytes},
    extract::{FromRequestParts, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};
use dodai_shared::FieldIssue;
use http::{HeaderValue, StatusCode, header::CONTENT_LENGTH, request::Parts};
use http_body_util::LengthLimitError;
use serde::{Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::error::ApiError;

/// リクエストボディの最大サイズ（10 MiB）
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// スキーマに渡される生の入力
///
/// body は JSON バイト列、query / params はキーと値のペア列として渡す。
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    /// JSON ボディ
    Json(&'a [u8]),
    /// query または path パラメータのキー・値ペア
    Pairs(&'a [(String, String)]),
}

/// 入力スキーマの抽象化
///
/// 「検証して正規化するか、失敗する」という単一操作のみを持つ。
/// 正規化値は JSON 値として返し、後続の抽出器が型付きの値に戻す。
pub trait Schema: Send + Sync {
    fn validate(&self, input: RawInput<'_>) -> Result<serde_json::Value, Vec<FieldIssue>>;
}

/// serde + validator による [`Schema`] 実装
///
/// デシリアライズで形を検証し、[`Validate`] で値の制約を検証する。
/// `Pairs` 入力は urlencoded 経由でデシリアライズするため、
/// 文字列化された数値が数値フィールドに変換される。
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize + Validate + Send + Sync,
{
    fn validate(&self, input: RawInput<'_>) -> Result<serde_json::Value, Vec<FieldIssue>> {
        let value: T = match input {
            RawInput::Json(bytes) => {
                serde_json::from_slice(bytes).map_err(|e| vec![unlocated(e.to_string())])?
            }
            RawInput::Pairs(pairs) => {
                let encoded = serde_urlencoded::to_string(pairs)
                    .map_err(|e| vec![unlocated(e.to_string())])?;
                serde_urlencoded::from_str(&encoded)
                    .map_err(|e| vec![unlocated(e.to_string())])?
            }
        };

        value.validate().map_err(collect_issues)?;

        serde_json::to_value(&value).map_err(|e| vec![unlocated(e.to_string())])
    }
}

/// フィールドを特定できない失敗項目を作成する
///
/// ミドルウェアが入力位置（body / query / params）のラベルを後付けする。
fn unlocated(reason: String) -> FieldIssue {
    FieldIssue {
        field: String::new(),
        reason,
    }
}

/// validator のエラーを [`FieldIssue`] のリストに変換する
///
/// `HashMap` の順序は不定なので、レスポンスの再現性のために
/// フィールド名でソートする。
fn collect_issues(errors: validator::ValidationErrors) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldIssue {
                field:  field.to_string(),
                reason: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
            })
        })
        .collect();
    issues.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.reason.cmp(&b.reason)));
    issues
}

/// ボディ読み取りエラーがサイズ上限超過かどうかを判定する
fn is_length_limit(error: &axum::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(e) = source {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            return true;
        }
        source = e.source();
    }
    false
}

/// フィールドが空の失敗項目に入力位置のラベルを付ける
fn locate(location: &str, issues: Vec<FieldIssue>) -> Vec<FieldIssue> {
    issues
        .into_iter()
        .map(|mut issue| {
            if issue.field.is_empty() {
                issue.field = location.to_string();
            }
            issue
        })
        .collect()
}

/// ルートに適用する入力スキーマの組
///
/// body / query / path パラメータのそれぞれに独立したスキーマを
/// 宣言できる。宣言されていない入力は検証しない。
#[derive(Clone, Default)]
pub struct RequestSchemas {
    body:   Option<Arc<dyn Schema>>,
    query:  Option<Arc<dyn Schema>>,
    params: Option<Arc<dyn Schema>>,
}

impl RequestSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// body スキーマを宣言する
    #[must_use]
    pub fn body(mut self, schema: impl Schema + 'static) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// query スキーマを宣言する
    #[must_use]
    pub fn query(mut self, schema: impl Schema + 'static) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    /// path パラメータスキーマを宣言する
    #[must_use]
    pub fn params(mut self, schema: impl Schema + 'static) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }
}

/// 検証済み query の正規化値（リクエスト extensions に格納される）
#[derive(Debug, Clone)]
pub struct ValidatedQueryValue(pub serde_json::Value);

/// 検証済み path パラメータの正規化値（リクエスト extensions に格納される）
#[derive(Debug, Clone)]
pub struct ValidatedParamsValue(pub serde_json::Value);

/// リクエストバリデーションミドルウェア
///
/// `axum::middleware::from_fn_with_state` で [`RequestSchemas`] を
/// 状態としてルートにレイヤーする。宣言されたスキーマを
/// body → query → params の順で適用し、最初の失敗で打ち切って
/// [`ApiError::Validation`] を伝播する。
///
/// 成功時の正規化値の扱い:
/// - body: 正規化済み JSON がリクエストボディを置き換える
///   （`Content-Length` も更新する）
/// - query / params: extensions に格納し、[`ValidatedQuery`] /
///   [`ValidatedParams`] 抽出器が取り出す
///
/// ボディが [`BODY_LIMIT`] を超えた場合は検証失敗ではなく
/// 413 Payload Too Large を伝播する。
pub async fn validate_request(
    State(schemas): State<RequestSchemas>,
    raw_params: RawPathParams,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();

    let body = if let Some(schema) = &schemas.body {
        let bytes = to_bytes(body, BODY_LIMIT).await.map_err(|e| {
            // サイズ超過は入力形式の問題ではないため 413 で区別する
            if is_length_limit(&e) {
                ApiError::app(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "Request body too large",
                )
            } else {
                ApiError::Validation(vec![FieldIssue {
                    field:  "body".to_string(),
                    reason: "failed to read request body".to_string(),
                }])
            }
        })?;
        let normalized = schema
            .validate(RawInput::Json(&bytes))
            .map_err(|issues| ApiError::Validation(locate("body", issues)))?;
        let encoded =
            serde_json::to_vec(&normalized).map_err(|e| ApiError::Internal(e.into()))?;
        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(encoded.len() as u64));
        Body::from(encoded)
    } else {
        body
    };

    if let Some(schema) = &schemas.query {
        let raw = parts.uri.query().unwrap_or("");
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
            ApiError::Validation(vec![FieldIssue {
                field:  "query".to_string(),
                reason: e.to_string(),
            }])
        })?;
        let normalized = schema
            .validate(RawInput::Pairs(&pairs))
            .map_err(|issues| ApiError::Validation(locate("query", issues)))?;
        parts.extensions.insert(ValidatedQueryValue(normalized));
    }

    if let Some(schema) = &schemas.params {
        let pairs: Vec<(String, String)> = raw_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let normalized = schema
            .validate(RawInput::Pairs(&pairs))
            .map_err(|issues| ApiError::Validation(locate("params", issues)))?;
        parts.extensions.insert(ValidatedParamsValue(normalized));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// 検証済み query を型付きで取り出す抽出器
///
/// [`validate_request`] が適用されたルートでのみ使用できる。
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ValidatedQueryValue(value) = parts
            .extensions
            .get::<ValidatedQueryValue>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!(
                    "query スキーマが宣言されていないルートで ValidatedQuery が使用されました"
                ))
            })?;
        let typed = serde_json::from_value(value).map_err(|e| ApiError::Internal(e.into()))?;
        Ok(Self(typed))
    }
}

/// 検証済み path パラメータを型付きで取り出す抽出器
///
/// [`validate_request`] が適用されたルートでのみ使用できる。
pub struct ValidatedParams<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ValidatedParamsValue(value) = parts
            .extensions
            .get::<ValidatedParamsValue>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!(
                    "params スキーマが宣言されていないルートで ValidatedParams が使用されました"
                ))
            })?;
        let typed = serde_json::from_value(value).map_err(|e| ApiError::Internal(e.into()))?;
        Ok(Self(typed))
    }
}
