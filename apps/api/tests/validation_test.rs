//! # リクエストバリデーションミドルウェアのテスト
//!
//! `validate_request` を `route_layer` で適用したルートに対して、
//! body / query / path パラメータの検証と正規化を検証する。
//!
//! - 検証順序は body → query → params で、最初の失敗のみを報告する
//! - query / params の文字列化された数値は数値に変換される
//! - 正規化済み body がリクエストボディを置き換える
//! - 失敗時のエンベロープはエラートランスレータが構築する

use axum::{
    Json, Router,
    body::Body,
    middleware::from_fn_with_state,
    routing::post,
};
use dodai_api::{
    config::Environment,
    error::translate_error,
    validation::{
        RequestSchemas, TypedSchema, ValidatedParams, ValidatedQuery, validate_request,
    },
};
use http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use validator::Validate;

fn default_priority() -> u32 {
    3
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct CreateItem {
    #[validate(length(min = 1, message = "名前は必須です"))]
    name:     String,
    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 5))]
    priority: u32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct ListQuery {
    #[validate(range(min = 1, message = "page は 1 以上である必要があります"))]
    page: u32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct ItemPath {
    #[validate(range(min = 1, message = "id は 1 以上である必要があります"))]
    id: u64,
}

/// 正規化済みの入力をそのまま返すハンドラ
async fn create_item(
    ValidatedQuery(query): ValidatedQuery<ListQuery>,
    ValidatedParams(path): ValidatedParams<ItemPath>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "body": body,
        "page": query.page,
        "id": path.id,
    }))
}

fn test_app() -> Router {
    let schemas = RequestSchemas::new()
        .body(TypedSchema::<CreateItem>::new())
        .query(TypedSchema::<ListQuery>::new())
        .params(TypedSchema::<ItemPath>::new());

    Router::new()
        .route("/items/{id}", post(create_item))
        .route_layer(from_fn_with_state(schemas, validate_request))
        .layer(from_fn_with_state(Environment::Test, translate_error))
}

async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_全入力が正しい場合にハンドラへ到達する() {
    let (status, json) =
        post_json(test_app(), "/items/42?page=2", r#"{"name": "棚卸し"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["body"]["name"], "棚卸し");
    assert_eq!(json["id"], serde_json::json!(42));
    assert_eq!(json["page"], serde_json::json!(2));
}

#[tokio::test]
async fn test_queryとparamsの文字列数値が数値に変換される() {
    let (status, json) =
        post_json(test_app(), "/items/7?page=10", r#"{"name": "x"}"#).await;

    assert_eq!(status, StatusCode::OK);
    // URL 上では文字列だが、ハンドラには数値として渡る
    assert!(json["page"].is_u64());
    assert!(json["id"].is_u64());
}

#[tokio::test]
async fn test_正規化済みbodyがリクエストボディを置き換える() {
    // priority を省略したリクエストでも、正規化でデフォルト値が
    // 補完された body がハンドラに届く
    let (status, json) =
        post_json(test_app(), "/items/1?page=1", r#"{"name": "x"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["body"]["priority"], serde_json::json!(3));
}

#[tokio::test]
async fn test_bodyの制約違反が400とフィールド詳細を返す() {
    let (status, json) =
        post_json(test_app(), "/items/1?page=1", r#"{"name": ""}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Validation error");
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["details"][0]["field"], "name");
    assert_eq!(json["details"][0]["reason"], "名前は必須です");
}

#[tokio::test]
async fn test_壊れたjsonボディはbodyラベルの詳細を返す() {
    let (status, json) = post_json(test_app(), "/items/1?page=1", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_bodyとqueryが両方不正な場合はbodyの失敗のみ報告する() {
    // first-failure-wins: 複数の入力位置の失敗を 1 レスポンスに集約しない
    let (status, json) =
        post_json(test_app(), "/items/1?page=0", r#"{"name": ""}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "name");
}

#[tokio::test]
async fn test_queryの制約違反がqueryの詳細を返す() {
    let (status, json) =
        post_json(test_app(), "/items/1?page=0", r#"{"name": "x"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "page");
    assert_eq!(
        json["details"][0]["reason"],
        "page は 1 以上である必要があります"
    );
}

#[tokio::test]
async fn test_queryが数値に変換できない場合は400を返す() {
    let (status, json) =
        post_json(test_app(), "/items/1?page=abc", r#"{"name": "x"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "query");
}

#[tokio::test]
async fn test_サイズ上限を超えたボディは413を返す() {
    // サイズ超過は検証失敗（400）ではなく 413 として区別する
    let oversized = "a".repeat(dodai_api::validation::BODY_LIMIT + 1);

    let (status, json) = post_json(test_app(), "/items/1?page=1", &oversized).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(json["message"], "Request body too large");
}

#[tokio::test]
async fn test_paramsの制約違反がparamsの詳細を返す() {
    let (status, json) =
        post_json(test_app(), "/items/0?page=1", r#"{"name": "x"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "id");
    assert_eq!(
        json["details"][0]["reason"],
        "id は 1 以上である必要があります"
    );
}
