//! # アプリケーション設定
//!
//! 環境変数からアプリケーション設定を読み込み、起動時に検証する。
//!
//! ## 設計方針
//!
//! [12-Factor App](https://12factor.net/ja/config) の原則に従い、
//! すべての設定を環境変数から読み込む。検証は起動シーケンスの一部であり、
//! 1 つでも不正なフィールドがあればサーバーソケットを開く前に
//! プロセスを終了する。部分的に構築された設定が公開されることはない。
//!
//! 検証エラーは最初の 1 件で打ち切らず、全フィールド分を収集してから
//! まとめて報告する（オペレータが 1 回のデプロイで全問題を修正できる）。
//!
//! ## 環境変数一覧
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |--------|------|------------|------|
//! | `NODE_ENV` | No | `development` | 実行環境（development / production / test） |
//! | `PORT` | No | `3000` | サーバーのポート番号（1 以上の整数） |
//! | `CORS_ORIGIN` | No | `*` | CORS で許可するオリジン（空文字列は不可） |
//! | `DATABASE_URL` | **Yes** | - | PostgreSQL 接続 URL |

use std::env;

use http::HeaderValue;
use thiserror::Error;
use url::Url;

/// 実行環境
///
/// エラートランスレータの情報開示ポリシー（本番では内部情報を隠す）と
/// ログ設定の切り替えに使用する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// 開発環境（デフォルト）
    #[default]
    Development,
    /// 本番環境
    Production,
    /// テスト環境
    Test,
}

impl Environment {
    /// 文字列から実行環境をパースする
    ///
    /// [`crate::config`] は起動時検証の一部としてこれを呼ぶため、
    /// 不正な値はフォールバックせずエラーにする
    /// （`LOG_FORMAT` のような運用時設定とは異なり、誤設定を隠さない）。
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "NODE_ENV は development / production / test のいずれかである必要があります（指定値: {other:?}）"
            )),
        }
    }

    /// 環境名を文字列で返す
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    /// 本番環境かどうか
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// 設定の検証エラー
///
/// 全フィールドの検証結果を収集した上で返される。
#[derive(Debug, Error)]
#[error("設定が不正です: {}", issues.join("; "))]
pub struct ConfigError {
    /// フィールドごとの検証エラーメッセージ
    pub issues: Vec<String>,
}

/// アプリケーション全体の設定
///
/// 起動時に一度だけ構築し、以降は読み取り専用。
/// 各コンポーネントには参照または `Clone` で渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// 実行環境
    pub environment:  Environment,
    /// ポート番号（1 以上）
    pub port:         u16,
    /// CORS で許可するオリジン（`"*"` または単一オリジン）
    pub cors_origin:  String,
    /// PostgreSQL 接続 URL
    pub database_url: String,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// 検証に失敗した場合は全フィールド分のエラーをまとめた
    /// [`ConfigError`] を返す。`main` がこれを伝播することで、
    /// プロセスは非ゼロの終了コードで停止する。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のルックアップ関数から設定を読み込む
    ///
    /// テストがプロセスの環境変数に触れずに検証ロジックを検証できる
    /// ように分離している。同じ入力に対する出力は常に同一（冪等）。
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut issues = Vec::new();

        let environment = match get("NODE_ENV") {
            None => Some(Environment::default()),
            Some(raw) => match Environment::parse(&raw) {
                Ok(environment) => Some(environment),
                Err(message) => {
                    issues.push(message);
                    None
                }
            },
        };

        let port = match get("PORT") {
            None => Some(3000),
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => Some(port),
                _ => {
                    issues.push(format!(
                        "PORT は 1 以上 65535 以下の整数である必要があります（指定値: {raw:?}）"
                    ));
                    None
                }
            },
        };

        let cors_origin = match get("CORS_ORIGIN") {
            None => Some("*".to_string()),
            Some(raw) if raw.is_empty() => {
                issues.push("CORS_ORIGIN は空文字列にできません".to_string());
                None
            }
            // "*" 以外は CorsLayer にそのまま渡すため、ヘッダー値として
            // 妥当であることも起動時に確認する
            Some(raw) if raw != "*" && HeaderValue::from_str(&raw).is_err() => {
                issues.push(format!(
                    "CORS_ORIGIN が有効なヘッダー値ではありません（指定値: {raw:?}）"
                ));
                None
            }
            Some(raw) => Some(raw),
        };

        let database_url = match get("DATABASE_URL") {
            None => {
                issues.push("DATABASE_URL が設定されていません".to_string());
                None
            }
            Some(raw) => match Url::parse(&raw) {
                Ok(_) => Some(raw),
                Err(e) => {
                    issues.push(format!("DATABASE_URL が有効な URL ではありません: {e}"));
                    None
                }
            },
        };

        match (environment, port, cors_origin, database_url) {
            (Some(environment), Some(port), Some(cors_origin), Some(database_url))
                if issues.is_empty() =>
            {
                Ok(Self {
                    environment,
                    port,
                    cors_origin,
                    database_url,
                })
            }
            _ => Err(ConfigError { issues }),
        }
    }
}
