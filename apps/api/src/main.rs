//! # API サーバー
//!
//! HTTP サービスのエントリーポイント。
//!
//! ## 起動シーケンス
//!
//! 1. `.env` ファイルを読み込む（存在する場合）
//! 2. トレーシングを初期化する
//! 3. 環境変数から設定を読み込み、検証する
//!    （失敗時は全エラーを報告して非ゼロ終了）
//! 4. データベース接続プールを作成する（遅延接続 — 実際の接続は
//!    最初のクエリ時に確立される）
//! 5. ルーターを構築し、リッスンを開始する
//! 6. SIGTERM / Ctrl+C で graceful shutdown し、接続プールを閉じる
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |--------|------|------------|------|
//! | `NODE_ENV` | No | `development` | 実行環境 |
//! | `PORT` | No | `3000` | ポート番号 |
//! | `CORS_ORIGIN` | No | `*` | CORS で許可するオリジン |
//! | `DATABASE_URL` | **Yes** | - | PostgreSQL 接続 URL |
//! | `LOG_FORMAT` | No | `pretty` | ログ出力形式（`json` / `pretty`） |
//! | `RUST_LOG` | No | `info,dodai=debug` | ログレベルフィルタ |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p dodai-api
//!
//! # 本番環境
//! NODE_ENV=production PORT=3000 DATABASE_URL=postgres://... \
//!     cargo run -p dodai-api --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use dodai_api::{app::build_app, config::AppConfig};
use dodai_infra::{PgStore, Store};
use dodai_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tracing::Instrument as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("api"));

    run()
        .instrument(tracing::info_span!("app", service = "api"))
        .await
}

async fn run() -> anyhow::Result<()> {
    // 設定の検証に 1 つでも失敗したらサーバーソケットを開かず終了する
    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        environment = config.environment.as_str(),
        port = config.port,
        "API サーバーを起動します"
    );

    // 遅延接続プール: 接続はここでは張らず、最初のクエリ時に確立される
    let store: Arc<dyn Store> = Arc::new(
        PgStore::connect_lazy(&config.database_url)
            .context("データベース接続プールの作成に失敗しました")?,
    );

    let app = build_app(&config, Arc::clone(&store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("アドレス {addr} にバインドできませんでした"))?;

    tracing::info!("リッスンを開始しました: {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーの実行中にエラーが発生しました")?;

    // graceful shutdown の一環として接続プールを明示的に閉じる
    store.close().await;
    tracing::info!("サーバーを停止しました");

    Ok(())
}

/// SIGTERM または Ctrl+C を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Ctrl+C ハンドラの登録に失敗しました");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM ハンドラの登録に失敗しました")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Ctrl+C を受信しました。シャットダウンします");
        }
        () = terminate => {
            tracing::info!("SIGTERM を受信しました。シャットダウンします");
        }
    }
}
