//! # Dodai インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **ストアシーム**: [`Store`](db::Store) trait による
//!   バックエンドストアの抽象化（疎通確認と切断のみを公開する）
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → shared
//! ```
//!
//! api 層はストアの具象型（sqlx）に直接依存せず、`Store` trait 経由で
//! 疎通確認と切断を行う。テストでは [`mock::MockStore`] を差し替える。

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use db::{PgStore, Store};
pub use error::InfraError;
