//! # テスト用モックストア
//!
//! Readiness チェックのテストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! dodai-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::{db::Store, error::InfraError};

/// [`Store`] のインメモリモック
///
/// `set_healthy(false)` でストア障害をシミュレートする。
#[derive(Clone)]
pub struct MockStore {
    healthy: Arc<AtomicBool>,
}

impl MockStore {
    /// 健全な状態のモックストアを作成する
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    /// ストアの健全性を切り替える
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn ping(&self) -> Result<(), InfraError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InfraError::unexpected("mock store is down"))
        }
    }

    async fn close(&self) {}
}
