//! Process-wide handle to the secondary store
//!
//! The connection is opened on first use, exactly once, and shared by every
//! concurrent pipeline run. A failed open leaves the handle empty so the next
//! write tries again. `close` is explicit and final: later writes fail with
//! [`StoreError::Closed`].

use super::{ObjectStore, StoreError, WebHdfsStore};
use futures::future::BoxFuture;
use futures::FutureExt;
use senti_common::config::SecondaryConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

type Connector =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn ObjectStore>, StoreError>> + Send + Sync>;

pub struct SecondaryStore {
    connector: Option<Connector>,
    cell: OnceCell<Arc<dyn ObjectStore>>,
    closed: AtomicBool,
}

impl SecondaryStore {
    /// Lazily connect to WebHDFS using `config` on first use
    pub fn webhdfs(config: SecondaryConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let config = Arc::new(config);
        Self::with_connector(move || {
            let config = Arc::clone(&config);
            async move {
                let store = WebHdfsStore::connect(&config).await?;
                Ok::<_, StoreError>(Arc::new(store) as Arc<dyn ObjectStore>)
            }
            .boxed()
        })
    }

    /// Lazily open any store through `connector`
    pub fn with_connector<F>(connector: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn ObjectStore>, StoreError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            connector: Some(Box::new(connector)),
            cell: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Wrap an already-open store
    pub fn from_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            connector: None,
            cell: OnceCell::new_with(Some(store)),
            closed: AtomicBool::new(false),
        }
    }

    /// No secondary store: mirror writes are skipped
    pub fn disabled() -> Self {
        Self {
            connector: None,
            cell: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.connector.is_some() || self.cell.initialized()
    }

    pub fn is_open(&self) -> bool {
        self.cell.initialized() && !self.closed.load(Ordering::Acquire)
    }

    /// Get the shared store, opening it on first call
    pub async fn handle(&self) -> Result<Arc<dyn ObjectStore>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let store = self
            .cell
            .get_or_try_init(|| async {
                match &self.connector {
                    Some(connect) => {
                        tracing::info!("Opening secondary store connection");
                        connect().await
                    }
                    None => Err(StoreError::Unavailable(
                        "secondary store disabled".to_string(),
                    )),
                }
            })
            .await?;

        Ok(Arc::clone(store))
    }

    /// Close the handle at shutdown; idempotent
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(
                was_open = self.cell.initialized(),
                "Secondary store connection closed"
            );
        }
    }
}
