use anyhow::Result;
use std::sync::Arc;

use crate::config::{ReviewConfig, StoreBackend};
use crate::coordinator::ReviewCoordinator;
use crate::notify::{LogDispatcher, StaticRoleDirectory};
use crate::store::{FileStore, InMemoryStore, WorkflowStore};

pub mod admin;
pub mod show;
pub mod sign;
pub mod submit;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Open the configured store and hand a coordinator to `f`
pub async fn with_coordinator<F, Fut, R>(config: &ReviewConfig, f: F) -> Result<R>
where
    F: FnOnce(ReviewCoordinator) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let store = open_store(config).await?;
    let coordinator = ReviewCoordinator::new(
        store,
        Arc::new(LogDispatcher),
        Arc::new(StaticRoleDirectory::from_config(&config.directory)),
    )
    .with_config(config);
    f(coordinator).await
}

async fn open_store(config: &ReviewConfig) -> Result<Arc<dyn WorkflowStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; state is lost when the process exits");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::File => Ok(Arc::new(FileStore::new(config.store.directory.clone()))),
        #[cfg(feature = "database")]
        StoreBackend::Sqlite => {
            let store = crate::store::SqliteStore::connect(
                &config.store.database_url,
                config.store.auto_migrate,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "database"))]
        StoreBackend::Sqlite => Err(anyhow::anyhow!(
            "sqlite backend requires building with --features database"
        )),
    }
}
