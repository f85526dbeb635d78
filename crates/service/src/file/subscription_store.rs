use std::sync::Arc;

use tracing::info;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::subscriptions::{apply_to_table, SubscriptionStore, SubscriptionUpdate, UpdateSubscription};
use models::subscription::SubscriptionRecord;

/// 文件存储：以 JSON 文件持久化订阅表，每次变更后整表写回
#[derive(Clone)]
pub struct FileSubscriptionStore {
    store: Arc<JsonMapStore<String, SubscriptionRecord>>,
}

impl FileSubscriptionStore {
    /// Initialize from the data file path. A missing file is created with an
    /// empty table; a corrupt file fails startup.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let path = path.into();
        let store = JsonMapStore::<String, SubscriptionRecord>::new(path.clone()).await?;
        info!(path = %path.display(), "subscription table loaded");
        Ok(Arc::new(Self { store }))
    }

    /// Snapshot of the whole table.
    pub async fn list(&self) -> Vec<SubscriptionRecord> {
        self.store.list().await.into_iter().map(|(_, v)| v).collect()
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for FileSubscriptionStore {
    async fn get(&self, user_id: &str) -> Option<SubscriptionRecord> {
        self.store.get(&user_id.to_string()).await
    }

    async fn apply(&self, input: &UpdateSubscription) -> Result<SubscriptionUpdate, ServiceError> {
        let plan = input.validate()?;
        // in-memory mutation lands before the write-back; a failed persist
        // leaves the table ahead of disk with no rollback
        self.store
            .update_map(|table| Ok(apply_to_table(table, input, plan)))
            .await
    }
}
