use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::errors::ServiceError;
use crate::subscriptions::{apply_to_table, SubscriptionStore, SubscriptionUpdate, UpdateSubscription};
use models::subscription::{expires_in_days, Plan, SubscriptionRecord, SubscriptionStatus};

/// Seeded in-memory store for read-only deployments: same table shape as the
/// file store, but persistence is a no-op and state dies with the process.
pub struct SeededSubscriptionStore {
    inner: Arc<RwLock<HashMap<String, SubscriptionRecord>>>,
}

impl SeededSubscriptionStore {
    pub fn new() -> Arc<Self> {
        let table = seed_records();
        info!(records = table.len(), "seeded in-memory subscription table");
        Arc::new(Self { inner: Arc::new(RwLock::new(table)) })
    }
}

/// Fixed sample table used when persistent storage is unavailable.
fn seed_records() -> HashMap<String, SubscriptionRecord> {
    let seeds = [
        SubscriptionRecord {
            user_id: "USER_001".into(),
            plan: Plan::MonthlySpiritual,
            status: SubscriptionStatus::Active,
            expires_at: Some(expires_in_days(30)),
            effective_date: None,
        },
        SubscriptionRecord {
            user_id: "USER_002".into(),
            plan: Plan::Free,
            status: SubscriptionStatus::Inactive,
            expires_at: Some(expires_in_days(60)),
            effective_date: None,
        },
        SubscriptionRecord {
            user_id: "USER_003".into(),
            plan: Plan::AnnualSpiritual,
            status: SubscriptionStatus::Active,
            expires_at: Some(expires_in_days(365)),
            effective_date: None,
        },
    ];
    seeds.into_iter().map(|r| (r.user_id.clone(), r)).collect()
}

#[async_trait::async_trait]
impl SubscriptionStore for SeededSubscriptionStore {
    async fn get(&self, user_id: &str) -> Option<SubscriptionRecord> {
        let table = self.inner.read().await;
        table.get(user_id).cloned()
    }

    async fn apply(&self, input: &UpdateSubscription) -> Result<SubscriptionUpdate, ServiceError> {
        let plan = input.validate()?;
        let mut table = self.inner.write().await;
        // no write-back: persistence is disabled in this mode
        Ok(apply_to_table(&mut table, input, plan))
    }
}
