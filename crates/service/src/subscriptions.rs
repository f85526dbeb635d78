use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use models::subscription::{
    validate_effective_date, validate_user_id, Plan, SubscriptionRecord, SubscriptionStatus,
};

/// 更新输入：三个字段均为必填，validate 在进入存储前执行
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscription {
    pub user_id: String,
    pub new_plan: String,
    pub effective_date: String,
}

impl UpdateSubscription {
    /// Field-level validation; the table is never touched when this fails.
    /// Returns the parsed plan so callers do not re-parse the string.
    pub fn validate(&self) -> Result<Plan, ServiceError> {
        validate_user_id(&self.user_id)?;
        let plan = Plan::parse(&self.new_plan)?;
        validate_effective_date(&self.effective_date)?;
        Ok(plan)
    }
}

/// Projection returned by the update operation. `expiresAt` is intentionally
/// absent here; the status read returns the full record instead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    pub user_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub effective_date: String,
}

impl SubscriptionUpdate {
    fn project(record: &SubscriptionRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            plan: record.plan,
            status: record.status,
            effective_date: record.effective_date.clone().unwrap_or_default(),
        }
    }
}

/// Storage behavior shared by the file-backed and seeded stores. The concrete
/// implementation is chosen once at startup from configuration.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Pure lookup; `None` when the user has no record.
    async fn get(&self, user_id: &str) -> Option<SubscriptionRecord>;

    /// Create-or-update per the plan derivation rule, then persist.
    async fn apply(&self, input: &UpdateSubscription) -> Result<SubscriptionUpdate, ServiceError>;
}

/// Shared mutation used by both store implementations: create the default
/// free/inactive record when the user is unknown, then overwrite plan, status
/// and effectiveDate in place. `expiresAt` keeps its creation value across
/// repeated plan changes.
pub(crate) fn apply_to_table(
    table: &mut HashMap<String, SubscriptionRecord>,
    input: &UpdateSubscription,
    plan: Plan,
) -> SubscriptionUpdate {
    let record = table
        .entry(input.user_id.clone())
        .or_insert_with(|| SubscriptionRecord::new_free(input.user_id.clone()));
    record.plan = plan;
    record.status = plan.status();
    record.effective_date = Some(input.effective_date.clone());
    SubscriptionUpdate::project(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(user: &str, plan: &str, date: &str) -> UpdateSubscription {
        UpdateSubscription {
            user_id: user.into(),
            new_plan: plan.into(),
            effective_date: date.into(),
        }
    }

    #[test]
    fn validate_accepts_the_three_plans() {
        assert_eq!(input("u", "monthly_spiritual", "2024-01-01").validate().unwrap(), Plan::MonthlySpiritual);
        assert_eq!(input("u", "annual_spiritual", "2024-01-01").validate().unwrap(), Plan::AnnualSpiritual);
        assert_eq!(input("u", "free", "2024-01-01").validate().unwrap(), Plan::Free);
    }

    #[test]
    fn validate_rejects_bad_fields() {
        assert!(input("", "free", "2024-01-01").validate().is_err());
        assert!(input("u", "bogus", "2024-01-01").validate().is_err());
        assert!(input("u", "free", "soon").validate().is_err());
    }

    #[test]
    fn apply_creates_then_overwrites_in_place() {
        let mut table = HashMap::new();
        let first = input("USER_9", "monthly_spiritual", "2024-01-01");
        let out = apply_to_table(&mut table, &first, Plan::MonthlySpiritual);
        assert_eq!(out.plan, Plan::MonthlySpiritual);
        assert_eq!(out.status, SubscriptionStatus::Active);
        assert_eq!(out.effective_date, "2024-01-01");

        let created_expiry = table["USER_9"].expires_at.clone();
        assert!(created_expiry.is_some());

        // downgrade: status follows the plan, expiry stays frozen
        let second = input("USER_9", "free", "2024-06-01");
        let out = apply_to_table(&mut table, &second, Plan::Free);
        assert_eq!(out.status, SubscriptionStatus::Inactive);
        assert_eq!(table["USER_9"].expires_at, created_expiry);
        assert_eq!(table["USER_9"].effective_date.as_deref(), Some("2024-06-01"));
    }
}
