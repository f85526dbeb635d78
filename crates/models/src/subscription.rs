use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Subscription tier. The wire format uses the snake_case names below;
/// anything else is rejected at the boundary before the store is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    MonthlySpiritual,
    AnnualSpiritual,
    Free,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::MonthlySpiritual => "monthly_spiritual",
            Plan::AnnualSpiritual => "annual_spiritual",
            Plan::Free => "free",
        }
    }

    pub fn parse(s: &str) -> Result<Plan, ModelError> {
        match s {
            "monthly_spiritual" => Ok(Plan::MonthlySpiritual),
            "annual_spiritual" => Ok(Plan::AnnualSpiritual),
            "free" => Ok(Plan::Free),
            other => Err(ModelError::Validation(format!("unknown plan: {}", other))),
        }
    }

    /// Paid plans are active, `free` is inactive. Status is never stored
    /// independently of the plan.
    pub fn status(&self) -> SubscriptionStatus {
        match self {
            Plan::MonthlySpiritual | Plan::AnnualSpiritual => SubscriptionStatus::Active,
            Plan::Free => SubscriptionStatus::Inactive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
        }
    }
}

/// 订阅记录：以 userId 为键持久化，文件与 HTTP 响应均使用 camelCase 字段
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    /// Fixed at record creation; not recomputed when the plan changes later.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Overwritten by the caller on every update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
}

impl SubscriptionRecord {
    /// Default record inserted when an update targets an unknown user:
    /// free/inactive with a 30-day expiry horizon.
    pub fn new_free<S: Into<String>>(user_id: S) -> Self {
        Self {
            user_id: user_id.into(),
            plan: Plan::Free,
            status: SubscriptionStatus::Inactive,
            expires_at: Some(expires_in_days(30)),
            effective_date: None,
        }
    }
}

/// ISO-8601 UTC timestamp `days` from now, trailing `Z` designator.
pub fn expires_in_days(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn validate_user_id(user_id: &str) -> Result<(), ModelError> {
    if user_id.trim().is_empty() {
        return Err(ModelError::Validation("userId required".into()));
    }
    Ok(())
}

/// Accepts a calendar date (`2024-01-01`) or a full RFC 3339 timestamp.
pub fn validate_effective_date(value: &str) -> Result<(), ModelError> {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Ok(());
    }
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return Ok(());
    }
    Err(ModelError::Validation(format!("effectiveDate is not ISO-8601: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_parses_known_values_only() {
        assert_eq!(Plan::parse("monthly_spiritual").unwrap(), Plan::MonthlySpiritual);
        assert_eq!(Plan::parse("annual_spiritual").unwrap(), Plan::AnnualSpiritual);
        assert_eq!(Plan::parse("free").unwrap(), Plan::Free);
        assert!(matches!(Plan::parse("bogus"), Err(ModelError::Validation(_))));
        assert!(matches!(Plan::parse(""), Err(ModelError::Validation(_))));
    }

    #[test]
    fn status_derives_from_plan() {
        assert_eq!(Plan::MonthlySpiritual.status(), SubscriptionStatus::Active);
        assert_eq!(Plan::AnnualSpiritual.status(), SubscriptionStatus::Active);
        assert_eq!(Plan::Free.status(), SubscriptionStatus::Inactive);
    }

    #[test]
    fn new_free_record_defaults() {
        let rec = SubscriptionRecord::new_free("USER_X");
        assert_eq!(rec.plan, Plan::Free);
        assert_eq!(rec.status, SubscriptionStatus::Inactive);
        assert!(rec.effective_date.is_none());

        let expires = rec.expires_at.expect("expiry set at creation");
        assert!(expires.ends_with('Z'));
        let parsed = DateTime::parse_from_rfc3339(&expires).expect("rfc3339");
        let horizon = parsed.with_timezone(&Utc) - Utc::now();
        assert!(horizon > Duration::days(29) && horizon <= Duration::days(30));
    }

    #[test]
    fn record_serializes_camel_case_and_skips_absent_fields() {
        let mut rec = SubscriptionRecord::new_free("USER_X");
        rec.expires_at = Some("2024-02-01T00:00:00Z".into());
        let json = serde_json::to_value(&rec).expect("serialize");
        assert_eq!(json["userId"], "USER_X");
        assert_eq!(json["plan"], "free");
        assert_eq!(json["status"], "inactive");
        assert_eq!(json["expiresAt"], "2024-02-01T00:00:00Z");
        assert!(json.get("effectiveDate").is_none());
    }

    #[test]
    fn effective_date_accepts_date_and_datetime() {
        assert!(validate_effective_date("2024-01-01").is_ok());
        assert!(validate_effective_date("2024-01-01T10:30:00Z").is_ok());
        assert!(validate_effective_date("not-a-date").is_err());
        assert!(validate_effective_date("2024-13-40").is_err());
    }
}
