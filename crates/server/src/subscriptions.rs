use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use service::subscriptions::{SubscriptionStore, UpdateSubscription};

use crate::errors::ApiError;

/// Shared handler state: the store handle chosen once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn SubscriptionStore>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// 查询订阅状态：返回完整记录（含 expiresAt）
#[utoipa::path(
    get,
    path = "/api/subscription-status",
    tag = "subscriptions",
    params(("userId" = String, Query, description = "User identifier")),
    responses(
        (status = 200, description = "Subscription found"),
        (status = 400, description = "Missing userId parameter"),
        (status = 404, description = "No subscription for userId"),
    )
)]
pub async fn subscription_status(
    State(state): State<ServerState>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = match q.user_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Err(ApiError::bad_request("userId parameter not found")),
    };

    match state.store.get(&user_id).await {
        Some(subscription) => Ok(Json(serde_json::json!({
            "success": true,
            "subscription": subscription,
        }))),
        None => Err(ApiError::not_found(format!(
            "Subscription not found for userId: {}",
            user_id
        ))),
    }
}

/// Body shape for the update endpoint. Fields are optional here so a missing
/// field surfaces as a 400 envelope instead of an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionBody {
    pub user_id: Option<String>,
    pub new_plan: Option<String>,
    pub effective_date: Option<String>,
}

impl UpdateSubscriptionBody {
    fn into_input(self) -> Result<UpdateSubscription, ApiError> {
        let user_id = self
            .user_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("userId required"))?;
        let new_plan = self
            .new_plan
            .ok_or_else(|| ApiError::bad_request("newPlan required"))?;
        let effective_date = self
            .effective_date
            .ok_or_else(|| ApiError::bad_request("effectiveDate required"))?;
        Ok(UpdateSubscription { user_id, new_plan, effective_date })
    }
}

/// 更新订阅计划：返回投影（不含 expiresAt）
#[utoipa::path(
    post,
    path = "/api/update-subscription",
    tag = "subscriptions",
    request_body = crate::openapi::UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Plan updated"),
        (status = 400, description = "Invalid body"),
        (status = 500, description = "Persistence failure"),
    )
)]
pub async fn update_subscription(
    State(state): State<ServerState>,
    Json(body): Json<UpdateSubscriptionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let input = body.into_input()?;
    let updated = state.store.apply(&input).await?;
    info!(user_id = %updated.user_id, plan = updated.plan.as_str(), "subscription updated");
    Ok(Json(serde_json::json!({
        "success": true,
        "subscription": updated,
    })))
}
