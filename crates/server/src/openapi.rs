use utoipa::{OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct UpdateSubscriptionRequest {
    #[schema(example = "USER_002")]
    pub user_id: String,
    #[schema(example = "monthly_spiritual")]
    pub new_plan: String,
    #[schema(example = "2024-01-01")]
    pub effective_date: String,
}

#[derive(ToSchema)]
pub struct SubscriptionDoc {
    pub user_id: String,
    pub plan: String,
    pub status: String,
    pub expires_at: Option<String>,
    pub effective_date: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::subscriptions::subscription_status,
        crate::subscriptions::update_subscription,
    ),
    components(schemas(HealthResponse, UpdateSubscriptionRequest, SubscriptionDoc)),
    tags(
        (name = "subscriptions", description = "Subscription status reads and plan updates"),
        (name = "meta", description = "Service health"),
    )
)]
pub struct ApiDoc;
