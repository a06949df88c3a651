pub mod admin;
pub mod health;

use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    dto::provisioning_dto::{ProvisioningRequest, ProvisioningResult},
    middleware, AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(admin::admin_create_user),
    components(schemas(ProvisioningRequest, ProvisioningResult))
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router(state: AppState) -> Router {
    let callable_api = Router::new()
        .route("/adminCreateUser", post(admin::admin_create_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.verifier.clone(),
            middleware::auth::attach_caller_identity,
        ))
        .layer(middleware::cors::callable_cors());

    Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi))
        .merge(callable_api)
        .with_state(state)
}
