use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::provisioning_dto::{CallableRequest, CallableResponse, ProvisioningRequest},
    error::{Error, Result},
    middleware::auth::CallerIdentity,
    AppState,
};

#[utoipa::path(
    post,
    path = "/adminCreateUser",
    request_body = ProvisioningRequest,
    responses(
        (status = 200, description = "User account and profile created", body = crate::dto::provisioning_dto::ProvisioningResult),
        (status = 400, description = "invalid-argument"),
        (status = 401, description = "unauthenticated"),
        (status = 403, description = "permission-denied"),
        (status = 409, description = "already-exists"),
        (status = 500, description = "internal")
    )
)]
#[axum::debug_handler]
pub async fn admin_create_user(
    State(state): State<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    payload: std::result::Result<Json<CallableRequest<ProvisioningRequest>>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let caller = caller.map(|Extension(identity)| identity);
    let request = match payload {
        Ok(Json(envelope)) => envelope.data.unwrap_or_default(),
        Err(rejection) => {
            // Authentication is still checked first, as for a well-formed body.
            state.provisioning.authorize(caller.as_ref()).await?;
            return Err(Error::InvalidArgument(rejection.body_text()));
        }
    };

    let result = state
        .provisioning
        .admin_create_user(caller.as_ref(), request)
        .await?;
    Ok(Json(CallableResponse { result }))
}
