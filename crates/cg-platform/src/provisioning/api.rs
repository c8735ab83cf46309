//! Account API
//!
//! REST endpoints for the provisioned account state.
//! Base path: /api/account

use axum::{
    routing::{get, post},
    extract::State,
    Json, Router,
};
use utoipa::{OpenApi, ToSchema};
use serde::Serialize;
use std::sync::Arc;

use crate::provisioning::service::{AccountState, ProvisioningService};
use crate::shared::api_common::ApiError;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Provisioned account state response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountStateResponse {
    /// API credential for non-interactive calls
    pub api_key: String,

    /// Remaining credits in minor units
    pub balance: i64,
}

impl From<AccountState> for AccountStateResponse {
    fn from(state: AccountState) -> Self {
        Self {
            api_key: state.api_key,
            balance: state.balance,
        }
    }
}

/// Rotated credential response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RotatedKeyResponse {
    /// Replacement API credential; prior keys stop matching the stored record
    pub api_key: String,
}

// ============================================================================
// State
// ============================================================================

/// Account API state
#[derive(Clone)]
pub struct AccountApiState {
    pub provisioning: Arc<ProvisioningService>,
}

// ============================================================================
// Endpoints
// ============================================================================

/// Get the caller's provisioned state, creating it on first access
#[utoipa::path(
    get,
    path = "",
    tag = "account",
    responses(
        (status = 200, description = "Provisioned account state", body = AccountStateResponse),
        (status = 401, description = "Missing or invalid identity token", body = ApiError),
        (status = 500, description = "Provisioning failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_account(
    State(state): State<AccountApiState>,
    auth: Authenticated,
) -> Result<Json<AccountStateResponse>, PlatformError> {
    let account_state = state.provisioning.get_or_create(&auth.0).await?;
    Ok(Json(AccountStateResponse::from(account_state)))
}

/// Issue a replacement API key for the caller
#[utoipa::path(
    post,
    path = "/credential",
    tag = "account",
    responses(
        (status = 200, description = "New credential issued", body = RotatedKeyResponse),
        (status = 401, description = "Missing or invalid identity token", body = ApiError),
        (status = 500, description = "Rotation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn issue_api_key(
    State(state): State<AccountApiState>,
    auth: Authenticated,
) -> Result<Json<RotatedKeyResponse>, PlatformError> {
    let api_key = state.provisioning.rotate_api_key(&auth.0).await?;
    Ok(Json(RotatedKeyResponse { api_key }))
}

/// Build the account router
pub fn account_router(state: AccountApiState) -> Router {
    Router::new()
        .route("/", get(get_account))
        .route("/credential", post(issue_api_key))
        .with_state(state)
}

/// OpenAPI document for the account endpoints
#[derive(OpenApi)]
#[openapi(
    paths(get_account, issue_api_key),
    components(schemas(AccountStateResponse, RotatedKeyResponse, ApiError)),
    tags((name = "account", description = "Account provisioning endpoints"))
)]
pub struct AccountApiDoc;
