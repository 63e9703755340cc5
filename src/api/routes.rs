//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, OperationContext, UserSummary};
use crate::error::AppResult;
use crate::handlers::{CredentialsCommand, PurchaseCommand, SignInResult, TransferCommand};

use super::middleware::{auth_middleware, AuthUser};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendCoinRequest {
    pub destination_username: String,
    pub amount: i64,
}

/// Generated identifier of a created record
#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: i32,
}

// =========================================================================
// API Router
// =========================================================================

/// Routes mounted under `/api`
pub fn create_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/sendCoin", post(send_coin))
        .route("/buy/:item", put(buy_item))
        .route("/info", get(info))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .merge(protected)
}

// =========================================================================
// POST /auth/sign-up
// =========================================================================

async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Json<IdResponse>> {
    let Json(request) = payload?;

    let id = state
        .auth
        .sign_up(CredentialsCommand::new(request.username, request.password))
        .await?;

    Ok(Json(IdResponse { id }))
}

// =========================================================================
// POST /auth/sign-in
// =========================================================================

async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Json<SignInResult>> {
    let Json(request) = payload?;

    let result = state
        .auth
        .sign_in(CredentialsCommand::new(request.username, request.password))
        .await?;

    Ok(Json(result))
}

// =========================================================================
// POST /sendCoin
// =========================================================================

async fn send_coin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<SendCoinRequest>, JsonRejection>,
) -> AppResult<Json<IdResponse>> {
    let Json(request) = payload?;

    tracing::debug!(
        source_id = user.account_id,
        destination = %request.destination_username,
        amount = request.amount,
        "Send coin request"
    );

    let command = TransferCommand::new(
        user.account_id,
        request.destination_username,
        request.amount,
    );
    let id = state.shop.send_coin(command, &context).await?;

    Ok(Json(IdResponse { id }))
}

// =========================================================================
// PUT /buy/:item
// =========================================================================

async fn buy_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<OperationContext>,
    Path(item): Path<String>,
) -> AppResult<Json<IdResponse>> {
    tracing::debug!(buyer_id = user.account_id, item = %item, "Buy item request");

    let id = state
        .shop
        .buy_item(PurchaseCommand::new(user.account_id, item), &context)
        .await?;

    Ok(Json(IdResponse { id }))
}

// =========================================================================
// GET /info
// =========================================================================

async fn info(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<UserSummary>> {
    let account_id: AccountId = user.account_id;
    let summary = state.shop.user_summary(account_id).await?;
    Ok(Json(summary))
}
