//! HTTP endpoints of the payment-requests gateway.
//!
//! Each handler follows the same shape: validate the raw parameters, perform
//! chain reads or encode an unsigned call through the
//! [`ContractGateway`], reshape the result, return JSON. Validation failures
//! and the resolve flow's terminal conditions are 400s with a specific
//! message; anything upstream is a 500 with a generic body, the cause logged
//! and never surfaced.
//!
//! Routes:
//! - `GET /payment` – one payment's details by token id
//! - `GET /payment/held` – requests held by an address (paginated, filterable)
//! - `GET /payment/created` – requests created by an address
//! - `POST /payment/create` – encode a creation call
//! - `POST /payment/settle` – plan a settlement (approve? + settle)
//! - `POST /payment/resolve` – recover a payment from a user-operation hash

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;

use crate::events;
use crate::gateway::{ContractGateway, GatewayError};
use crate::receipt::{ReceiptError, UserOpReceiptSource};
use crate::shape::{
    self, CreateEcho, CreateResponse, CreatedResponse, DetailsResponse, HeldResponse, SettleEcho,
    SettleResponse,
};
use crate::types::{ErrorResponse, PaymentRequest};
use crate::validate::{self, ValidationError};

/// Shared state behind every handler: the gateway and the receipt source.
pub struct AppState {
    pub gateway: ContractGateway,
    pub receipts: Arc<dyn UserOpReceiptSource>,
}

/// Error type returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input, rejected before any external call (or one of the
    /// resolve flow's terminal conditions). The message is client-facing.
    BadRequest(String),
    /// Chain-read, transport, or other unexpected failure. Logged, not
    /// surfaced.
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                tracing::debug!(error = %error, "Rejected request");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::Upstream(cause) => {
                tracing::error!(error = %cause, "Upstream failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal Server Error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        ApiError::Upstream(error.to_string())
    }
}

impl From<ReceiptError> for ApiError {
    fn from(error: ReceiptError) -> Self {
        ApiError::Upstream(error.to_string())
    }
}

/// Builds the route table. The caller attaches state and middleware.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payment", get(get_payment_details))
        .route("/payment/held", get(get_held_requests))
        .route("/payment/created", get(get_created_requests))
        .route("/payment/create", post(post_create))
        .route("/payment/settle", post(post_settle))
        .route("/payment/resolve", post(post_resolve))
}

#[derive(Debug, Deserialize)]
struct DetailsQuery {
    #[serde(rename = "tokenId")]
    token_id: Option<String>,
}

/// `GET /payment`: reads one payment request's details.
#[instrument(skip_all)]
async fn get_payment_details(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailsQuery>,
) -> Result<Json<DetailsResponse>, ApiError> {
    let token_id = validate::validate_query_token_id(query.token_id.as_deref())?;
    let payment_details = state.gateway.payment_details(token_id).await?;
    Ok(Json(DetailsResponse { payment_details }))
}

#[derive(Debug, Deserialize)]
struct HeldQuery {
    address: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    status: Option<String>,
}

/// `GET /payment/held`: lists the requests held by an address, optionally
/// filtered by paid status, sliced by 1-based page. Totals reflect the
/// filtered count.
#[instrument(skip_all)]
async fn get_held_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HeldQuery>,
) -> Result<Json<HeldResponse>, ApiError> {
    let address = validate::validate_query_address(query.address.as_deref())?;
    let page = validate::validate_pagination(query.page.as_deref(), query.limit.as_deref())?;
    let status = validate::validate_status(query.status.as_deref())?;

    let requests = state.gateway.list_by_owner(address).await?;
    let filtered = shape::filter_by_status(requests, status);
    let slice = shape::paginate(filtered, &page);
    Ok(Json(HeldResponse::new(slice, &page)))
}

#[derive(Debug, Deserialize)]
struct CreatedQuery {
    address: Option<String>,
}

/// `GET /payment/created`: lists the requests created by an address.
#[instrument(skip_all)]
async fn get_created_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CreatedQuery>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let address = validate::validate_query_address(query.address.as_deref())?;
    let requests = state.gateway.list_by_creator(address).await?;
    Ok(Json(CreatedResponse::new(requests)))
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    token: Option<String>,
    payee: Option<String>,
    amount: Option<String>,
    description: Option<String>,
}

/// `POST /payment/create`: validates a creation request and returns the
/// unsigned call for the caller's wallet, plus an echo of the validated
/// values so the caller sees exactly what was encoded.
#[instrument(skip_all)]
async fn post_create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBody>,
) -> Result<Json<CreateResponse>, ApiError> {
    let token_raw = validate::require_field(body.token.as_deref())?;
    let payee_raw = validate::require_field(body.payee.as_deref())?;
    let amount_raw = validate::require_field(body.amount.as_deref())?;
    let description_raw = validate::require_field(body.description.as_deref())?;

    let token = validate::validate_address(token_raw, "token")?;
    let payee = validate::validate_address(payee_raw, "payee")?;
    let amount = validate::validate_create_amount(amount_raw)?;
    let description = validate::sanitize_description(description_raw)?;

    let tx_data = state.gateway.encode_create(token, payee, amount, &description);
    Ok(Json(CreateResponse {
        tx_data,
        request: CreateEcho {
            token,
            payee,
            amount: amount_raw.to_string(),
            description,
        },
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleBody {
    token_id: Option<String>,
    token_address: Option<String>,
    amount: Option<String>,
    owner: Option<String>,
}

/// `POST /payment/settle`: plans the settlement of a request. With
/// sufficient allowance the plan holds a lone settle transaction; otherwise
/// an approve plus a settle, and the allowance figures. The caller must
/// confirm the approval before submitting the settlement.
#[instrument(skip_all)]
async fn post_settle(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SettleBody>,
) -> Result<Json<SettleResponse>, ApiError> {
    let token_id_raw = validate::require_field(body.token_id.as_deref())?;
    let token_address_raw = validate::require_field(body.token_address.as_deref())?;
    let amount_raw = validate::require_field(body.amount.as_deref())?;
    let owner_raw = validate::require_field(body.owner.as_deref())?;

    let token_id = validate::validate_token_id(token_id_raw)?;
    let token_address = validate::validate_address(token_address_raw, "token")?;
    let amount = validate::validate_settle_amount(amount_raw)?;
    let owner = validate::validate_address(owner_raw, "owner")?;

    let plan = state
        .gateway
        .plan_settlement(token_id, token_address, amount, owner)
        .await?;
    Ok(Json(SettleResponse {
        transactions: plan.transactions,
        allowance: plan.allowance,
        request: SettleEcho {
            token_id,
            token_address,
            amount,
            owner,
        },
    }))
}

#[derive(Debug, Deserialize)]
struct ResolveBody {
    #[serde(rename = "userOpHash")]
    user_op_hash: Option<String>,
}

/// `POST /payment/resolve`: recovers a freshly created payment request from
/// a user-operation hash. Fetches the bundler receipt, decodes its logs, and
/// reads the details of the token minted by the `PaymentRequestCreated`
/// event. A missing receipt, a receipt without that event, and a details
/// read that reverts are all client errors; only transport failures are 500s.
#[instrument(skip_all)]
async fn post_resolve(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<PaymentRequest>, ApiError> {
    let raw = body
        .user_op_hash
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingUserOpHash)?;
    let hash = validate::validate_user_op_hash(raw)?;

    let receipt = state
        .receipts
        .user_operation_receipt(hash)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest("Failed to fetch UserOperation receipt".to_string())
        })?;

    let decoded = events::decode_logs(&receipt.receipt.logs);
    let token_id = events::find_created_token_id(&decoded).ok_or_else(|| {
        ApiError::BadRequest("No PaymentRequestCreated event found in logs".to_string())
    })?;

    let details = state
        .gateway
        .payment_details(token_id)
        .await
        .map_err(|error| match error {
            GatewayError::NotFound => {
                ApiError::BadRequest("Failed to fetch payment details".to_string())
            }
            other => ApiError::from(other),
        })?;
    Ok(Json(details))
}
