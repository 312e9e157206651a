//! Response shaping: status filtering, page slicing, and the JSON envelopes
//! returned by the routes.
//!
//! Wide integers never appear as JSON numbers here; the decimal-string
//! conversion lives on the types themselves (see [`crate::types`]). This
//! module only rearranges already-safe values.

use serde::Serialize;

use crate::gateway::SettlementTransactions;
use crate::types::{AllowanceCheck, EvmAddress, PaymentRequest, TokenAmount, TokenId, TransactionIntent};

/// Validated pagination parameters, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

/// The `status` query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Paid,
    Unpaid,
}

impl StatusFilter {
    fn matches(&self, request: &PaymentRequest) -> bool {
        match self {
            StatusFilter::Paid => request.paid,
            StatusFilter::Unpaid => !request.paid,
        }
    }
}

/// Applies the optional status filter. Totals downstream are computed over
/// the filtered sequence, not the raw one.
pub fn filter_by_status(
    requests: Vec<PaymentRequest>,
    status: Option<StatusFilter>,
) -> Vec<PaymentRequest> {
    match status {
        None => requests,
        Some(filter) => requests.into_iter().filter(|r| filter.matches(r)).collect(),
    }
}

/// A page slice plus the figures the listing envelope reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
}

/// Slices `[(page-1)*limit, (page-1)*limit + limit)` out of `items`.
///
/// A start index beyond the end yields an empty slice, not an error. Limit
/// bounds are enforced at validation time, not here.
pub fn paginate<T>(items: Vec<T>, page: &Page) -> PageSlice<T> {
    let total = items.len() as u64;
    let total_pages = total.div_ceil(page.limit);
    let start = (page.page - 1).saturating_mul(page.limit);
    let items = items
        .into_iter()
        .skip(start as usize)
        .take(page.limit as usize)
        .collect();
    PageSlice {
        items,
        total,
        total_pages,
    }
}

/// `GET /payment` envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsResponse {
    pub payment_details: PaymentRequest,
}

/// `GET /payment/held` envelope. Totals reflect the filtered count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldResponse {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub requests: Vec<PaymentRequest>,
}

impl HeldResponse {
    pub fn new(slice: PageSlice<PaymentRequest>, page: &Page) -> Self {
        HeldResponse {
            total: slice.total,
            page: page.page,
            limit: page.limit,
            total_pages: slice.total_pages,
            requests: slice.items,
        }
    }
}

/// `GET /payment/created` envelope.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub total: u64,
    pub requests: Vec<PaymentRequest>,
}

impl CreatedResponse {
    pub fn new(requests: Vec<PaymentRequest>) -> Self {
        CreatedResponse {
            total: requests.len() as u64,
            requests,
        }
    }
}

/// Validated echo of a creation request, returned alongside the intent so the
/// caller sees exactly what was encoded.
#[derive(Debug, Serialize)]
pub struct CreateEcho {
    pub token: EvmAddress,
    pub payee: EvmAddress,
    /// The amount string as validated, not the scaled base units.
    pub amount: String,
    pub description: String,
}

/// `POST /payment/create` envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub tx_data: TransactionIntent,
    pub request: CreateEcho,
}

/// Validated echo of a settlement request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleEcho {
    pub token_id: TokenId,
    pub token_address: EvmAddress,
    pub amount: TokenAmount,
    pub owner: EvmAddress,
}

/// `POST /payment/settle` envelope. `allowance` is present only when an
/// approval has to precede the settlement.
#[derive(Debug, Serialize)]
pub struct SettleResponse {
    pub transactions: SettlementTransactions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowance: Option<AllowanceCheck>,
    pub request: SettleEcho,
}
