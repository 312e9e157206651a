//! ERC-4337 user-operation receipt retrieval.
//!
//! A wallet that submits the creation transaction through a bundler only
//! learns a user-operation hash; the receipt (and with it the minted token
//! id) becomes available asynchronously. `eth_getUserOperationReceipt` is a
//! bundler-namespace method, so it goes out as a raw JSON-RPC request rather
//! than through the typed provider. A `null` result means the bundle has not
//! landed yet; that is not a transport error.

use alloy_primitives::B256;
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::Log;
use alloy_transport::TransportError;
use async_trait::async_trait;
use serde::Deserialize;

/// Failure while fetching a user-operation receipt.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("user operation receipt fetch failed: {0}")]
    Transport(#[from] TransportError),
}

/// The portion of an `eth_getUserOperationReceipt` result this service
/// consumes. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    #[serde(default)]
    pub success: bool,
    /// The enclosing bundle transaction's receipt.
    pub receipt: BundleReceipt,
}

/// The inner transaction receipt; only its logs are inspected.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub logs: Vec<Log>,
}

/// Source of user-operation receipts. Injectable so tests can substitute a
/// canned receipt for the RPC round trip.
#[async_trait]
pub trait UserOpReceiptSource: Send + Sync {
    /// Fetches the receipt for `hash`. `Ok(None)` means the bundler has no
    /// receipt (yet) for that hash.
    async fn user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, ReceiptError>;
}

/// Production receipt source speaking JSON-RPC to the configured endpoint.
#[derive(Debug, Clone)]
pub struct AlchemyReceipts {
    client: RpcClient,
}

impl AlchemyReceipts {
    pub fn new(client: RpcClient) -> Self {
        AlchemyReceipts { client }
    }
}

#[async_trait]
impl UserOpReceiptSource for AlchemyReceipts {
    async fn user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, ReceiptError> {
        let receipt: Option<UserOperationReceipt> = self
            .client
            .request("eth_getUserOperationReceipt", (hash,))
            .await?;
        Ok(receipt)
    }
}
