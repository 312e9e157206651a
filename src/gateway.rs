//! All interaction with the two external contracts: reads against the
//! payment-requests NFT and the ERC-20 token, and calldata encoding for the
//! mutating operations.
//!
//! Reads go through [`PaymentRequestsReader`], so tests can substitute an
//! in-memory fake for the RPC-backed [`RpcReader`]. No call here retries,
//! caches, or falls back; each is independent and idempotent. The listing
//! operations are deliberately linear in holding count, one lookup plus one
//! details read per item, in index order.

use std::sync::Arc;

use alloy_contract::Error as ContractError;
use alloy_provider::Provider;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::Serialize;

use crate::contracts::{IERC20, IPaymentRequests};
use crate::types::{
    AllowanceCheck, EvmAddress, PaymentRequest, TokenAmount, TokenId, TransactionIntent,
};

/// A chain-read failure, as seen by the routes.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The details read reverted: no such request on the contract.
    #[error("payment request not found")]
    NotFound,
    /// Transport or contract-call failure.
    #[error("chain read failed: {0}")]
    Rpc(String),
}

/// Read operations against the payment-requests contract and its settlement
/// tokens. One method per contract view call.
#[async_trait]
pub trait PaymentRequestsReader: Send + Sync {
    async fn payment_details(&self, token_id: TokenId) -> Result<PaymentRequest, GatewayError>;
    async fn held_count(&self, owner: EvmAddress) -> Result<u64, GatewayError>;
    async fn held_token_at(
        &self,
        owner: EvmAddress,
        index: u64,
    ) -> Result<TokenId, GatewayError>;
    async fn created_count(&self, creator: EvmAddress) -> Result<u64, GatewayError>;
    async fn created_token_at(
        &self,
        creator: EvmAddress,
        index: u64,
    ) -> Result<TokenId, GatewayError>;
    async fn allowance(
        &self,
        token: EvmAddress,
        owner: EvmAddress,
        spender: EvmAddress,
    ) -> Result<TokenAmount, GatewayError>;
}

/// Production reader backed by an alloy HTTP provider.
#[derive(Debug, Clone)]
pub struct RpcReader<P> {
    provider: P,
    contract: EvmAddress,
}

impl<P> RpcReader<P> {
    pub fn new(provider: P, contract: EvmAddress) -> Self {
        RpcReader { provider, contract }
    }
}

fn rpc_error(error: ContractError) -> GatewayError {
    GatewayError::Rpc(error.to_string())
}

/// A JSON-RPC error response on the details read means the call reverted,
/// i.e. the token does not exist. Anything else is a transport problem.
fn details_error(error: ContractError) -> GatewayError {
    match &error {
        ContractError::TransportError(e) if e.as_error_resp().is_some() => GatewayError::NotFound,
        _ => rpc_error(error),
    }
}

fn into_count(value: alloy_primitives::U256) -> Result<u64, GatewayError> {
    u64::try_from(value).map_err(|_| GatewayError::Rpc("token count does not fit in u64".into()))
}

#[async_trait]
impl<P> PaymentRequestsReader for RpcReader<P>
where
    P: Provider + Clone + 'static,
{
    async fn payment_details(&self, token_id: TokenId) -> Result<PaymentRequest, GatewayError> {
        let contract = IPaymentRequests::new(self.contract.into(), self.provider.clone());
        let details = contract
            .getPaymentDetails(token_id.0)
            .call()
            .await
            .map_err(details_error)?;
        Ok(PaymentRequest {
            token_id,
            receiver: details.receiver.into(),
            payee: details.payee.into(),
            token: details.token.into(),
            amount: details.amount.into(),
            paid: details.paid,
            description: details.description,
        })
    }

    async fn held_count(&self, owner: EvmAddress) -> Result<u64, GatewayError> {
        let contract = IPaymentRequests::new(self.contract.into(), self.provider.clone());
        let count = contract
            .balanceOf(owner.into())
            .call()
            .await
            .map_err(rpc_error)?;
        into_count(count)
    }

    async fn held_token_at(
        &self,
        owner: EvmAddress,
        index: u64,
    ) -> Result<TokenId, GatewayError> {
        let contract = IPaymentRequests::new(self.contract.into(), self.provider.clone());
        let token_id = contract
            .tokenOfOwnerByIndex(owner.into(), alloy_primitives::U256::from(index))
            .call()
            .await
            .map_err(rpc_error)?;
        Ok(TokenId(token_id))
    }

    async fn created_count(&self, creator: EvmAddress) -> Result<u64, GatewayError> {
        let contract = IPaymentRequests::new(self.contract.into(), self.provider.clone());
        let count = contract
            .createdBalanceOf(creator.into())
            .call()
            .await
            .map_err(rpc_error)?;
        into_count(count)
    }

    async fn created_token_at(
        &self,
        creator: EvmAddress,
        index: u64,
    ) -> Result<TokenId, GatewayError> {
        let contract = IPaymentRequests::new(self.contract.into(), self.provider.clone());
        let token_id = contract
            .tokenOfCreatorByIndex(creator.into(), alloy_primitives::U256::from(index))
            .call()
            .await
            .map_err(rpc_error)?;
        Ok(TokenId(token_id))
    }

    async fn allowance(
        &self,
        token: EvmAddress,
        owner: EvmAddress,
        spender: EvmAddress,
    ) -> Result<TokenAmount, GatewayError> {
        let erc20 = IERC20::new(token.into(), self.provider.clone());
        let current = erc20
            .allowance(owner.into(), spender.into())
            .call()
            .await
            .map_err(rpc_error)?;
        Ok(TokenAmount(current))
    }
}

/// The unsigned transactions a settlement requires, in submission order:
/// `approve` (when present) must be confirmed before `settle` is submitted.
/// That ordering is the caller's responsibility.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SettlementTransactions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve: Option<TransactionIntent>,
    pub settle: TransactionIntent,
}

/// Result of [`ContractGateway::plan_settlement`].
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    pub transactions: SettlementTransactions,
    /// Present only when an approval is required.
    pub allowance: Option<AllowanceCheck>,
}

/// High-level operations over the payment-requests contract.
pub struct ContractGateway {
    reader: Arc<dyn PaymentRequestsReader>,
    contract: EvmAddress,
}

impl ContractGateway {
    pub fn new(reader: Arc<dyn PaymentRequestsReader>, contract: EvmAddress) -> Self {
        ContractGateway { reader, contract }
    }

    /// The configured payment-requests contract address.
    pub fn contract_address(&self) -> EvmAddress {
        self.contract
    }

    /// Reads a single payment request.
    pub async fn payment_details(&self, token_id: TokenId) -> Result<PaymentRequest, GatewayError> {
        self.reader.payment_details(token_id).await
    }

    /// Lists the requests held by `owner`: one balance read, then one indexed
    /// lookup and one details read per token, sequentially.
    pub async fn list_by_owner(
        &self,
        owner: EvmAddress,
    ) -> Result<Vec<PaymentRequest>, GatewayError> {
        let count = self.reader.held_count(owner).await?;
        let mut requests = Vec::with_capacity(count as usize);
        for index in 0..count {
            let token_id = self.reader.held_token_at(owner, index).await?;
            requests.push(self.reader.payment_details(token_id).await?);
        }
        Ok(requests)
    }

    /// Lists the requests created by `creator`, same access pattern as
    /// [`Self::list_by_owner`].
    pub async fn list_by_creator(
        &self,
        creator: EvmAddress,
    ) -> Result<Vec<PaymentRequest>, GatewayError> {
        let count = self.reader.created_count(creator).await?;
        let mut requests = Vec::with_capacity(count as usize);
        for index in 0..count {
            let token_id = self.reader.created_token_at(creator, index).await?;
            requests.push(self.reader.payment_details(token_id).await?);
        }
        Ok(requests)
    }

    /// Encodes a creation call against the payment-requests contract.
    pub fn encode_create(
        &self,
        token: EvmAddress,
        payee: EvmAddress,
        amount: TokenAmount,
        description: &str,
    ) -> TransactionIntent {
        let call = IPaymentRequests::createPaymentRequestCall {
            token: token.into(),
            payee: payee.into(),
            amount: amount.0,
            description: description.to_string(),
        };
        TransactionIntent {
            address: self.contract,
            data: call.abi_encode().into(),
        }
    }

    /// Encodes a settlement call.
    pub fn encode_settle(&self, token_id: TokenId) -> TransactionIntent {
        let call = IPaymentRequests::settlePaymentRequestCall {
            tokenId: token_id.0,
        };
        TransactionIntent {
            address: self.contract,
            data: call.abi_encode().into(),
        }
    }

    /// Encodes a cancellation call.
    pub fn encode_cancel(&self, token_id: TokenId) -> TransactionIntent {
        let call = IPaymentRequests::cancelPaymentRequestCall {
            tokenId: token_id.0,
        };
        TransactionIntent {
            address: self.contract,
            data: call.abi_encode().into(),
        }
    }

    /// Encodes an ERC-20 approval of the payment-requests contract for
    /// exactly `amount`, targeted at the token contract.
    pub fn encode_approve(&self, token: EvmAddress, amount: TokenAmount) -> TransactionIntent {
        let call = IERC20::approveCall {
            spender: self.contract.into(),
            amount: amount.0,
        };
        TransactionIntent {
            address: token,
            data: call.abi_encode().into(),
        }
    }

    /// Reads the owner's current allowance toward the payment-requests
    /// contract and compares it with the required amount.
    pub async fn check_allowance(
        &self,
        token: EvmAddress,
        owner: EvmAddress,
        required: TokenAmount,
    ) -> Result<AllowanceCheck, GatewayError> {
        let current = self.reader.allowance(token, owner, self.contract).await?;
        Ok(AllowanceCheck {
            current,
            required,
            needs_approval: current < required,
        })
    }

    /// Plans a settlement: with sufficient allowance, a lone settle intent;
    /// otherwise an approve intent plus a settle intent and the allowance
    /// figures, so the caller knows two transactions are required.
    pub async fn plan_settlement(
        &self,
        token_id: TokenId,
        token: EvmAddress,
        amount: TokenAmount,
        owner: EvmAddress,
    ) -> Result<SettlementPlan, GatewayError> {
        let allowance = self.check_allowance(token, owner, amount).await?;
        let settle = self.encode_settle(token_id);
        if allowance.needs_approval {
            Ok(SettlementPlan {
                transactions: SettlementTransactions {
                    approve: Some(self.encode_approve(token, amount)),
                    settle,
                },
                allowance: Some(allowance),
            })
        } else {
            Ok(SettlementPlan {
                transactions: SettlementTransactions {
                    approve: None,
                    settle,
                },
                allowance: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256, address};
    use std::collections::HashMap;

    const CONTRACT: Address = address!("0x00000000000000000000000000000000000000aa");
    const TOKEN: Address = address!("0x00000000000000000000000000000000000000bb");
    const ALICE: Address = address!("0x0000000000000000000000000000000000000a11");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

    fn request(id: u64, paid: bool) -> PaymentRequest {
        PaymentRequest {
            token_id: TokenId::from(id),
            receiver: ALICE.into(),
            payee: BOB.into(),
            token: TOKEN.into(),
            amount: TokenAmount(U256::from(1_000u64)),
            paid,
            description: format!("invoice {id}"),
        }
    }

    #[derive(Default)]
    struct FakeReader {
        requests: HashMap<TokenId, PaymentRequest>,
        held: HashMap<EvmAddress, Vec<TokenId>>,
        created: HashMap<EvmAddress, Vec<TokenId>>,
        allowances: HashMap<(EvmAddress, EvmAddress), TokenAmount>,
    }

    #[async_trait]
    impl PaymentRequestsReader for FakeReader {
        async fn payment_details(&self, token_id: TokenId) -> Result<PaymentRequest, GatewayError> {
            self.requests
                .get(&token_id)
                .cloned()
                .ok_or(GatewayError::NotFound)
        }

        async fn held_count(&self, owner: EvmAddress) -> Result<u64, GatewayError> {
            Ok(self.held.get(&owner).map_or(0, |t| t.len() as u64))
        }

        async fn held_token_at(
            &self,
            owner: EvmAddress,
            index: u64,
        ) -> Result<TokenId, GatewayError> {
            self.held
                .get(&owner)
                .and_then(|t| t.get(index as usize))
                .copied()
                .ok_or_else(|| GatewayError::Rpc("index out of bounds".into()))
        }

        async fn created_count(&self, creator: EvmAddress) -> Result<u64, GatewayError> {
            Ok(self.created.get(&creator).map_or(0, |t| t.len() as u64))
        }

        async fn created_token_at(
            &self,
            creator: EvmAddress,
            index: u64,
        ) -> Result<TokenId, GatewayError> {
            self.created
                .get(&creator)
                .and_then(|t| t.get(index as usize))
                .copied()
                .ok_or_else(|| GatewayError::Rpc("index out of bounds".into()))
        }

        async fn allowance(
            &self,
            token: EvmAddress,
            owner: EvmAddress,
            _spender: EvmAddress,
        ) -> Result<TokenAmount, GatewayError> {
            Ok(self
                .allowances
                .get(&(token, owner))
                .copied()
                .unwrap_or(TokenAmount(U256::ZERO)))
        }
    }

    fn gateway(reader: FakeReader) -> ContractGateway {
        ContractGateway::new(Arc::new(reader), CONTRACT.into())
    }

    #[tokio::test]
    async fn lists_held_requests_in_index_order() {
        let mut reader = FakeReader::default();
        for id in [3u64, 1, 2] {
            reader.requests.insert(TokenId::from(id), request(id, false));
        }
        reader.held.insert(
            ALICE.into(),
            vec![TokenId::from(3u64), TokenId::from(1u64), TokenId::from(2u64)],
        );
        let listed = gateway(reader).list_by_owner(ALICE.into()).await.unwrap();
        let ids: Vec<TokenId> = listed.iter().map(|r| r.token_id).collect();
        assert_eq!(
            ids,
            vec![TokenId::from(3u64), TokenId::from(1u64), TokenId::from(2u64)]
        );
    }

    #[tokio::test]
    async fn empty_holder_lists_nothing() {
        let listed = gateway(FakeReader::default())
            .list_by_owner(ALICE.into())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn lists_created_requests() {
        let mut reader = FakeReader::default();
        reader.requests.insert(TokenId::from(7u64), request(7, true));
        reader.created.insert(BOB.into(), vec![TokenId::from(7u64)]);
        let listed = gateway(reader).list_by_creator(BOB.into()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].token_id, TokenId::from(7u64));
    }

    #[tokio::test]
    async fn missing_token_is_not_found() {
        let result = gateway(FakeReader::default())
            .payment_details(TokenId::from(99u64))
            .await;
        assert!(matches!(result, Err(GatewayError::NotFound)));
    }

    #[tokio::test]
    async fn sufficient_allowance_plans_settle_only() {
        let mut reader = FakeReader::default();
        reader.allowances.insert(
            (TOKEN.into(), ALICE.into()),
            TokenAmount(U256::from(1_000u64)),
        );
        let plan = gateway(reader)
            .plan_settlement(
                TokenId::from(1u64),
                TOKEN.into(),
                TokenAmount(U256::from(1_000u64)),
                ALICE.into(),
            )
            .await
            .unwrap();
        assert!(plan.transactions.approve.is_none());
        assert!(plan.allowance.is_none());
        assert_eq!(plan.transactions.settle.address, CONTRACT.into());
    }

    #[tokio::test]
    async fn insufficient_allowance_plans_approve_then_settle() {
        let mut reader = FakeReader::default();
        reader
            .allowances
            .insert((TOKEN.into(), ALICE.into()), TokenAmount(U256::from(400u64)));
        let plan = gateway(reader)
            .plan_settlement(
                TokenId::from(1u64),
                TOKEN.into(),
                TokenAmount(U256::from(1_000u64)),
                ALICE.into(),
            )
            .await
            .unwrap();
        let approve = plan.transactions.approve.expect("approve intent");
        assert_eq!(approve.address, TOKEN.into());
        assert_eq!(plan.transactions.settle.address, CONTRACT.into());
        let allowance = plan.allowance.expect("allowance figures");
        assert_eq!(allowance.current, TokenAmount(U256::from(400u64)));
        assert_eq!(allowance.required, TokenAmount(U256::from(1_000u64)));
        assert!(allowance.needs_approval);
    }

    #[tokio::test]
    async fn zero_prior_allowance_still_plans() {
        let plan = gateway(FakeReader::default())
            .plan_settlement(
                TokenId::from(1u64),
                TOKEN.into(),
                TokenAmount(U256::from(5u64)),
                ALICE.into(),
            )
            .await
            .unwrap();
        assert!(plan.transactions.approve.is_some());
        assert_eq!(
            plan.allowance.unwrap().current,
            TokenAmount(U256::ZERO)
        );
    }

    #[test]
    fn encoded_create_roundtrips() {
        let gateway = gateway(FakeReader::default());
        let intent = gateway.encode_create(
            TOKEN.into(),
            BOB.into(),
            TokenAmount(U256::from(42u64)),
            "Rent",
        );
        assert_eq!(intent.address, CONTRACT.into());
        let call = IPaymentRequests::createPaymentRequestCall::abi_decode(&intent.data).unwrap();
        assert_eq!(call.token, TOKEN);
        assert_eq!(call.payee, BOB);
        assert_eq!(call.amount, U256::from(42u64));
        assert_eq!(call.description, "Rent");
    }

    #[test]
    fn encoded_settle_and_cancel_carry_the_token_id() {
        let gateway = gateway(FakeReader::default());
        let settle = gateway.encode_settle(TokenId::from(9u64));
        let call = IPaymentRequests::settlePaymentRequestCall::abi_decode(&settle.data).unwrap();
        assert_eq!(call.tokenId, U256::from(9u64));

        let cancel = gateway.encode_cancel(TokenId::from(9u64));
        let call = IPaymentRequests::cancelPaymentRequestCall::abi_decode(&cancel.data).unwrap();
        assert_eq!(call.tokenId, U256::from(9u64));
        assert_ne!(settle.data, cancel.data);
    }

    #[test]
    fn encoded_approve_targets_the_token_contract() {
        let gateway = gateway(FakeReader::default());
        let intent = gateway.encode_approve(TOKEN.into(), TokenAmount(U256::from(77u64)));
        assert_eq!(intent.address, TOKEN.into());
        let call = IERC20::approveCall::abi_decode(&intent.data).unwrap();
        assert_eq!(call.spender, CONTRACT);
        assert_eq!(call.amount, U256::from(77u64));
    }
}
