//! Decoding of transaction-receipt logs against the payment-requests
//! contract's event signatures.
//!
//! Decoding is best-effort per log: a log that does not match any known
//! signature, or that matches but fails to decode, becomes
//! [`DecodedEvent::Unknown`] carrying the raw topics and data. A bad log
//! never fails the batch. The resolve flow only consumes
//! `PaymentRequestCreated`, but decoding stays total so callers can log what
//! else the transaction emitted.

use alloy_primitives::{B256, Bytes, LogData};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;

use crate::contracts::IPaymentRequests;
use crate::types::{EvmAddress, TokenAmount, TokenId};

/// A receipt log decoded against the contract's known events.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    Created {
        token_id: TokenId,
        creator: EvmAddress,
        payee: EvmAddress,
        token: EvmAddress,
        amount: TokenAmount,
    },
    Settled {
        token_id: TokenId,
        payer: EvmAddress,
    },
    Cancelled {
        token_id: TokenId,
    },
    /// Anything that did not decode. Raw topics and data are preserved.
    Unknown {
        topics: Vec<B256>,
        data: Bytes,
    },
}

impl DecodedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DecodedEvent::Created { .. } => "PaymentRequestCreated",
            DecodedEvent::Settled { .. } => "PaymentRequestSettled",
            DecodedEvent::Cancelled { .. } => "PaymentRequestCancelled",
            DecodedEvent::Unknown { .. } => "UnknownEvent",
        }
    }
}

fn unknown(log: &LogData) -> DecodedEvent {
    DecodedEvent::Unknown {
        topics: log.topics().to_vec(),
        data: log.data.clone(),
    }
}

/// Decodes one log. Never fails.
pub fn decode_log(log: &LogData) -> DecodedEvent {
    let Some(topic0) = log.topics().first() else {
        return unknown(log);
    };
    match *topic0 {
        IPaymentRequests::PaymentRequestCreated::SIGNATURE_HASH => {
            match IPaymentRequests::PaymentRequestCreated::decode_log_data(log) {
                Ok(event) => DecodedEvent::Created {
                    token_id: TokenId(event.tokenId),
                    creator: event.creator.into(),
                    payee: event.payee.into(),
                    token: event.token.into(),
                    amount: TokenAmount(event.amount),
                },
                Err(_) => unknown(log),
            }
        }
        IPaymentRequests::PaymentRequestSettled::SIGNATURE_HASH => {
            match IPaymentRequests::PaymentRequestSettled::decode_log_data(log) {
                Ok(event) => DecodedEvent::Settled {
                    token_id: TokenId(event.tokenId),
                    payer: event.payer.into(),
                },
                Err(_) => unknown(log),
            }
        }
        IPaymentRequests::PaymentRequestCancelled::SIGNATURE_HASH => {
            match IPaymentRequests::PaymentRequestCancelled::decode_log_data(log) {
                Ok(event) => DecodedEvent::Cancelled {
                    token_id: TokenId(event.tokenId),
                },
                Err(_) => unknown(log),
            }
        }
        _ => unknown(log),
    }
}

/// Decodes every log of a receipt, in order.
pub fn decode_logs<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Vec<DecodedEvent> {
    logs.into_iter()
        .map(|log| decode_log(&log.inner.data))
        .collect()
}

/// Finds the token id minted by the first `PaymentRequestCreated` event.
pub fn find_created_token_id(events: &[DecodedEvent]) -> Option<TokenId> {
    events.iter().find_map(|event| match event {
        DecodedEvent::Created { token_id, .. } => Some(*token_id),
        _ => None,
    })
}
