//! Boundary types shared across the payment-requests gateway.
//!
//! The key objects are [`PaymentRequest`] (the contract's view of a request),
//! [`TransactionIntent`] (an unsigned call for the caller's wallet to submit),
//! and [`AllowanceCheck`] (the approve-before-settle figures).
//!
//! Chain-side integers ([`TokenId`], [`TokenAmount`]) are `U256` internally and
//! serialize as decimal strings, never as native JSON numbers, so callers do
//! not lose precision to floating-point JSON decoding.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// Represents an EVM address.
///
/// Wrapper around [`alloy_primitives::Address`], providing display and
/// serialization support. Serialized as the EIP-55 checksummed string.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct EvmAddress(pub Address);

impl Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to decode EVM address")]
pub struct EvmAddressDecodingError;

impl FromStr for EvmAddress {
    type Err = EvmAddressDecodingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address::from_str(s).map_err(|_| EvmAddressDecodingError)?;
        Ok(Self(address))
    }
}

impl From<Address> for EvmAddress {
    fn from(address: Address) -> Self {
        EvmAddress(address)
    }
}

impl From<EvmAddress> for Address {
    fn from(address: EvmAddress) -> Self {
        address.0
    }
}

impl Serialize for EvmAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for EvmAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EvmAddress::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The identifier of a payment-request token, assigned by the contract at
/// creation. Serialized as a decimal string.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub U256);

impl Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for TokenId {
    fn from(value: U256) -> Self {
        TokenId(value)
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        TokenId(U256::from(value))
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = U256::from_str_radix(&s, 10)
            .map_err(|_| serde::de::Error::custom("token id must be a decimal integer string"))?;
        Ok(TokenId(value))
    }
}

/// A precise on-chain token amount in base units. Serialized as a decimal
/// string to prevent precision loss.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenAmount(pub U256);

impl Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        TokenAmount(value)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        TokenAmount(U256::from(value))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = U256::from_str_radix(&s, 10)
            .map_err(|_| serde::de::Error::custom("amount must be a decimal integer string"))?;
        Ok(TokenAmount(value))
    }
}

/// The contract's current view of a payment request.
///
/// Read-only from this service's perspective: the contract creates it in
/// response to a creation transaction and flips `paid` on settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub token_id: TokenId,
    /// Holder of the request token, the party expected to pay.
    pub receiver: EvmAddress,
    /// Party the settlement transfer goes to.
    pub payee: EvmAddress,
    /// ERC-20 token the request is denominated in.
    pub token: EvmAddress,
    pub amount: TokenAmount,
    pub paid: bool,
    pub description: String,
}

/// An unsigned contract call: target address plus encoded calldata.
///
/// Produced for creation, settlement, cancellation, and approval. This
/// service never signs or submits it; the caller's wallet does.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    pub address: EvmAddress,
    pub data: Bytes,
}

/// Allowance figures computed for a settlement request.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceCheck {
    pub current: TokenAmount,
    pub required: TokenAmount,
    pub needs_approval: bool,
}

/// JSON error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn token_amount_serializes_as_decimal_string() {
        let amount = TokenAmount(U256::from(1_000_000_000_000_000_000u64));
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000000000000000\"");
    }

    #[test]
    fn token_amount_roundtrips_beyond_u64() {
        let json = "\"340282366920938463463374607431768211456\""; // 2^128
        let amount: TokenAmount = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), json);
    }

    #[test]
    fn token_amount_rejects_hex_and_negative() {
        assert!(serde_json::from_str::<TokenAmount>("\"0x10\"").is_err());
        assert!(serde_json::from_str::<TokenAmount>("\"-5\"").is_err());
    }

    #[test]
    fn evm_address_serializes_checksummed() {
        let address = EvmAddress(address!("0x036cbd53842c5426634e7929541ec2318f3dcf7e"));
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"0x036CbD53842c5426634e7929541eC2318f3dCF7e\"");
    }

    #[test]
    fn evm_address_parses_any_case() {
        let lower: EvmAddress = "0x036cbd53842c5426634e7929541ec2318f3dcf7e".parse().unwrap();
        let upper: EvmAddress = "0x036CBD53842C5426634E7929541EC2318F3DCF7E".parse().unwrap();
        assert_eq!(lower, upper);
        assert!("0x1234".parse::<EvmAddress>().is_err());
        assert!("not-an-address".parse::<EvmAddress>().is_err());
    }
}
