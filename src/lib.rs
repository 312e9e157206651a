//! HTTP gateway for on-chain payment requests.
//!
//! Payment requests live on an EVM chain as non-fungible tokens: each token
//! records who must pay whom, in which ERC-20 token, how much, and whether it
//! has been settled. This crate is a stateless JSON façade over that
//! contract. It reads the contract's current view, encodes unsigned calls
//! for the caller's wallet to sign and submit, and recovers freshly minted
//! requests from ERC-4337 user-operation receipts. It holds no keys, submits
//! no transactions, and keeps no state of its own.
//!
//! # Modules
//!
//! - [`config`] — Environment-driven configuration (contract address, RPC
//!   endpoint, bind address).
//! - [`contracts`] — `sol!` ABI bindings for the payment-requests NFT and
//!   the ERC-20 approve/allowance subset.
//! - [`events`] — Best-effort decoding of receipt logs against the
//!   contract's event signatures.
//! - [`gateway`] — Chain reads (behind an injectable reader trait) and
//!   calldata encoding for the mutating operations.
//! - [`handlers`] — The axum route handlers and the two-class error mapping
//!   (specific 400s, generic 500s).
//! - [`receipt`] — `eth_getUserOperationReceipt` lookups.
//! - [`shape`] — Status filtering, page slicing, and response envelopes.
//! - [`types`] — Boundary types; wide integers serialize as decimal strings.
//! - [`validate`] — Fail-fast request validation, run before any chain
//!   access.
//! - [`util`] — Signal handling and log subscriber setup.

pub mod config;
pub mod contracts;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod receipt;
pub mod shape;
pub mod types;
pub mod util;
pub mod validate;
