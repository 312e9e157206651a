//! Environment-driven configuration.
//!
//! Values come from the process environment (`.env` is loaded in `main`
//! before this runs). The contract address and the RPC-provider API key are
//! required: without either there is nothing this service can do, so their
//! absence is a startup failure, never a per-request one.

use std::env;
use std::net::IpAddr;
use url::Url;

use crate::types::EvmAddress;

/// Environment variable names.
pub const ENV_PAYMENT_REQUESTS_ADDRESS: &str = "PAYMENT_REQUESTS_ADDRESS";
pub const ENV_ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
pub const ENV_RPC_URL: &str = "RPC_URL";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    MissingVar(&'static str),
    #[error("Invalid {ENV_PAYMENT_REQUESTS_ADDRESS}: {0}")]
    InvalidContractAddress(String),
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(#[from] url::ParseError),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    payment_requests_address: EvmAddress,
    rpc_url: Url,
    host: IpAddr,
    port: u16,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// `RPC_URL` overrides the Alchemy endpoint derived from
    /// `ALCHEMY_API_KEY`; both chain reads and receipt lookups go through the
    /// resulting URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let address = env::var(ENV_PAYMENT_REQUESTS_ADDRESS)
            .map_err(|_| ConfigError::MissingVar(ENV_PAYMENT_REQUESTS_ADDRESS))?;
        let payment_requests_address = address
            .parse()
            .map_err(|_| ConfigError::InvalidContractAddress(address))?;
        let api_key = env::var(ENV_ALCHEMY_API_KEY)
            .map_err(|_| ConfigError::MissingVar(ENV_ALCHEMY_API_KEY))?;
        let rpc_url = match env::var(ENV_RPC_URL) {
            Ok(url) => url.parse()?,
            Err(_) => format!("https://base-mainnet.g.alchemy.com/v2/{api_key}").parse()?,
        };
        Ok(Config {
            payment_requests_address,
            rpc_url,
            host: default_host(),
            port: default_port(),
        })
    }

    /// The payment-requests contract address.
    pub fn payment_requests_address(&self) -> EvmAddress {
        self.payment_requests_address
    }

    /// The JSON-RPC endpoint used for chain reads and receipt lookups.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// `$PORT` env var, falling back to 8080.
fn default_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// `$HOST` env var, falling back to "0.0.0.0".
fn default_host() -> IpAddr {
    env::var("HOST")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(IpAddr::V4(DEFAULT_HOST.parse().expect("valid default host")))
}
