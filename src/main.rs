//! Payment-requests gateway HTTP entrypoint.
//!
//! Launches an Axum-based server exposing the payment-requests API over an
//! EVM chain RPC endpoint.
//!
//! Endpoints:
//! - `GET /payment` – one payment's details by token id
//! - `GET /payment/held` – requests held by an address (paginated)
//! - `GET /payment/created` – requests created by an address
//! - `POST /payment/create` – encode a creation call
//! - `POST /payment/settle` – plan a settlement
//! - `POST /payment/resolve` – recover a payment from a user-operation hash
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `PAYMENT_REQUESTS_ADDRESS`, `ALCHEMY_API_KEY` required
//! - `RPC_URL` overrides the derived Alchemy endpoint
//! - `HOST`, `PORT` control the binding address

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use alloy_provider::ProviderBuilder;
use alloy_rpc_client::RpcClient;
use axum::http::Method;
use dotenvy::dotenv;
use tower_http::cors;
use tower_http::trace::TraceLayer;

use payreq_rs::config::Config;
use payreq_rs::gateway::{ContractGateway, RpcReader};
use payreq_rs::handlers::{self, AppState};
use payreq_rs::receipt::AlchemyReceipts;
use payreq_rs::util::{SigDown, telemetry};

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("{e}");
        process::exit(1)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize rustls crypto provider (ring)
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .expect("Failed to initialize rustls crypto provider");

    // Load .env variables
    dotenv().ok();

    telemetry::init();

    let config = Config::from_env()?;

    let provider = ProviderBuilder::new().connect_http(config.rpc_url().clone());
    let reader = RpcReader::new(provider, config.payment_requests_address());
    let gateway = ContractGateway::new(Arc::new(reader), config.payment_requests_address());
    let receipts = AlchemyReceipts::new(RpcClient::new_http(config.rpc_url().clone()));

    let state = Arc::new(AppState {
        gateway,
        receipts: Arc::new(receipts),
    });

    let http_endpoints = handlers::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    let graceful_shutdown = async move { cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
