//! # zena-oracle
//!
//! Client layer for the external checkpoint/milestone oracle (Iris).
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Capability trait**: spans, state-sync event windows, checkpoints,
//!   milestones and the milestone no-ack protocol behind one async trait
//! - **Three transports**: JSON-over-HTTP, gRPC with server-streamed event
//!   pages, and an embedded in-process keeper for oracle-less runs
//! - **Resilience decorator**: per-call timeout, linear-backoff retry on
//!   retryable transport codes, circuit breaker, LRU response cache
//!
//! ## Architecture
//!
//! ```text
//!              ┌── IrisHttpClient ──→ Iris REST endpoints
//! ResilientClient ── IrisGrpcClient ──→ iris.v1.Iris gRPC service
//!              └── EmbeddedClient ──→ in-memory keeper state
//! ```
//!
//! Every variant satisfies `OracleClient`; the engine and whitelist layers
//! only ever see the decorated trait object.
//!
//! ## Example
//!
//! ```rust,ignore
//! use zena_oracle::{IrisHttpClient, OracleClient, OracleConfig, ResilientClient};
//!
//! let config = OracleConfig::default();
//! let inner = IrisHttpClient::new("http://localhost:1317", config.state_fetch_limit)?;
//! let client = ResilientClient::new(inner, config);
//!
//! let span = client.span(7).await?;
//! let latest = client.fetch_checkpoint(zena_oracle::LATEST_CHECKPOINT).await?;
//! ```

pub mod breaker;
pub mod client;
pub mod config;
pub mod embedded;
pub mod error;
pub mod grpc;
pub mod http;
pub mod resilient;

mod cache;

pub use breaker::CircuitBreaker;
pub use client::{OracleClient, LATEST_CHECKPOINT};
pub use config::{OracleConfig, DEFAULT_STATE_FETCH_LIMIT};
pub use embedded::EmbeddedClient;
pub use error::{OracleError, OracleResult, TransportCode};
pub use grpc::IrisGrpcClient;
pub use http::IrisHttpClient;
pub use resilient::ResilientClient;

use std::sync::Arc;

/// Builds the configured oracle client behind the resilience decorator.
///
/// Selection order follows the configuration: `without_oracle` wins, then a
/// non-empty gRPC address, then the HTTP url.
pub async fn build_client(config: OracleConfig) -> OracleResult<Arc<dyn OracleClient>> {
    if config.without_oracle {
        let inner = EmbeddedClient::with_fetch_limit(config.state_fetch_limit);
        return Ok(Arc::new(ResilientClient::new(inner, config)));
    }
    if let Some(address) = config.grpc_address.clone() {
        let inner = IrisGrpcClient::connect(address, config.state_fetch_limit).await?;
        return Ok(Arc::new(ResilientClient::new(inner, config)));
    }
    let url = config
        .url
        .clone()
        .ok_or_else(|| OracleError::Unavailable("no oracle endpoint configured".to_string()))?;
    let inner = IrisHttpClient::new(url, config.state_fetch_limit)?;
    Ok(Arc::new(ResilientClient::new(inner, config)))
}
