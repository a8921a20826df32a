//! Stream-capable gRPC oracle variant.
//!
//! Unary calls map one to one onto the capability set; the event-record
//! fetch is server-streamed in pages and accumulated here so callers see
//! the same `Vec<EventRecord>` surface as the other variants.

pub mod proto;

use crate::client::OracleClient;
use crate::error::{OracleError, OracleResult, TransportCode};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tonic::transport::Channel;
use tracing::debug;
use zena_types::{
    Address, Checkpoint, EventRecord, Hash, Milestone, OracleSpan, Span, Validator,
};

use proto::iris_client::IrisClient;

/// Oracle client speaking the `iris.v1.Iris` gRPC service.
pub struct IrisGrpcClient {
    // The stub takes &mut self per call; serialize access through a tokio
    // mutex so the adapter stays shareable behind the common trait.
    client: Mutex<IrisClient<Channel>>,
    state_fetch_limit: u64,
    closed: AtomicBool,
}

impl IrisGrpcClient {
    /// Connects to the oracle's gRPC endpoint, e.g. `http://localhost:3131`.
    pub async fn connect(
        address: impl Into<String>,
        state_fetch_limit: u64,
    ) -> OracleResult<Self> {
        let address = address.into();
        debug!(%address, "connecting to oracle grpc endpoint");
        let client = IrisClient::connect(address)
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        Ok(Self {
            client: Mutex::new(client),
            state_fetch_limit: state_fetch_limit.max(1),
            closed: AtomicBool::new(false),
        })
    }

    /// Wraps an already-connected stub. Used by tests with an in-process
    /// channel.
    pub fn from_channel(channel: Channel, state_fetch_limit: u64) -> Self {
        Self {
            client: Mutex::new(IrisClient::new(channel)),
            state_fetch_limit: state_fetch_limit.max(1),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> OracleResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(OracleError::Closed);
        }
        Ok(())
    }
}

fn map_status(status: tonic::Status) -> OracleError {
    let code = match status.code() {
        tonic::Code::Unavailable => TransportCode::Unavailable,
        tonic::Code::Internal => TransportCode::Internal,
        tonic::Code::Aborted => TransportCode::Aborted,
        tonic::Code::NotFound => TransportCode::NotFound,
        tonic::Code::DeadlineExceeded => TransportCode::DeadlineExceeded,
        tonic::Code::InvalidArgument => TransportCode::InvalidArgument,
        _ => TransportCode::Unknown,
    };
    OracleError::Transport {
        code,
        message: status.message().to_string(),
    }
}

fn address_from_bytes(bytes: &[u8]) -> OracleResult<Address> {
    if bytes.len() != 20 {
        return Err(OracleError::Decode(format!(
            "address must be 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(bytes))
}

fn hash_from_bytes(bytes: &[u8]) -> OracleResult<Hash> {
    if bytes.len() != 32 {
        return Err(OracleError::Decode(format!(
            "hash must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Hash::from_slice(bytes))
}

fn validator_from_proto(v: proto::Validator) -> OracleResult<Validator> {
    Ok(Validator::new(
        v.id,
        address_from_bytes(&v.address)?,
        v.voting_power as i64,
    ))
}

fn span_from_proto(resp: proto::SpanResponse) -> OracleResult<OracleSpan> {
    Ok(OracleSpan {
        span: Span::new(resp.id, resp.start_block, resp.end_block),
        validators: resp
            .validators
            .into_iter()
            .map(validator_from_proto)
            .collect::<OracleResult<Vec<_>>>()?,
        selected_producers: resp
            .selected_producers
            .into_iter()
            .map(validator_from_proto)
            .collect::<OracleResult<Vec<_>>>()?,
        chain_id: resp.chain_id,
    })
}

fn event_from_proto(e: proto::EventRecord) -> OracleResult<EventRecord> {
    Ok(EventRecord {
        id: e.id,
        contract: address_from_bytes(&e.contract)?,
        data: e.data,
        tx_hash: hash_from_bytes(&e.tx_hash)?,
        log_index: e.log_index,
        chain_id: e.chain_id,
        time: e.time,
    })
}

#[async_trait]
impl OracleClient for IrisGrpcClient {
    async fn span(&self, id: u64) -> OracleResult<OracleSpan> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .span(proto::SpanRequest { id })
            .await
            .map_err(map_status)?;
        span_from_proto(resp.into_inner())
    }

    async fn state_sync_events(
        &self,
        from_id: u64,
        to_time: u64,
    ) -> OracleResult<Vec<EventRecord>> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .state_sync_events(proto::StateSyncEventsRequest {
                from_id,
                to_time,
                limit: self.state_fetch_limit,
            })
            .await
            .map_err(map_status)?;

        // Drain every streamed page before returning; partial windows would
        // desynchronize the event sequence on the caller's side.
        let mut stream = resp.into_inner();
        let mut events = Vec::new();
        while let Some(page) = stream.message().await.map_err(map_status)? {
            for event in page.events {
                events.push(event_from_proto(event)?);
            }
        }
        debug!(from_id, to_time, count = events.len(), "event stream drained");
        Ok(events)
    }

    async fn fetch_checkpoint(&self, number: i64) -> OracleResult<Checkpoint> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .checkpoint(proto::CheckpointRequest { number })
            .await
            .map_err(map_status)?
            .into_inner();
        Ok(Checkpoint {
            proposer: address_from_bytes(&resp.proposer)?,
            start_block: resp.start_block,
            end_block: resp.end_block,
            root_hash: hash_from_bytes(&resp.root_hash)?,
            chain_id: resp.chain_id,
            timestamp: resp.timestamp,
        })
    }

    async fn fetch_checkpoint_count(&self) -> OracleResult<u64> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .checkpoint_count(proto::CountRequest {})
            .await
            .map_err(map_status)?;
        Ok(resp.into_inner().count)
    }

    async fn fetch_milestone(&self) -> OracleResult<Milestone> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .milestone(proto::MilestoneRequest {})
            .await
            .map_err(map_status)?
            .into_inner();
        Ok(Milestone {
            proposer: address_from_bytes(&resp.proposer)?,
            start_block: resp.start_block,
            end_block: resp.end_block,
            hash: hash_from_bytes(&resp.hash)?,
            chain_id: resp.chain_id,
            milestone_id: resp.milestone_id,
            timestamp: resp.timestamp,
        })
    }

    async fn fetch_milestone_count(&self) -> OracleResult<u64> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .milestone_count(proto::CountRequest {})
            .await
            .map_err(map_status)?;
        Ok(resp.into_inner().count)
    }

    async fn fetch_no_ack_milestone(&self, milestone_id: &str) -> OracleResult<()> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .no_ack_milestone(proto::MilestoneIdRequest {
                id: milestone_id.to_string(),
            })
            .await
            .map_err(map_status)?;
        if resp.into_inner().in_list {
            Ok(())
        } else {
            Err(OracleError::NotInRejectedList(milestone_id.to_string()))
        }
    }

    async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .last_no_ack_milestone(proto::MilestoneRequest {})
            .await
            .map_err(map_status)?;
        Ok(resp.into_inner().id)
    }

    async fn fetch_milestone_id(&self, milestone_id: &str) -> OracleResult<()> {
        self.ensure_open()?;
        let resp = self
            .client
            .lock()
            .await
            .milestone_id(proto::MilestoneIdRequest {
                id: milestone_id.to_string(),
            })
            .await
            .map_err(map_status)?;
        if resp.into_inner().in_list {
            Ok(())
        } else {
            Err(OracleError::NotInMilestoneList(milestone_id.to_string()))
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
