//! JSON-RPC (HTTP) oracle variant.
//!
//! Unary reqwest client over the Iris REST surface. Wire DTOs are kept
//! local to this module; the trait returns domain types.

use crate::client::{OracleClient, LATEST_CHECKPOINT};
use crate::error::{OracleError, OracleResult, TransportCode};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;
use zena_types::{Address, Checkpoint, EventRecord, Hash, Milestone, OracleSpan, Span, Validator};

/// HTTP client to the Iris oracle.
pub struct IrisHttpClient {
    client: Client,
    base_url: String,
    state_fetch_limit: u64,
    closed: AtomicBool,
}

impl IrisHttpClient {
    pub fn new(base_url: impl Into<String>, state_fetch_limit: u64) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state_fetch_limit,
            closed: AtomicBool::new(false),
        })
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> OracleResult<R> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(OracleError::Closed);
        }
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "iris http request");

        let response = self.client.get(&url).send().await.map_err(map_reqwest)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(OracleError::Transport {
                code: TransportCode::NotFound,
                message: format!("{url}: not found"),
            }),
            status if !status.is_success() => Err(OracleError::Transport {
                code: TransportCode::Internal,
                message: format!("{url}: {status}"),
            }),
            _ => response
                .json::<R>()
                .await
                .map_err(|e| OracleError::Decode(e.to_string())),
        }
    }
}

fn map_reqwest(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout(Duration::from_secs(5))
    } else if err.is_connect() {
        OracleError::Unavailable(err.to_string())
    } else {
        OracleError::Transport {
            code: TransportCode::Unknown,
            message: err.to_string(),
        }
    }
}

// ---- wire DTOs --------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ResultEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct SpanDto {
    span_id: u64,
    start_block: u64,
    end_block: u64,
    validator_set: Vec<ValidatorDto>,
    selected_producers: Vec<ValidatorDto>,
    chain_id: String,
}

#[derive(Debug, Deserialize)]
struct ValidatorDto {
    #[serde(rename = "ID")]
    id: u64,
    power: u64,
    signer: String,
}

#[derive(Debug, Deserialize)]
struct CheckpointDto {
    proposer: String,
    start_block: u64,
    end_block: u64,
    root_hash: String,
    #[serde(rename = "zena_chain_id")]
    chain_id: String,
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct MilestoneDto {
    proposer: String,
    start_block: u64,
    end_block: u64,
    hash: String,
    #[serde(rename = "zena_chain_id")]
    chain_id: String,
    timestamp: u64,
    milestone_id: String,
}

#[derive(Debug, Deserialize)]
struct EventRecordDto {
    id: u64,
    contract: String,
    data: String,
    tx_hash: String,
    log_index: u64,
    #[serde(rename = "zena_chain_id")]
    chain_id: String,
    record_time: u64,
}

#[derive(Debug, Deserialize)]
struct CountDto {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct MilestoneIdDto {
    #[serde(rename = "result")]
    in_list: bool,
}

#[derive(Debug, Deserialize)]
struct LastNoAckDto {
    result: String,
}

fn parse_address(s: &str) -> OracleResult<Address> {
    let raw = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| OracleError::Decode(format!("bad address {s:?}: {e}")))?;
    if raw.len() != 20 {
        return Err(OracleError::Decode(format!("bad address length in {s:?}")));
    }
    Ok(Address::from_slice(&raw))
}

fn parse_hash(s: &str) -> OracleResult<Hash> {
    let raw = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| OracleError::Decode(format!("bad hash {s:?}: {e}")))?;
    if raw.len() != 32 {
        return Err(OracleError::Decode(format!("bad hash length in {s:?}")));
    }
    Ok(Hash::from_slice(&raw))
}

fn parse_bytes(s: &str) -> OracleResult<Vec<u8>> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| OracleError::Decode(format!("bad hex data: {e}")))
}

impl TryFrom<ValidatorDto> for Validator {
    type Error = OracleError;

    fn try_from(dto: ValidatorDto) -> OracleResult<Validator> {
        Ok(Validator::new(
            dto.id,
            parse_address(&dto.signer)?,
            dto.power as i64,
        ))
    }
}

impl TryFrom<SpanDto> for OracleSpan {
    type Error = OracleError;

    fn try_from(dto: SpanDto) -> OracleResult<OracleSpan> {
        Ok(OracleSpan {
            span: Span::new(dto.span_id, dto.start_block, dto.end_block),
            validators: dto
                .validator_set
                .into_iter()
                .map(Validator::try_from)
                .collect::<OracleResult<_>>()?,
            selected_producers: dto
                .selected_producers
                .into_iter()
                .map(Validator::try_from)
                .collect::<OracleResult<_>>()?,
            chain_id: dto.chain_id,
        })
    }
}

impl TryFrom<CheckpointDto> for Checkpoint {
    type Error = OracleError;

    fn try_from(dto: CheckpointDto) -> OracleResult<Checkpoint> {
        Ok(Checkpoint {
            proposer: parse_address(&dto.proposer)?,
            start_block: dto.start_block,
            end_block: dto.end_block,
            root_hash: parse_hash(&dto.root_hash)?,
            chain_id: dto.chain_id,
            timestamp: dto.timestamp,
        })
    }
}

impl TryFrom<MilestoneDto> for Milestone {
    type Error = OracleError;

    fn try_from(dto: MilestoneDto) -> OracleResult<Milestone> {
        Ok(Milestone {
            proposer: parse_address(&dto.proposer)?,
            start_block: dto.start_block,
            end_block: dto.end_block,
            hash: parse_hash(&dto.hash)?,
            chain_id: dto.chain_id,
            timestamp: dto.timestamp,
            milestone_id: dto.milestone_id,
        })
    }
}

impl TryFrom<EventRecordDto> for EventRecord {
    type Error = OracleError;

    fn try_from(dto: EventRecordDto) -> OracleResult<EventRecord> {
        Ok(EventRecord {
            id: dto.id,
            contract: parse_address(&dto.contract)?,
            data: parse_bytes(&dto.data)?,
            tx_hash: parse_hash(&dto.tx_hash)?,
            log_index: dto.log_index,
            chain_id: dto.chain_id,
            time: dto.record_time,
        })
    }
}

// ---- trait impl -------------------------------------------------------------

#[async_trait]
impl OracleClient for IrisHttpClient {
    async fn span(&self, id: u64) -> OracleResult<OracleSpan> {
        let envelope: ResultEnvelope<SpanDto> = self.get(&format!("/zena/span/{id}")).await?;
        envelope.result.try_into()
    }

    async fn state_sync_events(
        &self,
        from_id: u64,
        to_time: u64,
    ) -> OracleResult<Vec<EventRecord>> {
        let path = format!(
            "/clerk/event-record/list?from-id={from_id}&to-time={to_time}&limit={}",
            self.state_fetch_limit
        );
        let envelope: ResultEnvelope<Vec<EventRecordDto>> = match self.get(&path).await {
            Ok(envelope) => envelope,
            // An empty window is served as 404 by the oracle.
            Err(OracleError::Transport {
                code: TransportCode::NotFound,
                ..
            }) => return Ok(vec![]),
            Err(err) => return Err(err),
        };
        let mut events = envelope
            .result
            .into_iter()
            .map(EventRecord::try_from)
            .collect::<OracleResult<Vec<_>>>()?;
        events.sort_by_key(|e| e.id);
        Ok(events)
    }

    async fn fetch_checkpoint(&self, number: i64) -> OracleResult<Checkpoint> {
        let path = if number == LATEST_CHECKPOINT {
            "/checkpoints/latest".to_string()
        } else {
            format!("/checkpoints/{number}")
        };
        let envelope: ResultEnvelope<CheckpointDto> =
            self.get(&path).await.map_err(|err| match err {
                OracleError::Transport {
                    code: TransportCode::NotFound,
                    ..
                } => OracleError::CheckpointNotFound(number),
                other => other,
            })?;
        envelope.result.try_into()
    }

    async fn fetch_checkpoint_count(&self) -> OracleResult<u64> {
        let envelope: ResultEnvelope<CountDto> = self.get("/checkpoints/count").await?;
        Ok(envelope.result.count)
    }

    async fn fetch_milestone(&self) -> OracleResult<Milestone> {
        let envelope: ResultEnvelope<MilestoneDto> =
            self.get("/milestone/latest").await.map_err(|err| match err {
                OracleError::Transport {
                    code: TransportCode::NotFound,
                    ..
                } => OracleError::MilestoneNotFound,
                other => other,
            })?;
        envelope.result.try_into()
    }

    async fn fetch_milestone_count(&self) -> OracleResult<u64> {
        let envelope: ResultEnvelope<CountDto> = self.get("/milestone/count").await?;
        Ok(envelope.result.count)
    }

    async fn fetch_no_ack_milestone(&self, milestone_id: &str) -> OracleResult<()> {
        let envelope: ResultEnvelope<MilestoneIdDto> = self
            .get(&format!("/milestone/noAck/{milestone_id}"))
            .await?;
        if envelope.result.in_list {
            Ok(())
        } else {
            Err(OracleError::NotInRejectedList(milestone_id.to_string()))
        }
    }

    async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String> {
        let envelope: ResultEnvelope<LastNoAckDto> = self.get("/milestone/lastNoAck").await?;
        Ok(envelope.result.result)
    }

    async fn fetch_milestone_id(&self, milestone_id: &str) -> OracleResult<()> {
        let envelope: ResultEnvelope<MilestoneIdDto> =
            self.get(&format!("/milestone/ID/{milestone_id}")).await?;
        if envelope.result.in_list {
            Ok(())
        } else {
            Err(OracleError::NotInMilestoneList(milestone_id.to_string()))
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
