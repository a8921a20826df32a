//! The proof-of-authority consensus engine.
//!
//! Per-block operations (`prepare`, `verify_header`, `finalize`, `seal`)
//! run on the caller's block-processing thread; only oracle traffic and the
//! sealing delay suspend. Header verification is pure and safe to run for
//! independent forks concurrently.

use crate::config::EngineConfig;
use crate::domain::signer::{recover_signer, Signer};
use crate::domain::BlockPhase;
use crate::error::{invalid_header, EngineError, EngineResult};
use crate::ports::outbound::EvmRunner;
use crate::spanner::Spanner;
use crate::state_sync::StateSyncCommitter;
use crate::system_caller::SystemCaller;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use zena_oracle::OracleClient;
use zena_types::{
    encode_extra, Address, Header, ValidatorSet, EXTRA_SEAL, EXTRA_VANITY,
};

pub struct ConsensusEngine<R: EvmRunner> {
    config: EngineConfig,
    oracle: Arc<dyn OracleClient>,
    spanner: Spanner<R>,
    committer: StateSyncCommitter<R>,
    signer: Option<Signer>,
}

impl<R: EvmRunner> ConsensusEngine<R> {
    pub fn new(
        config: EngineConfig,
        runner: Arc<R>,
        oracle: Arc<dyn OracleClient>,
        signer: Option<Signer>,
    ) -> Self {
        let spanner = Spanner::new(
            SystemCaller::new(runner.clone(), config.validator_contract),
            config.validator_contract,
        );
        let committer = StateSyncCommitter::new(
            SystemCaller::new(runner, config.validator_contract),
            config.state_receiver_contract,
        );
        Self {
            config,
            oracle,
            spanner,
            committer,
            signer,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Signer recovered from the seal suffix.
    pub fn author(&self, header: &Header) -> EngineResult<Address> {
        let seal = header
            .seal()
            .ok_or_else(|| invalid_header("extra-data too short for seal"))?;
        recover_signer(&header.seal_hash(self.config.chain_id), seal)
    }

    /// Validator set active for the block after `parent`, read on-chain.
    pub fn validator_set_at(&self, parent: &Header) -> EngineResult<ValidatorSet> {
        let validators = self
            .spanner
            .get_current_validators(parent, parent.number + 1)?;
        Ok(ValidatorSet::new(validators))
    }

    pub fn verify_header(&self, header: &Header, parent: &Header) -> EngineResult<()> {
        let number = header.number;
        if number != parent.number + 1 {
            return Err(invalid_header(format!(
                "block {number} does not extend parent {}",
                parent.number
            )));
        }
        if header.extra_data.len() < EXTRA_VANITY + EXTRA_SEAL {
            return Err(invalid_header("extra-data too short"));
        }

        let set = self.validator_set_at(parent)?;
        self.verify_extra_validators(header, parent, &set)?;

        if header.time < parent.time + self.config.producer_delay_at(number) {
            return Err(invalid_header(format!(
                "timestamp {} earlier than parent {} plus producer delay",
                header.time, parent.time
            )));
        }

        let signer = self.author(header)?;
        if !set.contains(&signer) {
            return Err(EngineError::UnauthorizedSigner { signer });
        }

        let expected = set
            .difficulty(&signer)
            .ok_or(EngineError::UnauthorizedSigner { signer })?;
        if header.difficulty != expected {
            return Err(EngineError::BadDifficulty {
                header: header.difficulty,
                expected,
            });
        }
        Ok(())
    }

    // Sprint-end headers must carry the next set byte-for-byte; any other
    // header carries nothing between vanity and seal.
    fn verify_extra_validators(
        &self,
        header: &Header,
        parent: &Header,
        _set: &ValidatorSet,
    ) -> EngineResult<()> {
        let body = header
            .extra_validator_bytes()
            .ok_or_else(|| invalid_header("extra-data too short"))?;

        if !self.config.is_sprint_end(header.number) {
            if !body.is_empty() {
                return Err(invalid_header(
                    "validator bytes outside a sprint-end block",
                ));
            }
            return Ok(());
        }

        let expected_set =
            ValidatorSet::new(self.spanner.get_current_validators(parent, header.number + 1)?);
        let expected: Vec<u8> = expected_set
            .validators()
            .iter()
            .flat_map(|v| v.header_bytes())
            .collect();
        if body != expected {
            return Err(invalid_header("sprint-end validator bytes mismatch"));
        }
        Ok(())
    }

    /// Fills difficulty, timestamp and extra-data for a block about to be
    /// produced on top of `parent`.
    pub fn prepare(&self, header: &mut Header, parent: &Header) -> EngineResult<()> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| EngineError::Seal("no sealing key configured".into()))?;
        let number = header.number;

        let set = self.validator_set_at(parent)?;
        let difficulty = set
            .difficulty(&signer.address())
            .ok_or(EngineError::UnauthorizedSigner {
                signer: signer.address(),
            })?;
        header.difficulty = difficulty;

        header.time = (parent.time + self.config.producer_delay_at(number)).max(unix_now());

        let validators = if self.config.is_sprint_end(number) {
            ValidatorSet::new(self.spanner.get_current_validators(parent, number + 1)?)
                .validators()
                .to_vec()
        } else {
            Vec::new()
        };
        header.extra_data = encode_extra(&[0u8; EXTRA_VANITY], &validators);

        debug!(number, difficulty, phase = ?BlockPhase::of(&self.config, number), "header prepared");
        Ok(())
    }

    /// Runs the span and sprint boundary hooks for a block being imported
    /// or produced. Contract-level failures are logged, never fatal; oracle
    /// and sequencing failures propagate.
    pub async fn finalize(&self, state: &mut R::State, header: &Header) -> EngineResult<()> {
        let number = header.number;
        if number == 0 {
            return Ok(());
        }

        if self.config.is_span_start(number) {
            self.commit_next_span(state, header).await?;
        }
        if self.config.is_sprint_start(number) {
            self.apply_state_sync(state, header).await?;
        }
        Ok(())
    }

    async fn commit_next_span(&self, state: &mut R::State, header: &Header) -> EngineResult<()> {
        let current = self.spanner.get_current_span(header)?;
        let next = self.oracle.span(current.id + 1).await?;
        if !current.is_followed_by(&next.span) {
            warn!(
                current = current.id,
                next = next.span.id,
                "oracle span does not extend the committed span"
            );
        }
        match self.spanner.commit_span(state, header, &next) {
            Ok(()) => Ok(()),
            Err(EngineError::SystemCall { contract, message }) => {
                warn!(%contract, message, "span commit failed in contract, continuing");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    async fn apply_state_sync(&self, state: &mut R::State, header: &Header) -> EngineResult<()> {
        let last_id = self.committer.last_state_id(header)?;
        let to_time = header
            .time
            .saturating_sub(self.config.producer_delay_at(header.number));
        let events = self.oracle.state_sync_events(last_id + 1, to_time).await?;
        if events.is_empty() {
            return Ok(());
        }
        match self.committer.commit_events(state, header, last_id, &events) {
            Ok(gas) => {
                info!(
                    count = events.len(),
                    total_gas = gas.iter().sum::<u64>(),
                    "state-sync window applied"
                );
                Ok(())
            }
            Err(EngineError::SystemCall { contract, message }) => {
                warn!(%contract, message, "state-sync commit failed in contract, continuing");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Signs and emits the header, honoring the out-of-turn delay. Returns
    /// without emitting when the stop channel fires first.
    pub async fn seal(
        &self,
        mut header: Header,
        parent: &Header,
        results: mpsc::Sender<Header>,
        mut stop: watch::Receiver<bool>,
    ) -> EngineResult<()> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| EngineError::Seal("no sealing key configured".into()))?;
        let set = self.validator_set_at(parent)?;
        if !set.contains(&signer.address()) {
            return Err(EngineError::UnauthorizedSigner {
                signer: signer.address(),
            });
        }

        let delay = self.seal_delay(&header, &set);
        debug!(number = header.number, delay_secs = delay.as_secs(), "waiting to seal");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop.changed() => {
                debug!(number = header.number, "seal aborted by stop signal");
                return Ok(());
            }
        }

        let seal = signer.sign_hash(&header.seal_hash(self.config.chain_id))?;
        let len = header.extra_data.len();
        if len < EXTRA_SEAL {
            return Err(EngineError::Seal("extra-data missing seal placeholder".into()));
        }
        header.extra_data[len - EXTRA_SEAL..].copy_from_slice(&seal);

        info!(number = header.number, hash = %header.hash(), "block sealed");
        if results.send(header).await.is_err() {
            warn!("seal result receiver dropped");
        }
        Ok(())
    }

    // In-turn signers wait only until the header timestamp; everyone else
    // adds a rank-proportional backoff so the in-turn block wins races.
    fn seal_delay(&self, header: &Header, set: &ValidatorSet) -> Duration {
        let mut delay = header.time.saturating_sub(unix_now());
        let max_difficulty = set.len() as u64;
        if header.difficulty < max_difficulty {
            let rank = max_difficulty - header.difficulty;
            delay += rank * self.config.backup_multiplier_at(header.number);
        }
        Duration::from_secs(delay)
    }

    /// Difficulty the local signer would produce with.
    pub fn calc_difficulty(&self, set: &ValidatorSet) -> EngineResult<u64> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| EngineError::Seal("no sealing key configured".into()))?;
        set.difficulty(&signer.address())
            .ok_or(EngineError::UnauthorizedSigner {
                signer: signer.address(),
            })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi;
    use crate::testutil::ScriptedRunner;
    use primitive_types::U256;
    use zena_oracle::EmbeddedClient;
    use zena_types::{OracleSpan, Span, Validator};

    const FAR_FUTURE: u64 = 4_000_000_000;

    fn word(value: u64) -> Vec<u8> {
        let mut out = [0u8; 32];
        U256::from(value).to_big_endian(&mut out);
        out.to_vec()
    }

    fn legacy_return(entries: &[(Address, u64)]) -> Vec<u8> {
        let mut data = word(64);
        data.extend(word(64 + 32 + 32 * entries.len() as u64));
        data.extend(word(entries.len() as u64));
        for (address, _) in entries {
            let mut w = vec![0u8; 32];
            w[12..].copy_from_slice(address.as_bytes());
            data.extend(w);
        }
        data.extend(word(entries.len() as u64));
        for (_, power) in entries {
            data.extend(word(*power));
        }
        data
    }

    // One validator_set_at costs two scripted calls: the legacy tuple
    // succeeds, the producers path fails over to it.
    fn set_lookup(entries: &[(Address, u64)]) -> Vec<crate::ports::outbound::CallOutcome> {
        vec![
            ScriptedRunner::success(legacy_return(entries)),
            ScriptedRunner::failure("producers mapping absent"),
        ]
    }

    fn engine(
        outcomes: Vec<crate::ports::outbound::CallOutcome>,
        oracle: Arc<EmbeddedClient>,
        signer: Option<Signer>,
    ) -> (ConsensusEngine<ScriptedRunner>, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new(outcomes));
        let engine = ConsensusEngine::new(EngineConfig::default(), runner.clone(), oracle, signer);
        (engine, runner)
    }

    fn parent_at(number: u64) -> Header {
        Header {
            number,
            time: FAR_FUTURE,
            ..Default::default()
        }
    }

    fn local_signer() -> Signer {
        Signer::from_secret_bytes(&[0x5a; 32]).unwrap()
    }

    #[test]
    fn test_prepare_interior_block() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(
            set_lookup(&[(address, 10)]),
            Arc::new(EmbeddedClient::new()),
            Some(signer),
        );

        let parent = parent_at(4);
        let mut header = Header {
            number: 5,
            ..Default::default()
        };
        engine.prepare(&mut header, &parent).unwrap();

        assert_eq!(header.difficulty, 1);
        assert_eq!(header.extra_data.len(), EXTRA_VANITY + EXTRA_SEAL);
        assert!(header.time >= parent.time + 4);
    }

    #[test]
    fn test_prepare_sprint_end_carries_validator_bytes() {
        let signer = local_signer();
        let address = signer.address();
        let mut script = set_lookup(&[(address, 10)]);
        script.extend(set_lookup(&[(address, 10)]));
        let (engine, _) = engine(script, Arc::new(EmbeddedClient::new()), Some(signer));

        let mut header = Header {
            number: 3,
            ..Default::default()
        };
        engine.prepare(&mut header, &parent_at(2)).unwrap();

        let body = header.extra_validator_bytes().unwrap();
        assert_eq!(body.len(), 40);
        assert_eq!(&body[..20], address.as_bytes());
    }

    #[test]
    fn test_prepare_refuses_outside_validator_set() {
        let signer = local_signer();
        let (engine, _) = engine(
            set_lookup(&[(Address::repeat_byte(0xbb), 10)]),
            Arc::new(EmbeddedClient::new()),
            Some(signer),
        );

        let mut header = Header {
            number: 5,
            ..Default::default()
        };
        assert!(matches!(
            engine.prepare(&mut header, &parent_at(4)),
            Err(EngineError::UnauthorizedSigner { .. })
        ));
    }

    fn sealed_header(engine: &ConsensusEngine<ScriptedRunner>, signer: &Signer, parent: &Header) -> Header {
        let mut header = Header {
            number: parent.number + 1,
            time: parent.time + 4,
            difficulty: 1,
            extra_data: encode_extra(&[0u8; EXTRA_VANITY], &[]),
            ..Default::default()
        };
        let seal = signer
            .sign_hash(&header.seal_hash(engine.config().chain_id))
            .unwrap();
        let len = header.extra_data.len();
        header.extra_data[len - EXTRA_SEAL..].copy_from_slice(&seal);
        header
    }

    #[test]
    fn test_verify_header_accepts_in_turn_block() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(
            set_lookup(&[(address, 10)]),
            Arc::new(EmbeddedClient::new()),
            None,
        );

        let parent = parent_at(4);
        let header = sealed_header(&engine, &signer, &parent);
        engine.verify_header(&header, &parent).unwrap();
    }

    #[test]
    fn test_verify_header_rejects_wrong_difficulty() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(
            set_lookup(&[(address, 10)]),
            Arc::new(EmbeddedClient::new()),
            None,
        );

        let parent = parent_at(4);
        let mut header = sealed_header(&engine, &signer, &parent);
        header.difficulty = 7;
        // Re-seal after mutating the signed fields.
        let seal = signer.sign_hash(&header.seal_hash(80002)).unwrap();
        let len = header.extra_data.len();
        header.extra_data[len - EXTRA_SEAL..].copy_from_slice(&seal);

        assert!(matches!(
            engine.verify_header(&header, &parent),
            Err(EngineError::BadDifficulty {
                header: 7,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_verify_header_rejects_unknown_signer() {
        let signer = local_signer();
        let (engine, _) = engine(
            set_lookup(&[(Address::repeat_byte(0xbb), 10)]),
            Arc::new(EmbeddedClient::new()),
            None,
        );

        let parent = parent_at(4);
        let header = sealed_header(&engine, &signer, &parent);
        assert!(matches!(
            engine.verify_header(&header, &parent),
            Err(EngineError::UnauthorizedSigner { .. })
        ));
    }

    #[test]
    fn test_verify_header_rejects_early_timestamp() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(
            set_lookup(&[(address, 10)]),
            Arc::new(EmbeddedClient::new()),
            None,
        );

        let parent = parent_at(4);
        let mut header = sealed_header(&engine, &signer, &parent);
        header.time = parent.time + 1;
        let seal = signer.sign_hash(&header.seal_hash(80002)).unwrap();
        let len = header.extra_data.len();
        header.extra_data[len - EXTRA_SEAL..].copy_from_slice(&seal);

        assert!(matches!(
            engine.verify_header(&header, &parent),
            Err(EngineError::InvalidHeader { .. })
        ));
    }

    #[tokio::test]
    async fn test_finalize_commits_next_span() {
        // Block 8 starts span 1; the engine fetches it from the oracle and
        // commits the handed-over validator set.
        let oracle = Arc::new(EmbeddedClient::new());
        oracle.insert_span(OracleSpan {
            span: Span::new(1, 8, 15),
            validators: vec![Validator::new(2, Address::repeat_byte(0xbb), 5)],
            selected_producers: vec![Validator::new(2, Address::repeat_byte(0xbb), 5)],
            chain_id: "80002".to_string(),
        });

        let mut current_span = word(0);
        current_span.extend(word(0));
        current_span.extend(word(7));
        let script = vec![
            ScriptedRunner::success(current_span),
            ScriptedRunner::success(vec![]),
            // Block 8 is also a sprint start; lastStateId answers the
            // state-sync probe and the oracle has no events.
            ScriptedRunner::success(word(0)),
        ];
        let (engine, runner) = engine(script, oracle, None);

        let header = Header {
            number: 8,
            time: FAR_FUTURE,
            ..Default::default()
        };
        engine.finalize(&mut (), &header).await.unwrap();

        let calls = runner.calls.lock();
        assert_eq!(calls.len(), 3);
        let commit_selector = abi::selector("commitSpan(uint256,uint256,uint256,bytes,bytes)");
        assert_eq!(&calls[1].data[..4], &commit_selector);
        let expected_rlp = rlp::encode_list::<Validator, _>(&[Validator::new(
            2,
            Address::repeat_byte(0xbb),
            5,
        )]);
        assert!(calls[1]
            .data
            .windows(expected_rlp.len())
            .any(|w| w == &expected_rlp[..]));
    }

    #[tokio::test]
    async fn test_finalize_drains_state_sync_window() {
        // Sprint start at block 4 drains ids 1..=3 from the oracle.
        let oracle = Arc::new(EmbeddedClient::new());
        for id in 1..=3u64 {
            oracle.insert_event(zena_types::EventRecord {
                id,
                time: FAR_FUTURE - 100,
                chain_id: "80002".to_string(),
                ..Default::default()
            });
        }

        let script = vec![
            ScriptedRunner::success(word(0)),
            ScriptedRunner::success(vec![1]),
            ScriptedRunner::success(vec![1]),
            ScriptedRunner::success(vec![1]),
        ];
        let (engine, runner) = engine(script, oracle, None);

        let header = Header {
            number: 4,
            time: FAR_FUTURE,
            ..Default::default()
        };
        engine.finalize(&mut (), &header).await.unwrap();

        let calls = runner.calls.lock();
        assert_eq!(calls.len(), 4);
        let commit_selector = abi::selector("commitState(uint256,bytes)");
        for call in &calls[1..] {
            assert_eq!(&call.data[..4], &commit_selector);
            assert_eq!(call.to, engine.config().state_receiver_contract);
        }
    }

    #[tokio::test]
    async fn test_finalize_skips_interior_blocks() {
        let (engine, runner) = engine(vec![], Arc::new(EmbeddedClient::new()), None);
        let header = Header {
            number: 5,
            time: FAR_FUTURE,
            ..Default::default()
        };
        engine.finalize(&mut (), &header).await.unwrap();
        assert!(runner.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_seal_emits_recoverable_header() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(
            set_lookup(&[(address, 10)]),
            Arc::new(EmbeddedClient::new()),
            Some(signer),
        );

        let parent = parent_at(4);
        let header = Header {
            number: 5,
            time: 0, // already due, no wait
            difficulty: 1,
            extra_data: encode_extra(&[0u8; EXTRA_VANITY], &[]),
            ..Default::default()
        };

        let (tx, mut rx) = mpsc::channel(1);
        let (_stop_tx, stop_rx) = watch::channel(false);
        engine.seal(header, &parent, tx, stop_rx).await.unwrap();

        let sealed = rx.recv().await.unwrap();
        assert_eq!(engine.author(&sealed).unwrap(), address);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seal_stop_channel_cancels() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(
            set_lookup(&[(address, 10)]),
            Arc::new(EmbeddedClient::new()),
            Some(signer),
        );

        let parent = parent_at(4);
        let header = Header {
            number: 5,
            time: u64::MAX / 2, // far in the future
            difficulty: 1,
            extra_data: encode_extra(&[0u8; EXTRA_VANITY], &[]),
            ..Default::default()
        };

        let (tx, mut rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).unwrap();

        engine.seal(header, &parent, tx, stop_rx).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_calc_difficulty_uses_local_signer() {
        let signer = local_signer();
        let address = signer.address();
        let (engine, _) = engine(vec![], Arc::new(EmbeddedClient::new()), Some(signer));

        let set = ValidatorSet::new(vec![
            Validator::new(1, address, 10),
            Validator::new(2, Address::repeat_byte(0xbb), 10),
        ]);
        let difficulty = engine.calc_difficulty(&set).unwrap();
        assert!(difficulty >= 1 && difficulty <= 2);
    }
}
