//! Checkpoint/milestone whitelisting and oracle resilience.

#[cfg(test)]
mod tests {
    use crate::integration::support::MemChain;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use zena_oracle::{
        OracleClient, OracleConfig, OracleError, OracleResult, ResilientClient, TransportCode,
    };
    use zena_types::{Checkpoint, EventRecord, Milestone, OracleSpan};
    use zena_whitelist::{
        merkle_root, ChainReader, FinalityFetcher, WhitelistError, WhitelistGatekeeper,
    };

    fn fetcher_over(
        chain: Arc<MemChain>,
        oracle: Arc<zena_oracle::EmbeddedClient>,
    ) -> (FinalityFetcher, Arc<WhitelistGatekeeper>) {
        let gatekeeper = Arc::new(WhitelistGatekeeper::new());
        let fetcher = FinalityFetcher::new(
            oracle,
            gatekeeper.clone(),
            chain,
            Duration::from_millis(50),
        );
        (fetcher, gatekeeper)
    }

    #[tokio::test]
    async fn test_checkpoint_merkle_verification_installs_whitelist() {
        // Checkpoint over [1, 10] against a 12-block local chain.
        let chain = Arc::new(MemChain::up_to(12));
        let root = merkle_root(
            (1..=10)
                .map(|n| chain.hash_by_number(n).unwrap())
                .collect(),
        );
        let oracle = Arc::new(zena_oracle::EmbeddedClient::new());
        oracle.push_checkpoint(Checkpoint {
            start_block: 1,
            end_block: 10,
            root_hash: root,
            chain_id: "80002".to_string(),
            ..Default::default()
        });

        let (fetcher, gatekeeper) = fetcher_over(chain.clone(), oracle);
        fetcher.handle_checkpoint().await.unwrap();

        assert_eq!(
            gatekeeper.get_checkpoint(),
            Some((10, chain.hash_by_number(10).unwrap()))
        );
    }

    #[tokio::test]
    async fn test_vote_on_short_chain_needs_confirmation_block() {
        // End block 20 requires block 36 locally; the chain stops at 30.
        let chain = Arc::new(MemChain::up_to(30));
        let gatekeeper = WhitelistGatekeeper::new();
        let hash = chain.hash_by_number(20).unwrap();

        let err = gatekeeper
            .vote_on_hash(chain.as_ref(), 11, 20, hash, "m-20")
            .unwrap_err();
        assert!(matches!(
            err,
            WhitelistError::TipConfirmationBlock { number: 36 }
        ));
        assert!(gatekeeper.get_milestone().is_none());
    }

    /// Fails with a retryable transport error until `healthy` flips.
    struct FlappingOracle {
        healthy: AtomicBool,
        hits: AtomicU32,
    }

    impl FlappingOracle {
        fn new() -> Self {
            Self {
                healthy: AtomicBool::new(false),
                hits: AtomicU32::new(0),
            }
        }

        fn answer(&self) -> OracleResult<u64> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(7)
            } else {
                Err(OracleError::Transport {
                    code: TransportCode::Unavailable,
                    message: "connection refused".to_string(),
                })
            }
        }
    }

    #[async_trait]
    impl OracleClient for FlappingOracle {
        async fn span(&self, _id: u64) -> OracleResult<OracleSpan> {
            self.answer().map(|_| OracleSpan::default())
        }

        async fn state_sync_events(
            &self,
            _from_id: u64,
            _to_time: u64,
        ) -> OracleResult<Vec<EventRecord>> {
            self.answer().map(|_| Vec::new())
        }

        async fn fetch_checkpoint(&self, _number: i64) -> OracleResult<Checkpoint> {
            self.answer().map(|_| Checkpoint::default())
        }

        async fn fetch_checkpoint_count(&self) -> OracleResult<u64> {
            self.answer()
        }

        async fn fetch_milestone(&self) -> OracleResult<Milestone> {
            self.answer().map(|_| Milestone::default())
        }

        async fn fetch_milestone_count(&self) -> OracleResult<u64> {
            self.answer()
        }

        async fn fetch_no_ack_milestone(&self, _milestone_id: &str) -> OracleResult<()> {
            self.answer().map(|_| ())
        }

        async fn fetch_last_no_ack_milestone(&self) -> OracleResult<String> {
            self.answer().map(|_| String::new())
        }

        async fn fetch_milestone_id(&self, _milestone_id: &str) -> OracleResult<()> {
            self.answer().map(|_| ())
        }

        async fn close(&self) {}
    }

    fn breaker_config() -> OracleConfig {
        OracleConfig {
            max_attempts: 1,
            retry_backoff_secs: 0,
            circuit_breaker_threshold: 3,
            circuit_breaker_reset_secs: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_breaker_trips_then_recovers_through_half_open_probe() {
        let inner = Arc::new(FlappingOracle::new());
        let client = ResilientClient::new(inner.clone(), breaker_config());

        // Three straight failures trip the breaker.
        for _ in 0..3 {
            let err = client.fetch_milestone().await.unwrap_err();
            assert!(matches!(err, OracleError::Transport { .. }));
        }
        assert_eq!(inner.hits.load(Ordering::SeqCst), 3);

        // Open: the transport is not touched.
        let err = client.fetch_milestone().await.unwrap_err();
        assert!(matches!(err, OracleError::CircuitOpen));
        assert_eq!(inner.hits.load(Ordering::SeqCst), 3);

        // After the reset window a half-open probe goes through; success
        // closes the breaker again.
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        inner.healthy.store(true, Ordering::SeqCst);
        client.fetch_milestone().await.unwrap();
        client.fetch_milestone().await.unwrap();
        assert_eq!(inner.hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_milestone_pipeline_end_to_end() {
        // Fetch, verify, install, then prune after oracle rejection.
        let chain = Arc::new(MemChain::up_to(40));
        let oracle = Arc::new(zena_oracle::EmbeddedClient::new());
        oracle.push_milestone(Milestone {
            start_block: 17,
            end_block: 24,
            hash: chain.hash_by_number(24).unwrap(),
            milestone_id: "m-24".to_string(),
            chain_id: "80002".to_string(),
            ..Default::default()
        });

        let (fetcher, gatekeeper) = fetcher_over(chain.clone(), oracle.clone());
        fetcher.handle_milestone().await.unwrap();
        assert_eq!(
            gatekeeper.get_milestone(),
            Some((24, chain.hash_by_number(24).unwrap()))
        );
        assert!(gatekeeper.is_locked());

        oracle.reject_milestone("m-24");
        fetcher.prune_rejected_milestones().await;
        assert!(!gatekeeper.is_locked());

        // The downloader may now lock a later sprint.
        assert!(gatekeeper.lock_sprint(32));
    }
}
