use async_trait::async_trait;
use ethers::types::{Address, Log, U256};
use pulse_dash::{
    aggregator::Aggregator,
    chain::{ChainError, FeeKind, TokenChain},
    dashboard::{render_table, DashboardState, Snapshot, TokenView},
    holders::{ExplorerApi, ExplorerError, HolderListResponse, HolderStrategy, TokenCounters},
    tokens::{default_token_list, TokenDescriptor, TokenRecord},
};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

mod common {
    use super::*;

    /// Every token reports the same fields, except tokens in `broken`,
    /// which have no contract behind them.
    #[derive(Default)]
    pub struct FakeChain {
        pub broken: HashSet<Address>,
        pub probes: AtomicUsize,
    }

    impl FakeChain {
        pub fn healthy() -> Self {
            Self::default()
        }

        pub fn broken(tokens: &[Address]) -> Self {
            Self {
                broken: tokens.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn contract(&self, token: Address, method: &'static str) -> Result<(), ChainError> {
            if self.broken.contains(&token) {
                Err(ChainError::call(method, "no code at address"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TokenChain for FakeChain {
        async fn block_number(&self) -> Result<u64, ChainError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(21_000_000)
        }

        async fn name(&self, token: Address) -> Result<String, ChainError> {
            self.contract(token, "name")?;
            Ok("PulseNet".to_string())
        }

        async fn symbol(&self, token: Address) -> Result<String, ChainError> {
            self.contract(token, "symbol")?;
            Ok("PLSN".to_string())
        }

        async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
            self.contract(token, "decimals")?;
            Ok(18)
        }

        async fn total_supply(&self, token: Address) -> Result<U256, ChainError> {
            self.contract(token, "totalSupply")?;
            Ok(U256::exp10(21))
        }

        async fn distributor(&self, _token: Address) -> Result<Address, ChainError> {
            Ok(Address::from_low_u64_be(0xd157))
        }

        async fn fee(&self, _token: Address, kind: FeeKind) -> Result<U256, ChainError> {
            match kind {
                FeeKind::Total => Ok(U256::from(5)),
                FeeKind::Reflection => Err(ChainError::call(kind.method(), "execution reverted")),
                _ => Ok(U256::from(1)),
            }
        }

        async fn sell_multiplier(&self, _token: Address) -> Result<U256, ChainError> {
            Ok(U256::from(100))
        }

        async fn balance_of(&self, _token: Address, _holder: Address) -> Result<U256, ChainError> {
            Ok(U256::zero())
        }

        async fn transfer_logs(
            &self,
            _token: Address,
            _from_block: u64,
            _to_block: u64,
        ) -> Result<Vec<Log>, ChainError> {
            Ok(Vec::new())
        }
    }

    pub struct FakeExplorer;

    #[async_trait]
    impl ExplorerApi for FakeExplorer {
        async fn token_counters(&self, _token: Address) -> Result<TokenCounters, ExplorerError> {
            Ok(TokenCounters {
                token_holders_count: "1234".to_string(),
                transfers_count: "5678".to_string(),
            })
        }

        async fn token_holders(
            &self,
            _token: Address,
            _page: u32,
            _offset: u32,
        ) -> Result<HolderListResponse, ExplorerError> {
            Err(ExplorerError::Status(404))
        }
    }

    pub fn descriptors() -> Vec<TokenDescriptor> {
        let mut tokens = default_token_list();
        let mut second = tokens[0].clone();
        second.name = "Second".to_string();
        second.symbol = "SEC".to_string();
        second.address = Address::from_low_u64_be(0x5ec);
        second.has_distributor = false;
        tokens.push(second);
        tokens
    }
}

use common::{descriptors, FakeChain, FakeExplorer};

#[test_log::test(tokio::test)]
async fn test_record_from_chain_and_explorer() {
    let aggregator = Aggregator::new(
        Arc::new(FakeChain::healthy()),
        Arc::new(FakeExplorer),
        HolderStrategy::Explorer,
    );

    let record = aggregator.fetch_token(&descriptors()[0]).await.unwrap();
    assert_eq!(record.total_supply, "1000.0");
    assert_eq!(record.burned_supply, "0.0");
    assert_eq!(record.holders, 1234);
    assert!(record.has_distributor);

    let taxes = record.taxes.unwrap();
    assert_eq!(taxes.total_tax, 5);
    assert_eq!(taxes.reflection_tax, 0);
    assert_eq!(taxes.sell_multiplier, 100);
}

#[test_log::test(tokio::test)]
async fn test_one_failing_token_does_not_affect_others() {
    let tokens = descriptors();
    let chain = Arc::new(FakeChain::broken(&[tokens[0].address]));
    let aggregator = Arc::new(Aggregator::new(
        chain.clone(),
        Arc::new(FakeExplorer),
        HolderStrategy::Explorer,
    ));

    let records = aggregator.fetch_all(&tokens).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(chain.probes.load(Ordering::SeqCst), 2);

    assert_eq!(records[0], TokenRecord::fallback(&tokens[0]));
    assert_eq!(records[0].total_supply, "0");
    assert_eq!(records[0].decimals, 18);
    assert_eq!(records[0].reward_token.as_deref(), Some("USDL"));

    assert_eq!(records[1].address, tokens[1].address);
    assert_eq!(records[1].total_supply, "1000.0");
    assert_eq!(records[1].burned_supply, "0.0");
    assert_eq!(records[1].holders, 1234);
}

#[test_log::test(tokio::test)]
async fn test_cycle_publishes_table() {
    let tokens = descriptors();
    let aggregator = Arc::new(Aggregator::new(
        Arc::new(FakeChain::healthy()),
        Arc::new(FakeExplorer),
        HolderStrategy::Explorer,
    ));
    let state = DashboardState::new();

    let stale = state.begin_cycle();
    let fresh = state.begin_cycle();
    assert!(state.apply(fresh, aggregator.fetch_all(&tokens).await).await);
    assert!(!state.apply(stale, Ok(Vec::new())).await);

    let records = match state.snapshot().await {
        Snapshot::Ready { records, .. } => records,
        other => panic!("unexpected snapshot {:?}", other),
    };
    assert_eq!(records[0].symbol, "PLSN");
    assert!(records[0].has_distributor);
    assert!(!records[1].has_distributor);

    let views: Vec<TokenView> = records.into_iter().map(|r| TokenView::new(r, None)).collect();
    let table = render_table(&views);
    assert_eq!(table.matches("taxes:").count(), 1);
    assert!(table.contains("N/A"));
}
