use ethers::types::Address;
use log::{error, info};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::{
    chain::{BurnCalculator, ChainError, ChainReader, TokenChain},
    constants::{DEAD_ADDRESSES, DEFAULT_LOG_CHUNK_SIZE},
    format::format_units,
    holders::{ExplorerApi, HolderEstimator, HolderService, HolderStrategy},
    telemetry,
    tokens::{TaxSchedule, TokenDescriptor, TokenRecord},
};

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("token task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

enum HolderSource<C, E> {
    Explorer(HolderService<E>),
    Estimate(HolderEstimator<C>),
    Disabled,
}

/// Builds one `TokenRecord` per configured token.
pub struct Aggregator<C, E> {
    reader: ChainReader<C>,
    burn: BurnCalculator<C>,
    holders: HolderSource<C, E>,
    dead_addresses: Vec<Address>,
}

impl<C, E> Aggregator<C, E>
where
    C: TokenChain + 'static,
    E: ExplorerApi + 'static,
{
    pub fn new(chain: Arc<C>, explorer: Arc<E>, strategy: HolderStrategy) -> Self {
        Self::with_log_chunk_size(chain, explorer, strategy, DEFAULT_LOG_CHUNK_SIZE)
    }

    pub fn with_log_chunk_size(
        chain: Arc<C>,
        explorer: Arc<E>,
        strategy: HolderStrategy,
        log_chunk_size: u64,
    ) -> Self {
        let holders = match strategy {
            HolderStrategy::Explorer => HolderSource::Explorer(HolderService::new(explorer)),
            HolderStrategy::Estimate { window_blocks } => HolderSource::Estimate(
                HolderEstimator::new(chain.clone(), window_blocks, log_chunk_size),
            ),
            HolderStrategy::Disabled => HolderSource::Disabled,
        };

        Self {
            reader: ChainReader::new(chain.clone()),
            burn: BurnCalculator::new(chain),
            holders,
            dead_addresses: DEAD_ADDRESSES.to_vec(),
        }
    }

    async fn holder_count(&self, token: Address) -> Option<u64> {
        match &self.holders {
            HolderSource::Explorer(service) => service.holder_count(token).await,
            HolderSource::Estimate(estimator) => estimator.estimate(token).await,
            HolderSource::Disabled => None,
        }
    }

    /// Contract fields, burned supply and holder count, fetched concurrently.
    pub async fn fetch_token(&self, descriptor: &TokenDescriptor) -> Result<TokenRecord, ChainError> {
        let token = descriptor.address;

        let (fields, burned_raw, holders) = tokio::join!(
            self.reader.read_fields(descriptor),
            self.burn.burned_supply_raw(token, &self.dead_addresses),
            self.holder_count(token),
        );
        let fields = fields?;

        let has_distributor = descriptor.has_distributor && !fields.distributor.is_zero();
        let taxes = has_distributor.then(|| TaxSchedule {
            distributor: fields.distributor,
            liquidity_tax: fields.liquidity_fee,
            reflection_tax: fields.reflection_fee,
            dev_tax: fields.dev_fee,
            marketing_tax: fields.marketing_fee,
            total_tax: fields.total_fee,
            sell_multiplier: fields.sell_multiplier,
        });

        Ok(TokenRecord {
            burned_supply: format_units(burned_raw, fields.decimals),
            name: fields.name,
            symbol: fields.symbol,
            address: token,
            decimals: fields.decimals,
            total_supply: fields.total_supply,
            has_distributor,
            taxes,
            holders: holders.unwrap_or(0),
            reward_token: descriptor.reward_token.as_ref().map(|t| t.symbol.clone()),
            wrapped_token: descriptor.wrapped_token.as_ref().map(|t| t.symbol.clone()),
        })
    }

    /// One task per token; a failed token becomes its fallback record. The
    /// result is in `descriptors` order.
    pub async fn fetch_all(
        self: &Arc<Self>,
        descriptors: &[TokenDescriptor],
    ) -> Result<Vec<TokenRecord>, AggregatorError> {
        let mut set = JoinSet::new();

        for (index, descriptor) in descriptors.iter().cloned().enumerate() {
            let aggregator = Arc::clone(self);
            set.spawn(async move {
                let record = match aggregator.fetch_token(&descriptor).await {
                    Ok(record) => record,
                    Err(e) => {
                        error!("Fetching {} failed, using fallback: {}", descriptor.symbol, e);
                        telemetry::record_token_fallback(&descriptor.symbol);
                        TokenRecord::fallback(&descriptor)
                    }
                };
                (index, record)
            });
        }

        let mut slots: Vec<Option<TokenRecord>> = vec![None; descriptors.len()];
        while let Some(joined) = set.join_next().await {
            let (index, record) = joined?;
            slots[index] = Some(record);
        }

        let records: Vec<TokenRecord> = slots.into_iter().flatten().collect();
        info!("Fetched {} token records", records.len());
        Ok(records)
    }
}
