pub mod cache;
pub mod subgraph;

use ethers::types::Address;
use futures::future::join_all;
use log::{debug, info, warn};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::{
    constants::{BLOCKS_24H, SUBGRAPH_LEGACY_URL, SUBGRAPH_PRIMARY_URL},
    telemetry,
};

pub use cache::PriceCache;
pub use subgraph::{GraphqlResponse, HttpSubgraph, SubgraphEndpoint, SubgraphTransport};

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("subgraph request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("subgraph {endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("no subgraph endpoint reported a block number")]
    NoBlock,
}

/// Token price at one block, relative to PLS and USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    pub derived_pls: f64,
    pub derived_usd: f64,
    pub block: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceData {
    pub current: PriceSnapshot,
    pub previous: PriceSnapshot,
    pub pls_change_24h: f64,
    pub usd_change_24h: f64,
}

impl PriceData {
    pub fn between(current: PriceSnapshot, previous: PriceSnapshot) -> Self {
        Self {
            pls_change_24h: price_delta(current.derived_pls, previous.derived_pls),
            usd_change_24h: price_delta(current.derived_usd, previous.derived_usd),
            current,
            previous,
        }
    }
}

/// Percentage change from `previous` to `current`; 0 when `previous` is 0.
pub fn calculate_percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

// Either side being zero means the pair had no price, not a 100% move.
fn price_delta(current: f64, previous: f64) -> f64 {
    if current == 0.0 || previous == 0.0 {
        0.0
    } else {
        calculate_percentage_change(current, previous)
    }
}

pub fn default_endpoints() -> Vec<SubgraphEndpoint> {
    vec![
        SubgraphEndpoint::new("pulsexv2", SUBGRAPH_PRIMARY_URL),
        SubgraphEndpoint::new("pulsex", SUBGRAPH_LEGACY_URL),
    ]
}

/// Current and 24h-ago prices from the DEX subgraphs, primary first.
pub struct PriceService<T> {
    transport: Arc<T>,
    endpoints: Vec<SubgraphEndpoint>,
    blocks_24h: u64,
    cache: PriceCache,
}

impl<T: SubgraphTransport> PriceService<T> {
    pub fn new(
        transport: Arc<T>,
        endpoints: Vec<SubgraphEndpoint>,
        blocks_24h: u64,
        cache: PriceCache,
    ) -> Self {
        Self {
            transport,
            endpoints,
            blocks_24h,
            cache,
        }
    }

    pub fn with_defaults(transport: Arc<T>) -> Self {
        Self::new(
            transport,
            default_endpoints(),
            BLOCKS_24H,
            PriceCache::new(Duration::from_secs(60)),
        )
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Head block of the first endpoint that reports a positive one.
    pub async fn current_block(&self) -> Result<u64, PriceError> {
        for endpoint in &self.endpoints {
            match self.transport.query(endpoint, subgraph::meta_query()).await {
                Ok(response) => {
                    if let Some(block) = response.block_number() {
                        debug!("Subgraph {} at block {}", endpoint.label, block);
                        return Ok(block);
                    }
                    warn!("Subgraph {} reported no usable block", endpoint.label);
                }
                Err(e) => {
                    warn!("Subgraph {} block query failed: {}", endpoint.label, e);
                }
            }
            telemetry::record_endpoint_failure(&endpoint.label);
        }
        Err(PriceError::NoBlock)
    }

    pub async fn price_at_block(&self, token: Address, block: u64) -> Option<PriceSnapshot> {
        let query = subgraph::price_query(&format!("{:#x}", token), block);

        for endpoint in &self.endpoints {
            match self.transport.query(endpoint, &query).await {
                Ok(response) => {
                    if let Some(errors) = response.error_messages() {
                        warn!("Subgraph {} errors for {:?}: {}", endpoint.label, token, errors);
                    }
                    if let Some(snapshot) = response.price_snapshot(block) {
                        return Some(snapshot);
                    }
                    debug!(
                        "Subgraph {} has no price for {:?} at block {}",
                        endpoint.label, token, block
                    );
                }
                Err(e) => {
                    warn!("Subgraph {} price query failed: {}", endpoint.label, e);
                }
            }
            telemetry::record_endpoint_failure(&endpoint.label);
        }
        None
    }

    /// `None` when there is no current price or no block height.
    pub async fn fetch_token_price(&self, token: Address) -> Option<PriceData> {
        let current_block = match self.current_block().await {
            Ok(block) => block,
            Err(e) => {
                warn!("Price for {:?} unavailable: {}", token, e);
                telemetry::record_price_fetch(false);
                return None;
            }
        };
        let previous_block = current_block.saturating_sub(self.blocks_24h);

        let (current, previous) = tokio::join!(
            self.price_at_block(token, current_block),
            self.price_at_block(token, previous_block),
        );

        let Some(current) = current else {
            warn!("No current price for {:?} at block {}", token, current_block);
            telemetry::record_price_fetch(false);
            return None;
        };
        let previous = previous.unwrap_or_else(|| {
            debug!("No 24h price for {:?}, using current", token);
            current
        });

        telemetry::record_price_fetch(true);
        Some(PriceData::between(current, previous))
    }

    /// Serve from the cache while fresh, otherwise fetch and remember.
    pub async fn cached_price(&self, token: Address) -> Option<PriceData> {
        if let Some(data) = self.cache.get(&token) {
            return Some(data);
        }
        self.refresh_price(token).await
    }

    /// Fetch regardless of cache state; successful results are stored.
    pub async fn refresh_price(&self, token: Address) -> Option<PriceData> {
        let data = self.fetch_token_price(token).await?;
        info!(
            "{:?}: ${} ({:+.2}% 24h)",
            token, data.current.derived_usd, data.usd_change_24h
        );
        self.cache.insert(token, data.clone());
        Some(data)
    }

    /// One forced tick: refetch every token, however fresh its cached price.
    /// Returns how many tokens came back without a price.
    pub async fn refresh_all(&self, tokens: &[Address]) -> usize {
        let refreshed = join_all(tokens.iter().map(|token| self.refresh_price(*token))).await;
        refreshed.iter().filter(|p| p.is_none()).count()
    }
}
