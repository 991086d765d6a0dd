use anyhow::Result;
use ethers::{
    providers::{Http, Provider},
    types::Address,
};
use futures::future::join_all;
use log::{error, info, warn};
use std::{path::Path, sync::Arc, time::Instant};
use tokio::task::JoinSet;

use pulse_dash::{
    aggregator::Aggregator,
    chain::EthersChain,
    config::{load_token_list, DashboardConfig},
    constants::Env,
    dashboard::{render_table, DashboardState, Snapshot, TokenView},
    holders::ReqwestExplorer,
    price::{HttpSubgraph, PriceCache, PriceService},
    telemetry,
    tokens::TokenDescriptor,
    utils::setup_logger,
};

type Chain = EthersChain<Provider<Http>>;
type Prices = PriceService<HttpSubgraph>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let env = Env::new();
    setup_logger(&env.log_level)?;

    let config = DashboardConfig::from_env(&env)?;
    config.validate_all()?;

    if let Some(port) = config.metrics_port {
        telemetry::install_exporter(port)?;
        info!("Serving metrics on port {}", port);
    }

    let tokens = Arc::new(load_token_list(
        config.token_list_path.as_deref().map(Path::new),
    )?);
    info!("Tracking {} tokens", tokens.len());

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?;
    let chain: Arc<Chain> = Arc::new(EthersChain::new(Arc::new(provider)));
    let explorer = Arc::new(ReqwestExplorer::new(
        &config.explorer_url,
        config.request_timeout(),
    )?);
    let subgraph = Arc::new(HttpSubgraph::new(config.request_timeout())?);

    let aggregator = Arc::new(Aggregator::with_log_chunk_size(
        chain,
        explorer,
        config.holder_strategy,
        config.log_chunk_size,
    ));
    let prices = Arc::new(PriceService::new(
        subgraph,
        config.subgraph_endpoints(),
        config.blocks_24h,
        PriceCache::new(config.price_ttl()),
    ));
    let state = Arc::new(DashboardState::new());

    let mut set = JoinSet::new();
    spawn_token_refresh(
        &mut set,
        &config,
        aggregator,
        prices.clone(),
        state,
        tokens.clone(),
    );
    spawn_price_refresh(&mut set, &config, prices, tokens);

    tokio::select! {
        Some(res) = set.join_next() => {
            if let Err(e) = res {
                error!("Task error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
    set.shutdown().await;

    Ok(())
}

fn spawn_token_refresh(
    set: &mut JoinSet<()>,
    config: &DashboardConfig,
    aggregator: Arc<Aggregator<Chain, ReqwestExplorer>>,
    prices: Arc<Prices>,
    state: Arc<DashboardState>,
    tokens: Arc<Vec<TokenDescriptor>>,
) {
    let period = config.refresh_interval();
    set.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            // cycles run detached so a slow one never delays the next tick
            let cycle = state.begin_cycle();
            tokio::spawn(run_cycle(
                cycle,
                aggregator.clone(),
                prices.clone(),
                state.clone(),
                tokens.clone(),
            ));
        }
    });
}

async fn run_cycle(
    cycle: u64,
    aggregator: Arc<Aggregator<Chain, ReqwestExplorer>>,
    prices: Arc<Prices>,
    state: Arc<DashboardState>,
    tokens: Arc<Vec<TokenDescriptor>>,
) {
    let started = Instant::now();
    let result = aggregator.fetch_all(&tokens).await;
    telemetry::record_cycle(started.elapsed(), tokens.len());

    if !state.apply(cycle, result).await {
        return;
    }

    match state.snapshot().await {
        Snapshot::Ready { records, .. } => {
            let quotes = join_all(records.iter().map(|r| prices.cached_price(r.address))).await;
            let views: Vec<TokenView> = records
                .into_iter()
                .zip(quotes)
                .map(|(record, quote)| TokenView::new(record, quote.as_ref()))
                .collect();
            info!("Cycle {}\n{}", cycle, render_table(&views));
        }
        Snapshot::Failed { message, .. } => error!("Refresh failed: {}", message),
        Snapshot::Loading => {}
    }
}

/// Refetch every token's price on each forced tick, fresh or not.
fn spawn_price_refresh(
    set: &mut JoinSet<()>,
    config: &DashboardConfig,
    prices: Arc<Prices>,
    tokens: Arc<Vec<TokenDescriptor>>,
) {
    let period = config.price_force_refresh();
    set.spawn(async move {
        let addresses: Vec<Address> = tokens.iter().map(|t| t.address).collect();
        let mut ticker = tokio::time::interval(period);
        // the first token cycle fills the cache
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let missing = prices.refresh_all(&addresses).await;
            if missing > 0 {
                warn!("{} of {} price refreshes returned nothing", missing, addresses.len());
            }
        }
    });
}
