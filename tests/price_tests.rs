use async_trait::async_trait;
use ethers::types::Address;
use pulse_dash::{
    constants::BLOCKS_24H,
    format::{format_percentage_change, format_price},
    price::{
        subgraph::{Meta, MetaBlock, QueryData, TokenPriceFields},
        GraphqlResponse, PriceCache, PriceError, PriceService, SubgraphEndpoint, SubgraphTransport,
    },
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Primary deployment is down; the legacy one serves a fixed price history.
struct LegacyOnlySubgraph {
    head: u64,
    calls: Mutex<Vec<String>>,
}

impl LegacyOnlySubgraph {
    fn new(head: u64) -> Self {
        Self {
            head,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubgraphTransport for LegacyOnlySubgraph {
    async fn query(
        &self,
        endpoint: &SubgraphEndpoint,
        query: &str,
    ) -> Result<GraphqlResponse, PriceError> {
        self.calls.lock().unwrap().push(endpoint.label.clone());

        if endpoint.label == "pulsexv2" {
            return Err(PriceError::Status {
                endpoint: endpoint.label.clone(),
                status: 503,
            });
        }

        if query.contains("CurrentBlock") {
            return Ok(GraphqlResponse {
                data: Some(QueryData {
                    meta: Some(Meta {
                        block: Some(MetaBlock {
                            number: Some(self.head),
                        }),
                    }),
                    token: None,
                }),
                errors: None,
            });
        }

        let (pls, usd) = if query.contains(&format!("number: {}}}", self.head)) {
            ("0.03", "0.0001")
        } else {
            ("0.03", "0.00008")
        };
        Ok(GraphqlResponse {
            data: Some(QueryData {
                meta: None,
                token: Some(TokenPriceFields {
                    derived_pls: Some(pls.to_string()),
                    derived_usd: Some(usd.to_string()),
                }),
            }),
            errors: None,
        })
    }
}

fn endpoints() -> Vec<SubgraphEndpoint> {
    vec![
        SubgraphEndpoint::new("pulsexv2", "https://primary.invalid"),
        SubgraphEndpoint::new("pulsex", "https://legacy.invalid"),
    ]
}

fn service(transport: Arc<LegacyOnlySubgraph>) -> PriceService<LegacyOnlySubgraph> {
    PriceService::new(
        transport,
        endpoints(),
        BLOCKS_24H,
        PriceCache::new(Duration::from_secs(60)),
    )
}

#[test_log::test(tokio::test)]
async fn test_falls_back_to_legacy_subgraph() {
    let transport = Arc::new(LegacyOnlySubgraph::new(22_000_000));
    let prices = service(transport.clone());

    assert_eq!(prices.current_block().await.unwrap(), 22_000_000);
    assert_eq!(transport.calls(), vec!["pulsexv2", "pulsex"]);
}

#[test_log::test(tokio::test)]
async fn test_24h_change_from_legacy_history() {
    let transport = Arc::new(LegacyOnlySubgraph::new(22_000_000));
    let prices = service(transport.clone());

    let data = prices
        .fetch_token_price(Address::from_low_u64_be(1))
        .await
        .unwrap();

    assert_eq!(data.current.block, 22_000_000);
    assert_eq!(data.previous.block, 22_000_000 - BLOCKS_24H);
    assert_eq!(format_price(data.current.derived_usd), "0.00010000");
    assert_eq!(format_percentage_change(data.usd_change_24h), "+25.00%");
    assert_eq!(format_percentage_change(data.pls_change_24h), "+0.00%");

    // every query tried the primary first
    let calls = transport.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls.iter().filter(|c| *c == "pulsexv2").count(), 3);
}

#[test_log::test(tokio::test)]
async fn test_cached_price_is_reused() {
    let transport = Arc::new(LegacyOnlySubgraph::new(500_000));
    let prices = service(transport.clone());
    let token = Address::from_low_u64_be(7);

    let first = prices.cached_price(token).await;
    let calls_after_first = transport.calls().len();
    let second = prices.cached_price(token).await;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(transport.calls().len(), calls_after_first);
}
