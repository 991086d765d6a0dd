pub mod estimate;
pub mod explorer;

use ethers::types::Address;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};

use crate::constants::DEFAULT_ESTIMATE_WINDOW;

pub use estimate::HolderEstimator;
pub use explorer::{ExplorerApi, ExplorerError, HolderListResponse, ReqwestExplorer, TokenCounters};

/// How the aggregator fills `TokenRecord::holders`. Strategies are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderStrategy {
    /// Distinct Transfer recipients over the last `window_blocks` blocks.
    Estimate { window_blocks: u64 },
    /// Explorer's holder counter.
    Explorer,
    Disabled,
}

impl Default for HolderStrategy {
    fn default() -> Self {
        HolderStrategy::Explorer
    }
}

impl FromStr for HolderStrategy {
    type Err = String;

    /// `explorer`, `disabled`, `estimate` or `estimate:<blocks>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.split_once(':') {
            Some(("estimate", window)) => window
                .parse::<u64>()
                .map(|window_blocks| HolderStrategy::Estimate { window_blocks })
                .map_err(|_| format!("invalid estimate window: {}", window)),
            Some(_) => Err(format!("unknown holder strategy: {}", s)),
            None => match s.as_str() {
                "explorer" => Ok(HolderStrategy::Explorer),
                "estimate" => Ok(HolderStrategy::Estimate {
                    window_blocks: DEFAULT_ESTIMATE_WINDOW,
                }),
                "disabled" | "none" | "off" => Ok(HolderStrategy::Disabled),
                other => Err(format!("unknown holder strategy: {}", other)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderEntry {
    pub address: String,
    /// Raw balance in the token's smallest unit.
    pub value: String,
}

/// One page of the explorer's holder list, in the explorer's own order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HolderPage {
    pub page: u32,
    pub offset: u32,
    pub holders: Vec<HolderEntry>,
    /// True iff the page came back full. Wrong when the holder total is an
    /// exact multiple of `offset`; the explorer offers no cheaper signal.
    pub has_more: bool,
}

impl HolderPage {
    fn empty(page: u32, offset: u32) -> Self {
        Self {
            page,
            offset,
            holders: Vec::new(),
            has_more: false,
        }
    }
}

/// Authoritative holder data from a chain explorer.
pub struct HolderService<E> {
    explorer: Arc<E>,
}

impl<E: ExplorerApi> HolderService<E> {
    pub fn new(explorer: Arc<E>) -> Self {
        Self { explorer }
    }

    /// `None` when the explorer is unreachable or returns an unusable counter.
    pub async fn holder_count(&self, token: Address) -> Option<u64> {
        let counters = match self.explorer.token_counters(token).await {
            Ok(counters) => counters,
            Err(e) => {
                warn!("Holder count for {:?} unavailable: {}", token, e);
                return None;
            }
        };

        match counters.token_holders_count.trim().parse::<u64>() {
            Ok(count) => {
                info!("Holder count for {:?}: {}", token, count);
                Some(count)
            }
            Err(_) => {
                warn!(
                    "Holder count for {:?} is not a number: {:?}",
                    token, counters.token_holders_count
                );
                None
            }
        }
    }

    /// Fetch page `page` (1-based) of `offset` holders. Failures yield an
    /// empty page with `has_more == false`.
    pub async fn holders(&self, token: Address, page: u32, offset: u32) -> HolderPage {
        let page = page.max(1);
        let offset = offset.max(1);

        let response = match self.explorer.token_holders(token, page, offset).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Holder page {} for {:?} unavailable: {}", page, token, e);
                return HolderPage::empty(page, offset);
            }
        };

        if response.status != "1" {
            warn!(
                "Holder page {} for {:?} rejected: {}",
                page, token, response.message
            );
            return HolderPage::empty(page, offset);
        }

        let holders: Vec<HolderEntry> = match serde_json::from_value(response.result) {
            Ok(holders) => holders,
            Err(e) => {
                warn!("Holder page {} for {:?} malformed: {}", page, token, e);
                return HolderPage::empty(page, offset);
            }
        };

        HolderPage {
            page,
            offset,
            has_more: holders.len() == offset as usize,
            holders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::explorer::MockExplorerApi;
    use super::*;
    use serde_json::json;

    fn holders_json(n: usize) -> serde_json::Value {
        let entries: Vec<_> = (0..n)
            .map(|i| json!({ "address": format!("0x{:040x}", i + 1), "value": "1000" }))
            .collect();
        serde_json::Value::Array(entries)
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("explorer".parse::<HolderStrategy>(), Ok(HolderStrategy::Explorer));
        assert_eq!("Disabled".parse::<HolderStrategy>(), Ok(HolderStrategy::Disabled));
        assert_eq!(
            "estimate".parse::<HolderStrategy>(),
            Ok(HolderStrategy::Estimate {
                window_blocks: DEFAULT_ESTIMATE_WINDOW
            })
        );
        assert_eq!(
            "estimate:500".parse::<HolderStrategy>(),
            Ok(HolderStrategy::Estimate { window_blocks: 500 })
        );
        assert!("estimate:abc".parse::<HolderStrategy>().is_err());
        assert!("bogus".parse::<HolderStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_zero_offset_is_clamped() {
        let mut explorer = MockExplorerApi::new();
        explorer
            .expect_token_holders()
            .withf(|_, page, offset| *page == 1 && *offset == 1)
            .times(1)
            .returning(|_, _, _| {
                Ok(HolderListResponse {
                    status: "1".to_string(),
                    message: "OK".to_string(),
                    result: holders_json(0),
                })
            });

        let service = HolderService::new(Arc::new(explorer));
        let page = service.holders(Address::zero(), 0, 0).await;
        assert_eq!(page.offset, 1);
        assert!(page.holders.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_full_page_has_more() {
        let mut explorer = MockExplorerApi::new();
        explorer.expect_token_holders().returning(|_, _, _| {
            Ok(HolderListResponse {
                status: "1".to_string(),
                message: "OK".to_string(),
                result: holders_json(10),
            })
        });

        let service = HolderService::new(Arc::new(explorer));
        let page = service.holders(Address::zero(), 1, 10).await;
        assert_eq!(page.holders.len(), 10);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_short_page_has_no_more() {
        let mut explorer = MockExplorerApi::new();
        explorer.expect_token_holders().returning(|_, _, _| {
            Ok(HolderListResponse {
                status: "1".to_string(),
                message: "OK".to_string(),
                result: holders_json(7),
            })
        });

        let service = HolderService::new(Arc::new(explorer));
        let page = service.holders(Address::zero(), 3, 10).await;
        assert_eq!(page.holders.len(), 7);
        assert_eq!(page.page, 3);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_error_status_yields_empty_page() {
        let mut explorer = MockExplorerApi::new();
        explorer.expect_token_holders().returning(|_, _, _| {
            Ok(HolderListResponse {
                status: "0".to_string(),
                message: "No token holders found".to_string(),
                result: serde_json::Value::Null,
            })
        });

        let service = HolderService::new(Arc::new(explorer));
        let page = service.holders(Address::zero(), 1, 10).await;
        assert!(page.holders.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_page_zero_is_treated_as_first() {
        let mut explorer = MockExplorerApi::new();
        explorer
            .expect_token_holders()
            .withf(|_, page, _| *page == 1)
            .returning(|_, _, _| Err(ExplorerError::Status(503)));

        let service = HolderService::new(Arc::new(explorer));
        let page = service.holders(Address::zero(), 0, 10).await;
        assert_eq!(page, HolderPage::empty(1, 10));
    }

    #[tokio::test]
    async fn test_holder_count() {
        let mut explorer = MockExplorerApi::new();
        explorer.expect_token_counters().returning(|_| {
            Ok(TokenCounters {
                token_holders_count: "1234".to_string(),
                transfers_count: "99".to_string(),
            })
        });

        let service = HolderService::new(Arc::new(explorer));
        assert_eq!(service.holder_count(Address::zero()).await, Some(1234));
    }

    #[tokio::test]
    async fn test_holder_count_failures_are_none() {
        let mut explorer = MockExplorerApi::new();
        explorer
            .expect_token_counters()
            .returning(|_| Err(ExplorerError::Status(500)));
        let service = HolderService::new(Arc::new(explorer));
        assert_eq!(service.holder_count(Address::zero()).await, None);

        let mut explorer = MockExplorerApi::new();
        explorer.expect_token_counters().returning(|_| {
            Ok(TokenCounters {
                token_holders_count: "n/a".to_string(),
                transfers_count: String::new(),
            })
        });
        let service = HolderService::new(Arc::new(explorer));
        assert_eq!(service.holder_count(Address::zero()).await, None);
    }
}
