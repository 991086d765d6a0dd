use log::{debug, info, warn};
use std::{
    fmt::Write,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::RwLock;

use crate::{
    aggregator::AggregatorError,
    format::{calculate_supply_owned, format_holder_balance, format_percentage_change, format_price},
    holders::{ExplorerApi, HolderPage, HolderService},
    price::PriceData,
    telemetry,
    tokens::TokenRecord,
};

const NOT_AVAILABLE: &str = "N/A";

/// What the dashboard currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Loading,
    Ready { cycle: u64, records: Vec<TokenRecord> },
    Failed { cycle: u64, message: String },
}

#[derive(Debug)]
struct Published {
    cycle: u64,
    snapshot: Snapshot,
}

/// Shared dashboard state. Every refresh takes a cycle number from
/// `begin_cycle`; results from a cycle older than the last applied one are
/// dropped so a slow refresh cannot overwrite a newer one.
#[derive(Debug)]
pub struct DashboardState {
    next_cycle: AtomicU64,
    published: RwLock<Published>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            next_cycle: AtomicU64::new(0),
            published: RwLock::new(Published {
                cycle: 0,
                snapshot: Snapshot::Loading,
            }),
        }
    }

    pub fn begin_cycle(&self) -> u64 {
        self.next_cycle.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish the outcome of `cycle`. Returns false if it was superseded.
    pub async fn apply(
        &self,
        cycle: u64,
        result: Result<Vec<TokenRecord>, AggregatorError>,
    ) -> bool {
        let mut published = self.published.write().await;
        if cycle <= published.cycle {
            debug!(
                "Dropping result of cycle {} (cycle {} already shown)",
                cycle, published.cycle
            );
            telemetry::record_stale_cycle();
            return false;
        }

        published.cycle = cycle;
        published.snapshot = match result {
            Ok(records) => {
                info!("Cycle {}: {} tokens", cycle, records.len());
                Snapshot::Ready { cycle, records }
            }
            Err(e) => {
                warn!("Cycle {} failed: {}", cycle, e);
                telemetry::record_cycle_failure();
                Snapshot::Failed {
                    cycle,
                    message: e.to_string(),
                }
            }
        };
        true
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.published.read().await.snapshot.clone()
    }
}

/// A token record with its price columns rendered for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenView {
    pub record: TokenRecord,
    pub price_usd: String,
    pub price_pls: String,
    pub usd_change_24h: String,
    pub pls_change_24h: String,
}

impl TokenView {
    pub fn new(record: TokenRecord, price: Option<&PriceData>) -> Self {
        match price {
            Some(price) => Self {
                price_usd: format_price(price.current.derived_usd),
                price_pls: format_price(price.current.derived_pls),
                usd_change_24h: format_percentage_change(price.usd_change_24h),
                pls_change_24h: format_percentage_change(price.pls_change_24h),
                record,
            },
            None => Self {
                record,
                price_usd: NOT_AVAILABLE.to_string(),
                price_pls: NOT_AVAILABLE.to_string(),
                usd_change_24h: NOT_AVAILABLE.to_string(),
                pls_change_24h: NOT_AVAILABLE.to_string(),
            },
        }
    }
}

/// Case-insensitive substring match on name, symbol or address.
pub fn filter_tokens<'a>(records: &'a [TokenRecord], term: &str) -> Vec<&'a TokenRecord> {
    let term = term.trim().to_lowercase();
    records
        .iter()
        .filter(|r| {
            term.is_empty()
                || r.name.to_lowercase().contains(&term)
                || r.symbol.to_lowercase().contains(&term)
                || r.address_hex().contains(&term)
        })
        .collect()
}

pub fn render_table(views: &[TokenView]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:>24} {:>20} {:>10} {:>14} {:>10} {:>10}",
        "SYMBOL", "SUPPLY", "BURNED", "HOLDERS", "USD", "24H", "PLS 24H"
    );

    for view in views {
        let record = &view.record;
        let _ = writeln!(
            out,
            "{:<8} {:>24} {:>20} {:>10} {:>14} {:>10} {:>10}",
            record.symbol,
            record.total_supply,
            record.burned_supply,
            record.holders,
            view.price_usd,
            view.usd_change_24h,
            view.pls_change_24h,
        );

        if let (true, Some(taxes)) = (record.has_distributor, record.taxes.as_ref()) {
            let _ = writeln!(
                out,
                "         taxes: liquidity {} reflection {} dev {} marketing {} total {} sell multiplier {}",
                taxes.liquidity_tax,
                taxes.reflection_tax,
                taxes.dev_tax,
                taxes.marketing_tax,
                taxes.total_tax,
                taxes.sell_multiplier,
            );
        }

        let extras: Vec<String> = [
            record.reward_token.as_ref().map(|s| format!("rewards {}", s)),
            record.wrapped_token.as_ref().map(|s| format!("wrapped {}", s)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !extras.is_empty() {
            let _ = writeln!(out, "         {}", extras.join(", "));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderRow {
    pub rank: u64,
    pub address: String,
    pub balance: String,
    /// Percentage of total supply, four decimals.
    pub supply_owned: String,
}

/// Page-by-page browsing of one token's holders.
pub struct HolderPager<E> {
    service: Arc<HolderService<E>>,
    record: TokenRecord,
    page_size: u32,
    current: HolderPage,
}

impl<E: ExplorerApi> HolderPager<E> {
    pub fn new(service: Arc<HolderService<E>>, record: TokenRecord, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            service,
            record,
            page_size,
            current: HolderPage {
                page: 1,
                offset: page_size,
                ..Default::default()
            },
        }
    }

    pub fn current(&self) -> &HolderPage {
        &self.current
    }

    pub async fn load(&mut self, page: u32) -> &HolderPage {
        self.current = self
            .service
            .holders(self.record.address, page.max(1), self.page_size)
            .await;
        &self.current
    }

    pub async fn next(&mut self) -> &HolderPage {
        let page = self.current.page.saturating_add(1);
        self.load(page).await
    }

    /// Stays put on the first page.
    pub async fn previous(&mut self) -> &HolderPage {
        if self.current.page <= 1 {
            return &self.current;
        }
        let page = self.current.page - 1;
        self.load(page).await
    }

    /// Jump to a user-entered page number; anything but a positive integer
    /// is ignored.
    pub async fn jump(&mut self, input: &str) -> &HolderPage {
        match input.trim().parse::<u32>() {
            Ok(page) if page > 0 => self.load(page).await,
            _ => &self.current,
        }
    }

    pub fn rows(&self) -> Vec<HolderRow> {
        let first_rank = (self.current.page.max(1) as u64 - 1) * self.page_size as u64;
        self.current
            .holders
            .iter()
            .enumerate()
            .map(|(i, holder)| HolderRow {
                rank: first_rank + i as u64 + 1,
                address: holder.address.clone(),
                balance: format_holder_balance(&holder.value, self.record.decimals),
                supply_owned: calculate_supply_owned(
                    &holder.value,
                    &self.record.total_supply,
                    self.record.decimals,
                ),
            })
            .collect()
    }
}
