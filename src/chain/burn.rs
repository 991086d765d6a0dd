use ethers::types::{Address, U256};
use futures::future::join_all;
use log::warn;
use std::sync::Arc;

use super::TokenChain;
use crate::format::format_units;

/// Sums token balances parked at dead addresses.
pub struct BurnCalculator<C> {
    chain: Arc<C>,
}

impl<C: TokenChain> BurnCalculator<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    /// Raw burned amount. A failed balance read counts as zero.
    pub async fn burned_supply_raw(&self, token: Address, dead: &[Address]) -> U256 {
        let reads = dead.iter().map(|holder| async move {
            match self.chain.balance_of(token, *holder).await {
                Ok(balance) => balance,
                Err(e) => {
                    warn!("Burn balance of {:?} at {:?} unavailable: {}", token, holder, e);
                    U256::zero()
                }
            }
        });

        join_all(reads)
            .await
            .into_iter()
            .fold(U256::zero(), |sum, balance| sum.saturating_add(balance))
    }

    pub async fn burned_supply(&self, token: Address, decimals: u8, dead: &[Address]) -> String {
        let raw = self.burned_supply_raw(token, dead).await;
        format_units(raw, decimals)
    }
}
