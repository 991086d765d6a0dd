use ethers::types::{Address, U256};
use log::{debug, warn};
use std::{future::Future, sync::Arc};

use super::{ChainError, FeeKind, TokenChain};
use crate::constants::{DEFAULT_DECIMALS, DEFAULT_NAME, DEFAULT_SELL_MULTIPLIER, DEFAULT_SYMBOL};
use crate::format::format_units;
use crate::tokens::TokenDescriptor;

/// Contract fields for one token after per-field defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFields {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply_raw: U256,
    /// `total_supply_raw` in the token's own decimals.
    pub total_supply: String,
    pub distributor: Address,
    pub liquidity_fee: u32,
    pub reflection_fee: u32,
    pub dev_fee: u32,
    pub marketing_fee: u32,
    pub total_fee: u32,
    pub sell_multiplier: u32,
}

pub struct ChainReader<C> {
    chain: Arc<C>,
}

impl<C: TokenChain> ChainReader<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    /// Read every field concurrently. Individual failures fall back to their
    /// defaults. The read fails only when the provider is unreachable or when
    /// none of the ERC20 reads succeed, i.e. there is no token contract.
    pub async fn read_fields(&self, descriptor: &TokenDescriptor) -> Result<TokenFields, ChainError> {
        let token = descriptor.address;
        let chain = &self.chain;

        let block = chain.block_number().await?;
        debug!("Reading {} ({:?}) at block {}", descriptor.symbol, token, block);

        let taxed = descriptor.interface.has_tax_fields();

        let (
            name,
            symbol,
            decimals,
            total_supply_raw,
            distributor,
            liquidity_fee,
            reflection_fee,
            dev_fee,
            marketing_fee,
            total_fee,
            sell_multiplier,
        ) = tokio::join!(
            chain.name(token),
            chain.symbol(token),
            chain.decimals(token),
            chain.total_supply(token),
            read_if(taxed, || chain.distributor(token), Address::zero()),
            read_if(taxed, || chain.fee(token, FeeKind::Liquidity), U256::zero()),
            read_if(taxed, || chain.fee(token, FeeKind::Reflection), U256::zero()),
            read_if(taxed, || chain.fee(token, FeeKind::Dev), U256::zero()),
            read_if(taxed, || chain.fee(token, FeeKind::Marketing), U256::zero()),
            read_if(taxed, || chain.fee(token, FeeKind::Total), U256::zero()),
            read_if(
                taxed,
                || chain.sell_multiplier(token),
                U256::from(DEFAULT_SELL_MULTIPLIER)
            ),
        );

        if let (Err(e), Err(_), Err(_), Err(_)) = (&name, &symbol, &decimals, &total_supply_raw) {
            return Err(e.clone());
        }

        let decimals = or_default(token, decimals, DEFAULT_DECIMALS);
        let total_supply_raw = or_default(token, total_supply_raw, U256::zero());

        Ok(TokenFields {
            name: or_default(token, name, DEFAULT_NAME.to_string()),
            symbol: or_default(token, symbol, DEFAULT_SYMBOL.to_string()),
            decimals,
            total_supply: format_units(total_supply_raw, decimals),
            total_supply_raw,
            distributor: or_default(token, distributor, Address::zero()),
            liquidity_fee: saturating_u32(or_default(token, liquidity_fee, U256::zero())),
            reflection_fee: saturating_u32(or_default(token, reflection_fee, U256::zero())),
            dev_fee: saturating_u32(or_default(token, dev_fee, U256::zero())),
            marketing_fee: saturating_u32(or_default(token, marketing_fee, U256::zero())),
            total_fee: saturating_u32(or_default(token, total_fee, U256::zero())),
            sell_multiplier: saturating_u32(or_default(
                token,
                sell_multiplier,
                U256::from(DEFAULT_SELL_MULTIPLIER),
            )),
        })
    }
}

fn or_default<T>(token: Address, read: Result<T, ChainError>, default: T) -> T {
    match read {
        Ok(value) => value,
        Err(e) => {
            warn!("{:?}: {}, using default", token, e);
            default
        }
    }
}

/// The read is never issued when `enabled` is false; `skipped` is used as is.
async fn read_if<T, R, F>(enabled: bool, read: R, skipped: T) -> Result<T, ChainError>
where
    R: FnOnce() -> F,
    F: Future<Output = Result<T, ChainError>>,
{
    if enabled {
        read().await
    } else {
        Ok(skipped)
    }
}

fn saturating_u32(value: U256) -> u32 {
    if value > U256::from(u32::MAX) {
        u32::MAX
    } else {
        value.as_u32()
    }
}
