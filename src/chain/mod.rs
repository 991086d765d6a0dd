pub mod burn;
pub mod reader;

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, Filter, Log, U256},
};
use std::{fmt::Display, sync::Arc};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::abi::TaxToken;
use crate::constants::TRANSFER_TOPIC;

pub use burn::BurnCalculator;
pub use reader::{ChainReader, TokenFields};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The provider itself could not be reached.
    #[error("rpc transport failed: {message}")]
    Transport { message: String },
    /// A single contract read failed or reverted.
    #[error("call to {method} failed: {message}")]
    Call { method: &'static str, message: String },
}

impl ChainError {
    pub fn transport(err: impl Display) -> Self {
        ChainError::Transport {
            message: err.to_string(),
        }
    }

    pub fn call(method: &'static str, err: impl Display) -> Self {
        ChainError::Call {
            method,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeKind {
    Liquidity,
    Reflection,
    Dev,
    Marketing,
    Total,
}

impl FeeKind {
    pub const ALL: [FeeKind; 5] = [
        FeeKind::Liquidity,
        FeeKind::Reflection,
        FeeKind::Dev,
        FeeKind::Marketing,
        FeeKind::Total,
    ];

    pub fn method(&self) -> &'static str {
        match self {
            FeeKind::Liquidity => "liquidityFee",
            FeeKind::Reflection => "reflectionFee",
            FeeKind::Dev => "devFee",
            FeeKind::Marketing => "marketingFee",
            FeeKind::Total => "totalFee",
        }
    }
}

/// Read-only view of token contracts on one chain.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenChain: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;
    async fn name(&self, token: Address) -> Result<String, ChainError>;
    async fn symbol(&self, token: Address) -> Result<String, ChainError>;
    async fn decimals(&self, token: Address) -> Result<u8, ChainError>;
    async fn total_supply(&self, token: Address) -> Result<U256, ChainError>;
    async fn distributor(&self, token: Address) -> Result<Address, ChainError>;
    async fn fee(&self, token: Address, kind: FeeKind) -> Result<U256, ChainError>;
    async fn sell_multiplier(&self, token: Address) -> Result<U256, ChainError>;
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError>;
    /// Transfer event logs emitted by `token` in `[from_block, to_block]`.
    async fn transfer_logs(
        &self,
        token: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainError>;
}

/// `TokenChain` backed by an ethers middleware stack.
#[derive(Debug)]
pub struct EthersChain<M> {
    client: Arc<M>,
}

impl<M: Middleware + 'static> EthersChain<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    fn contract(&self, token: Address) -> TaxToken<M> {
        TaxToken::new(token, self.client.clone())
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenChain for EthersChain<M> {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.client
            .get_block_number()
            .await
            .map(|n| n.as_u64())
            .map_err(ChainError::transport)
    }

    async fn name(&self, token: Address) -> Result<String, ChainError> {
        self.contract(token)
            .name()
            .call()
            .await
            .map_err(|e| ChainError::call("name", e))
    }

    async fn symbol(&self, token: Address) -> Result<String, ChainError> {
        self.contract(token)
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::call("symbol", e))
    }

    async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
        self.contract(token)
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::call("decimals", e))
    }

    async fn total_supply(&self, token: Address) -> Result<U256, ChainError> {
        self.contract(token)
            .total_supply()
            .call()
            .await
            .map_err(|e| ChainError::call("totalSupply", e))
    }

    async fn distributor(&self, token: Address) -> Result<Address, ChainError> {
        self.contract(token)
            .distributor()
            .call()
            .await
            .map_err(|e| ChainError::call("distributor", e))
    }

    async fn fee(&self, token: Address, kind: FeeKind) -> Result<U256, ChainError> {
        let contract = self.contract(token);
        let call = match kind {
            FeeKind::Liquidity => contract.liquidity_fee(),
            FeeKind::Reflection => contract.reflection_fee(),
            FeeKind::Dev => contract.dev_fee(),
            FeeKind::Marketing => contract.marketing_fee(),
            FeeKind::Total => contract.total_fee(),
        };
        call.call().await.map_err(|e| ChainError::call(kind.method(), e))
    }

    async fn sell_multiplier(&self, token: Address) -> Result<U256, ChainError> {
        self.contract(token)
            .sell_multiplier()
            .call()
            .await
            .map_err(|e| ChainError::call("sellMultiplier", e))
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError> {
        self.contract(token)
            .balance_of(holder)
            .call()
            .await
            .map_err(|e| ChainError::call("balanceOf", e))
    }

    async fn transfer_logs(
        &self,
        token: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ChainError> {
        let filter = Filter::new()
            .address(token)
            .topic0(TRANSFER_TOPIC)
            .from_block(from_block)
            .to_block(to_block);

        self.client
            .get_logs(&filter)
            .await
            .map_err(ChainError::transport)
    }
}
