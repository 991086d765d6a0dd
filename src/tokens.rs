use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DEFAULT_DECIMALS;

/// Which read interface a token contract exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContractInterface {
    /// ERC20 plus distributor, fee and sell multiplier getters.
    #[default]
    #[serde(alias = "TaxTokenABI")]
    TaxToken,
    /// Plain ERC20 metadata only.
    #[serde(alias = "ERC20")]
    Erc20,
}

impl ContractInterface {
    pub fn has_tax_fields(&self) -> bool {
        matches!(self, ContractInterface::TaxToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub symbol: String,
    pub address: String,
}

/// Static description of a token the dashboard tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub name: String,
    pub symbol: String,
    pub address: Address,
    #[serde(default, alias = "abiFile")]
    pub interface: ContractInterface,
    #[serde(default)]
    pub reward_token: Option<TokenRef>,
    #[serde(default)]
    pub wrapped_token: Option<TokenRef>,
    #[serde(default)]
    pub has_distributor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSchedule {
    pub distributor: Address,
    pub liquidity_tax: u32,
    pub reflection_tax: u32,
    pub dev_tax: u32,
    pub marketing_tax: u32,
    pub total_tax: u32,
    pub sell_multiplier: u32,
}

/// One refresh cycle's view of a token. Replaced wholesale every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub name: String,
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub total_supply: String,
    pub burned_supply: String,
    pub has_distributor: bool,
    pub taxes: Option<TaxSchedule>,
    pub holders: u64,
    pub reward_token: Option<String>,
    pub wrapped_token: Option<String>,
}

impl TokenRecord {
    /// Record published for a token whose fetch failed outright.
    pub fn fallback(descriptor: &TokenDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            symbol: descriptor.symbol.clone(),
            address: descriptor.address,
            decimals: DEFAULT_DECIMALS,
            total_supply: "0".to_string(),
            burned_supply: "0".to_string(),
            has_distributor: false,
            taxes: None,
            holders: 0,
            reward_token: descriptor.reward_token.as_ref().map(|t| t.symbol.clone()),
            wrapped_token: descriptor.wrapped_token.as_ref().map(|t| t.symbol.clone()),
        }
    }

    /// Lowercase 0x-prefixed hex, the form explorers and subgraphs key on.
    pub fn address_hex(&self) -> String {
        format!("{:#x}", self.address)
    }
}

pub fn default_token_list() -> Vec<TokenDescriptor> {
    let plsn = Address::from_str("0xf651e3978f1f6ec38a6da6014caa6aa07fbae453")
        .unwrap_or_else(|_| Address::zero());

    vec![TokenDescriptor {
        name: "PulseNet".to_string(),
        symbol: "PLSN".to_string(),
        address: plsn,
        interface: ContractInterface::TaxToken,
        // reward and wrapped contracts are not deployed yet
        reward_token: Some(TokenRef {
            symbol: "USDL".to_string(),
            address: String::new(),
        }),
        wrapped_token: Some(TokenRef {
            symbol: "wPLSN".to_string(),
            address: String::new(),
        }),
        has_distributor: true,
    }]
}
