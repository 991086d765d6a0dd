use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressCategory {
    #[serde(rename = "Token Holder")]
    TokenHolder,
    #[serde(rename = "Liquidity Pool")]
    LiquidityPool,
    #[serde(rename = "Smart Contract")]
    SmartContract,
    #[serde(rename = "Dev Wallet")]
    DevWallet,
    #[serde(rename = "Marketing Wallet")]
    MarketingWallet,
    #[serde(rename = "OA Address")]
    OriginAddress,
}

impl AddressCategory {
    pub const ALL: [AddressCategory; 6] = [
        AddressCategory::TokenHolder,
        AddressCategory::LiquidityPool,
        AddressCategory::SmartContract,
        AddressCategory::DevWallet,
        AddressCategory::MarketingWallet,
        AddressCategory::OriginAddress,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AddressCategory::TokenHolder => "Token Holder",
            AddressCategory::LiquidityPool => "Liquidity Pool",
            AddressCategory::SmartContract => "Smart Contract",
            AddressCategory::DevWallet => "Dev Wallet",
            AddressCategory::MarketingWallet => "Marketing Wallet",
            AddressCategory::OriginAddress => "OA Address",
        }
    }
}

impl fmt::Display for AddressCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AddressCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown address category: {}", s))
    }
}

/// Category implied by a tag set. Tags are matched exactly; the first
/// matching rule wins.
pub fn categorize_address<S: AsRef<str>>(tags: &[S]) -> AddressCategory {
    let has = |tag: &str| tags.iter().any(|t| t.as_ref() == tag);

    if has("OA") {
        AddressCategory::OriginAddress
    } else if has("LP") || has("liquidity") {
        AddressCategory::LiquidityPool
    } else if has("Team") || has("Developer") {
        AddressCategory::DevWallet
    } else if has("Marketing") {
        AddressCategory::MarketingWallet
    } else if has("Contract") || has("Reward Distributor") {
        AddressCategory::SmartContract
    } else {
        AddressCategory::TokenHolder
    }
}

/// Split a comma separated tag list, dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub id: u32,
    pub name: String,
    pub address: Address,
    pub tags: Vec<String>,
    pub category: AddressCategory,
}

impl AddressEntry {
    fn matches(&self, term: &str) -> bool {
        format!("{:#x}", self.address).contains(term)
            || self.name.to_lowercase().contains(term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(term))
    }
}

/// Known ecosystem addresses.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: Vec<AddressEntry>,
}

impl AddressBook {
    pub fn new(entries: Vec<AddressEntry>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        let mut book = Self::default();
        for (name, address, tags) in [
            (
                "Origin Address",
                "0xae87E12cA4C3022193bbB0Cb478f06758412DABa",
                &["OA", "wallet"][..],
            ),
            (
                "PLSN-PLS LP",
                "0xead0d2751d20c83d6ee36f6004f2aa17637809cf",
                &["LP", "liquidity", "PulseX LP", "PLSN", "PLS"][..],
            ),
        ] {
            if let Ok(address) = Address::from_str(address) {
                book.add(name, address, tags.iter().map(|t| t.to_string()).collect());
            }
        }
        book
    }

    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    /// Case-insensitive substring match on address, name or any tag; an
    /// empty term matches everything. `category` is a category label or
    /// `"all"`.
    pub fn search(&self, term: &str, category: &str) -> Vec<&AddressEntry> {
        let term = term.trim().to_lowercase();
        let category = if category.trim().eq_ignore_ascii_case("all") {
            None
        } else {
            Some(category.parse::<AddressCategory>().ok())
        };

        self.entries
            .iter()
            .filter(|entry| term.is_empty() || entry.matches(&term))
            .filter(|entry| match category {
                None => true,
                Some(wanted) => wanted == Some(entry.category),
            })
            .collect()
    }

    /// Append with the next free id; the category is derived from `tags`.
    pub fn add(&mut self, name: &str, address: Address, tags: Vec<String>) -> &AddressEntry {
        let id = self.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let category = categorize_address(&tags);
        self.entries.push(AddressEntry {
            id,
            name: name.to_string(),
            address,
            tags,
            category,
        });
        &self.entries[self.entries.len() - 1]
    }
}
