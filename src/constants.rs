use ethers::types::{Address, H160, H256};

pub static PROJECT_NAME: &str = "pulse_dash";

pub const DEFAULT_RPC_URL: &str = "https://rpc.pulsechain.com";
pub const DEFAULT_EXPLORER_URL: &str = "https://api.scan.pulsechain.com";
pub const SUBGRAPH_PRIMARY_URL: &str =
    "https://graph.pulsechain.com/subgraphs/name/pulsechain/pulsexv2";
pub const SUBGRAPH_LEGACY_URL: &str =
    "https://graph.pulsechain.com/subgraphs/name/pulsechain/pulsex";

/// ~24 hours of 10 second blocks.
pub const BLOCKS_24H: u64 = 8640;

/// Prices below this are rendered in scientific notation.
pub const SCIENTIFIC_PRICE_THRESHOLD: f64 = 0.00000001;

pub const DEFAULT_DECIMALS: u8 = 18;
pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_SYMBOL: &str = "UNKNOWN";
/// 100 means the sell side pays the base fee, i.e. no multiplier.
pub const DEFAULT_SELL_MULTIPLIER: u32 = 100;

pub const DEFAULT_ESTIMATE_WINDOW: u64 = 10_000;
pub const DEFAULT_LOG_CHUNK_SIZE: u64 = 2_000;

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: H256 = H256([
    0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d, 0xaa,
    0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23, 0xb3, 0xef,
]);

const fn low_address(hi: u8, lo: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[18] = hi;
    bytes[19] = lo;
    H160(bytes)
}

/// Sinks with no known key: the zero address, 0x...dEaD and PulseChain's 0x...0369.
pub const DEAD_ADDRESSES: [Address; 3] = [
    low_address(0x00, 0x00),
    low_address(0xde, 0xad),
    low_address(0x03, 0x69),
];

pub fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct Env {
    pub rpc_url: String,
    pub explorer_url: String,
    pub subgraph_primary_url: String,
    pub subgraph_legacy_url: String,
    pub token_list_path: Option<String>,
    pub holder_strategy: String,
    pub refresh_secs: Option<u64>,
    pub metrics_port: Option<u16>,
    pub log_level: String,
}

impl Env {
    pub fn new() -> Self {
        Env {
            rpc_url: get_env("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            explorer_url: get_env("EXPLORER_URL")
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
            subgraph_primary_url: get_env("SUBGRAPH_PRIMARY_URL")
                .unwrap_or_else(|| SUBGRAPH_PRIMARY_URL.to_string()),
            subgraph_legacy_url: get_env("SUBGRAPH_LEGACY_URL")
                .unwrap_or_else(|| SUBGRAPH_LEGACY_URL.to_string()),
            token_list_path: get_env("TOKEN_LIST_PATH"),
            holder_strategy: get_env("HOLDER_STRATEGY").unwrap_or_else(|| "explorer".to_string()),
            refresh_secs: get_env("REFRESH_SECS").and_then(|v| v.parse().ok()),
            metrics_port: get_env("METRICS_PORT").and_then(|v| v.parse().ok()),
            log_level: get_env("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn dead_addresses_match_their_checksummed_form() {
        assert_eq!(DEAD_ADDRESSES[0], Address::zero());
        assert_eq!(
            DEAD_ADDRESSES[1],
            Address::from_str("0x000000000000000000000000000000000000dEaD").unwrap()
        );
        assert_eq!(
            DEAD_ADDRESSES[2],
            Address::from_str("0x0000000000000000000000000000000000000369").unwrap()
        );
    }

    #[test]
    fn transfer_topic_is_event_signature_hash() {
        let hash = ethers::utils::keccak256("Transfer(address,address,uint256)");
        assert_eq!(TRANSFER_TOPIC, H256::from(hash));
    }
}
