use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;
use url::Url;
use validator::{Validate, ValidationError};

use crate::{
    constants::{
        Env, BLOCKS_24H, DEFAULT_EXPLORER_URL, DEFAULT_LOG_CHUNK_SIZE,
        DEFAULT_RPC_URL, SUBGRAPH_LEGACY_URL, SUBGRAPH_PRIMARY_URL,
    },
    holders::HolderStrategy,
    price::SubgraphEndpoint,
    tokens::{default_token_list, TokenDescriptor},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read token list {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("token list {path} is not valid JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("token list {0} is empty")]
    Empty(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DashboardConfig {
    // Endpoints
    #[validate(custom = "validate_http_url")]
    pub rpc_url: String,
    #[validate(custom = "validate_http_url")]
    pub explorer_url: String,
    #[validate(custom = "validate_http_url")]
    pub subgraph_primary_url: String,
    #[validate(custom = "validate_http_url")]
    pub subgraph_legacy_url: String,

    // Price history
    #[validate(range(min = 1))]
    pub blocks_24h: u64,
    #[validate(range(min = 1, max = 3600))]
    pub price_ttl_secs: u64,
    #[validate(range(min = 1, max = 86400))]
    pub price_force_refresh_secs: u64,

    // Refresh cycle
    #[validate(range(min = 1, max = 86400))]
    pub refresh_secs: u64,
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    // Holders
    pub holder_strategy: HolderStrategy,
    #[validate(range(min = 1, max = 100000))]
    pub log_chunk_size: u64,

    pub token_list_path: Option<String>,
    pub metrics_port: Option<u16>,
    #[validate(custom = "validate_log_level")]
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            subgraph_primary_url: SUBGRAPH_PRIMARY_URL.to_string(),
            subgraph_legacy_url: SUBGRAPH_LEGACY_URL.to_string(),
            blocks_24h: BLOCKS_24H,
            price_ttl_secs: 60,
            price_force_refresh_secs: 300,
            refresh_secs: 300,
            request_timeout_secs: 15,
            holder_strategy: HolderStrategy::default(),
            log_chunk_size: DEFAULT_LOG_CHUNK_SIZE,
            token_list_path: None,
            metrics_port: None,
            log_level: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env(env: &Env) -> Result<Self> {
        let holder_strategy = env
            .holder_strategy
            .parse::<HolderStrategy>()
            .map_err(|e| anyhow!("HOLDER_STRATEGY: {}", e))?;

        let defaults = Self::default();
        Ok(Self {
            rpc_url: env.rpc_url.clone(),
            explorer_url: env.explorer_url.clone(),
            subgraph_primary_url: env.subgraph_primary_url.clone(),
            subgraph_legacy_url: env.subgraph_legacy_url.clone(),
            refresh_secs: env.refresh_secs.unwrap_or(defaults.refresh_secs),
            holder_strategy,
            token_list_path: env.token_list_path.clone(),
            metrics_port: env.metrics_port,
            log_level: env.log_level.clone(),
            ..defaults
        })
    }

    pub fn validate_all(&self) -> Result<()> {
        if let Err(e) = self.validate() {
            return Err(anyhow!("Configuration validation failed: {:?}", e));
        }

        self.validate_price_refresh()?;
        self.validate_holder_strategy()?;

        Ok(())
    }

    fn validate_price_refresh(&self) -> Result<()> {
        if self.price_force_refresh_secs < self.price_ttl_secs {
            return Err(anyhow!(
                "price_force_refresh_secs ({}) must not be shorter than price_ttl_secs ({})",
                self.price_force_refresh_secs,
                self.price_ttl_secs
            ));
        }
        Ok(())
    }

    fn validate_holder_strategy(&self) -> Result<()> {
        if let HolderStrategy::Estimate { window_blocks: 0 } = self.holder_strategy {
            return Err(anyhow!("holder estimate window must be at least one block"));
        }
        Ok(())
    }

    pub fn subgraph_endpoints(&self) -> Vec<SubgraphEndpoint> {
        vec![
            SubgraphEndpoint::new("pulsexv2", &self.subgraph_primary_url),
            SubgraphEndpoint::new("pulsex", &self.subgraph_legacy_url),
        ]
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn price_force_refresh(&self) -> Duration {
        Duration::from_secs(self.price_force_refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Tokens from a JSON array of descriptors, or the built-in list when no
/// path is configured.
pub fn load_token_list(path: Option<&Path>) -> Result<Vec<TokenDescriptor>, ConfigError> {
    let Some(path) = path else {
        return Ok(default_token_list());
    };
    let display = path.display().to_string();

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let tokens: Vec<TokenDescriptor> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: display.clone(),
            source,
        })?;

    if tokens.is_empty() {
        return Err(ConfigError::Empty(display));
    }
    Ok(tokens)
}

// Custom validators
fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("invalid_http_url")),
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "off" | "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}
