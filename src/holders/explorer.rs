use async_trait::async_trait;
use ethers::types::Address;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("invalid explorer url: {0}")]
    Url(#[from] url::ParseError),
    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("explorer returned status {0}")]
    Status(u16),
}

/// `GET /api/v2/tokens/{address}/counters`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenCounters {
    #[serde(default)]
    pub token_holders_count: String,
    #[serde(default)]
    pub transfers_count: String,
}

/// `GET /api?module=token&action=getTokenHolders`
///
/// `result` is an array on success and a string or null otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct HolderListResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn token_counters(&self, token: Address) -> Result<TokenCounters, ExplorerError>;
    async fn token_holders(
        &self,
        token: Address,
        page: u32,
        offset: u32,
    ) -> Result<HolderListResponse, ExplorerError>;
}

/// Blockscout-style explorer over HTTPS.
#[derive(Debug, Clone)]
pub struct ReqwestExplorer {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestExplorer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExplorerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = Url::parse(base_url)?;
        // API paths are joined relative to the base, keeping any path prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    pub fn counters_url(&self, token: Address) -> Result<Url, ExplorerError> {
        Ok(self
            .base_url
            .join(&format!("api/v2/tokens/{:#x}/counters", token))?)
    }

    pub fn holders_url(&self, token: Address, page: u32, offset: u32) -> Result<Url, ExplorerError> {
        let mut url = self.base_url.join("api")?;
        url.query_pairs_mut()
            .append_pair("module", "token")
            .append_pair("action", "getTokenHolders")
            .append_pair("contractaddress", &format!("{:#x}", token))
            .append_pair("page", &page.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ExplorerError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ExplorerError::Status(response.status().as_u16()));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExplorerApi for ReqwestExplorer {
    async fn token_counters(&self, token: Address) -> Result<TokenCounters, ExplorerError> {
        let url = self.counters_url(token)?;
        self.get_json(url).await
    }

    async fn token_holders(
        &self,
        token: Address,
        page: u32,
        offset: u32,
    ) -> Result<HolderListResponse, ExplorerError> {
        let url = self.holders_url(token, page, offset)?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn explorer() -> ReqwestExplorer {
        ReqwestExplorer::new("https://api.scan.pulsechain.com", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_counters_url() {
        let token = Address::from_str("0xf651e3978f1f6ec38a6da6014caa6aa07fbae453").unwrap();
        let url = explorer().counters_url(token).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.scan.pulsechain.com/api/v2/tokens/0xf651e3978f1f6ec38a6da6014caa6aa07fbae453/counters"
        );
    }

    #[test]
    fn test_holders_url() {
        let token = Address::from_str("0xf651e3978f1f6ec38a6da6014caa6aa07fbae453").unwrap();
        let url = explorer().holders_url(token, 2, 10).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.scan.pulsechain.com/api?module=token&action=getTokenHolders\
             &contractaddress=0xf651e3978f1f6ec38a6da6014caa6aa07fbae453&page=2&offset=10"
        );
    }

    #[test]
    fn test_urls_keep_base_path_prefix() {
        let token = Address::from_low_u64_be(0xabc);
        let explorer =
            ReqwestExplorer::new("https://example.org/explorer", Duration::from_secs(5)).unwrap();

        assert_eq!(
            explorer.counters_url(token).unwrap().as_str(),
            format!("https://example.org/explorer/api/v2/tokens/{:#x}/counters", token)
        );
        assert!(explorer
            .holders_url(token, 1, 50)
            .unwrap()
            .as_str()
            .starts_with("https://example.org/explorer/api?module=token"));
    }

    #[test]
    fn test_holder_list_with_string_result() {
        let body = r#"{"status":"0","message":"No token holders found","result":null}"#;
        let parsed: HolderListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "0");
        assert!(parsed.result.is_null());
    }
}
