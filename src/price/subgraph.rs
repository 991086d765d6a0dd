use async_trait::async_trait;
use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use super::{PriceError, PriceSnapshot};

/// A subgraph deployment, tried in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphEndpoint {
    pub label: String,
    pub url: String,
}

impl SubgraphEndpoint {
    pub fn new(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlResponse {
    pub data: Option<QueryData>,
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryData {
    #[serde(rename = "_meta")]
    pub meta: Option<Meta>,
    pub token: Option<TokenPriceFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub block: Option<MetaBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaBlock {
    pub number: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPriceFields {
    #[serde(rename = "derivedPLS")]
    pub derived_pls: Option<String>,
    #[serde(rename = "derivedUSD")]
    pub derived_usd: Option<String>,
}

impl GraphqlResponse {
    /// Indexed head block, if the response carries a usable (non-zero) one.
    pub fn block_number(&self) -> Option<u64> {
        self.data
            .as_ref()?
            .meta
            .as_ref()?
            .block
            .as_ref()?
            .number
            .filter(|n| *n > 0)
    }

    /// Both derived prices must be present and numeric.
    pub fn price_snapshot(&self, block: u64) -> Option<PriceSnapshot> {
        let token = self.data.as_ref()?.token.as_ref()?;
        let derived_pls = token.derived_pls.as_deref()?.trim().parse::<f64>().ok()?;
        let derived_usd = token.derived_usd.as_deref()?.trim().parse::<f64>().ok()?;
        Some(PriceSnapshot {
            derived_pls,
            derived_usd,
            block,
        })
    }

    pub fn error_messages(&self) -> Option<String> {
        let errors = self.errors.as_ref().filter(|e| !e.is_empty())?;
        Some(
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

pub fn meta_query() -> &'static str {
    indoc! {"
        query CurrentBlock {
          _meta {
            block {
              number
            }
          }
        }
    "}
}

/// `token_id` must be the lowercase hex address; subgraph ids are lowercase.
pub fn price_query(token_id: &str, block: u64) -> String {
    formatdoc! {r#"
        query TokenPrice {{
          _meta {{
            block {{
              number
            }}
          }}
          token(id: "{token_id}", block: {{number: {block}}}) {{
            derivedPLS
            derivedUSD
          }}
        }}
    "#, token_id = token_id, block = block}
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubgraphTransport: Send + Sync {
    async fn query(
        &self,
        endpoint: &SubgraphEndpoint,
        document: &str,
    ) -> Result<GraphqlResponse, PriceError>;
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

/// POSTs GraphQL queries over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpSubgraph {
    client: reqwest::Client,
}

impl HttpSubgraph {
    pub fn new(timeout: Duration) -> Result<Self, PriceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SubgraphTransport for HttpSubgraph {
    async fn query(
        &self,
        endpoint: &SubgraphEndpoint,
        document: &str,
    ) -> Result<GraphqlResponse, PriceError> {
        let response = self
            .client
            .post(&endpoint.url)
            .json(&GraphqlRequest { query: document })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceError::Status {
                endpoint: endpoint.label.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<GraphqlResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_response() {
        let body = r#"{"data":{"_meta":{"block":{"number":21000000}}}}"#;
        let response: GraphqlResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.block_number(), Some(21_000_000));
    }

    #[test]
    fn test_zero_block_is_unusable() {
        let body = r#"{"data":{"_meta":{"block":{"number":0}}}}"#;
        let response: GraphqlResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.block_number(), None);
    }

    #[test]
    fn test_parse_price_response() {
        let body = r#"{"data":{"_meta":{"block":{"number":5}},
            "token":{"derivedPLS":"0.25","derivedUSD":"0.0001"}}}"#;
        let response: GraphqlResponse = serde_json::from_str(body).unwrap();
        let snapshot = response.price_snapshot(5).unwrap();
        assert_eq!(snapshot.derived_pls, 0.25);
        assert_eq!(snapshot.derived_usd, 0.0001);
        assert_eq!(snapshot.block, 5);
    }

    #[test]
    fn test_missing_token_has_no_snapshot() {
        let body = r#"{"data":{"token":null},"errors":[{"message":"block not indexed"}]}"#;
        let response: GraphqlResponse = serde_json::from_str(body).unwrap();
        assert!(response.price_snapshot(1).is_none());
        assert_eq!(response.error_messages().as_deref(), Some("block not indexed"));
    }

    #[test]
    fn test_price_query_embeds_token_and_block() {
        let query = price_query("0xabc", 42);
        assert!(query.contains(r#"token(id: "0xabc", block: {number: 42})"#));
        assert!(query.contains("derivedUSD"));
    }
}
