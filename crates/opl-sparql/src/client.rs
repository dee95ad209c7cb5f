//! HTTP client for SPARQL 1.1 protocol endpoints

use crate::error::{SparqlError, SparqlResult};
use crate::prefixes::PrefixMap;
use async_trait::async_trait;
use opl_config::SparqlConfig;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const RESULTS_JSON: &str = "application/sparql-results+json";
const TURTLE: &str = "text/turtle";

/// Kind of RDF term in a result binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    TypedLiteral,
    Bnode,
}

/// A bound value in a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// One solution of a SELECT query, keyed by variable name
pub type Row = BTreeMap<String, Term>;

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    results: ResultsBody,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    bindings: Vec<Row>,
}

/// Trait for anything that can answer SPARQL queries
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Submit a SELECT query and return the result rows
    async fn fetch(&self, query: &str) -> SparqlResult<Vec<Row>>;

    /// Submit a CONSTRUCT query and return the graph as a Turtle document
    async fn construct(&self, query: &str) -> SparqlResult<String>;
}

/// SPARQL endpoint reached over HTTP POST
pub struct SparqlClient {
    client: Client,
    endpoint: String,
    prefixes: PrefixMap,
    timeout: Duration,
    infer: bool,
    same_as: bool,
}

impl SparqlClient {
    /// Create a client for `endpoint` with default prefixes and settings
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self::from_parts(client, endpoint.into(), &SparqlConfig::default())
    }

    /// Create a client from the `[sparql]` config section
    pub fn from_config(client: Client, config: &SparqlConfig) -> SparqlResult<Self> {
        let endpoint = config.endpoint.clone().ok_or(SparqlError::NotConfigured)?;
        Ok(Self::from_parts(client, endpoint, config))
    }

    fn from_parts(client: Client, endpoint: String, config: &SparqlConfig) -> Self {
        Self {
            client,
            endpoint,
            prefixes: PrefixMap::default(),
            timeout: Duration::from_secs(config.timeout_secs),
            infer: config.infer,
            same_as: config.same_as,
        }
    }

    pub fn with_prefixes(mut self, prefixes: PrefixMap) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The query text exactly as it is sent: prologue, newline, query.
    pub fn full_query(&self, query: &str) -> String {
        format!("{}\n{}", self.prefixes.sparql_prologue(), query)
    }

    async fn submit(&self, query: &str, accept: &str) -> SparqlResult<(String, String)> {
        let full_query = self.full_query(query);
        debug!(endpoint = %self.endpoint, accept, "submitting query");

        let params = [
            ("query", full_query.as_str()),
            ("infer", bool_param(self.infer)),
            ("sameAs", bool_param(self.same_as)),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, accept)
            .form(&params)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(source) => {
                return Err(SparqlError::Request {
                    query: full_query,
                    source,
                })
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => {
                return Err(SparqlError::Request {
                    query: full_query,
                    source,
                })
            }
        };

        if !status.is_success() {
            return Err(SparqlError::Status {
                status: status.as_u16(),
                body,
                query: full_query,
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "query succeeded");
        Ok((full_query, body))
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl SparqlEndpoint for SparqlClient {
    async fn fetch(&self, query: &str) -> SparqlResult<Vec<Row>> {
        let (full_query, body) = self.submit(query, RESULTS_JSON).await?;

        let document: ResultsDocument =
            serde_json::from_str(&body).map_err(|e| SparqlError::Decode {
                query: full_query,
                message: e.to_string(),
            })?;

        Ok(document.results.bindings)
    }

    async fn construct(&self, query: &str) -> SparqlResult<String> {
        let (_, body) = self.submit(query, TURTLE).await?;
        Ok(format!("{}\n{}", self.prefixes.turtle_prologue(), body))
    }
}
