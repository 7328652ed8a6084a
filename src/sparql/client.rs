//! SparqlClient trait and its HTTP implementation

use super::results::{QuerySolution, SelectResults};
use super::{SparqlError, SparqlResult};
use crate::config::{QueryOperation, SourceConfig};
use crate::rdf::{Quad, RdfFormat, RdfParser};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

/// Unified interface to a SPARQL endpoint.
///
/// Implemented by:
/// - `HttpSparqlClient`: SPARQL 1.1 protocol over HTTP
/// - in-memory stores in tests
#[async_trait]
pub trait SparqlClient: Send + Sync {
    /// Run a SELECT query and return its solutions in endpoint order
    async fn select(&self, query: &str) -> SparqlResult<Vec<QuerySolution>>;

    /// Run a CONSTRUCT (or DESCRIBE) query and return the resulting triples
    async fn construct(&self, query: &str) -> SparqlResult<Vec<Quad>>;
}

/// Network client for a SPARQL 1.1 query endpoint.
pub struct HttpSparqlClient {
    config: SourceConfig,
    http_client: Client,
}

impl HttpSparqlClient {
    /// Create a client for the endpoint described by `config`
    pub fn new(config: SourceConfig) -> SparqlResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            config,
            http_client: builder.build()?,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn request(&self, query: &str, accept: &str) -> RequestBuilder {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();

        let request = match self.config.query_operation {
            QueryOperation::Get => {
                let separator = if self.config.endpoint.contains('?') { '&' } else { '?' };
                let url = format!("{}{}query={}", self.config.endpoint, separator, encoded);
                self.http_client.get(url)
            }
            QueryOperation::PostUrlencoded => self
                .http_client
                .post(&self.config.endpoint)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(format!("query={encoded}")),
            QueryOperation::PostDirect => self
                .http_client
                .post(&self.config.endpoint)
                .header(CONTENT_TYPE, "application/sparql-query")
                .body(query.to_string()),
        };

        let request = request.header(ACCEPT, accept);
        match &self.config.user {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, query: &str, kind: &str, accept: &str) -> SparqlResult<reqwest::Response> {
        debug!(
            endpoint = %self.config.endpoint,
            operation = ?self.config.query_operation,
            kind,
            "sending SPARQL query"
        );

        let response = self.request(query, accept).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SparqlError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl SparqlClient for HttpSparqlClient {
    async fn select(&self, query: &str) -> SparqlResult<Vec<QuerySolution>> {
        let response = self.send(query, "select", SelectResults::MEDIA_TYPE).await?;
        let body = response.bytes().await?;
        let rows = SelectResults::parse_json(&body)?;
        debug!(rows = rows.len(), "SELECT results received");
        Ok(rows)
    }

    async fn construct(&self, query: &str) -> SparqlResult<Vec<Quad>> {
        let response = self
            .send(query, "construct", RdfFormat::NTriples.media_type())
            .await?;

        // some endpoints ignore the Accept header and answer with Turtle
        let format = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(RdfFormat::from_media_type)
            .unwrap_or(RdfFormat::NTriples);

        let body = response.text().await?;
        let quads = RdfParser::parse(&body, format)?;
        debug!(triples = quads.len(), "CONSTRUCT results received");
        Ok(quads)
    }
}
