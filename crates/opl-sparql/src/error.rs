use thiserror::Error;

/// Errors from submitting a query to a SPARQL endpoint.
///
/// Everything except `NotConfigured` carries the full submitted query,
/// prologue included.
#[derive(Error, Debug)]
pub enum SparqlError {
    #[error("no SPARQL endpoint configured")]
    NotConfigured,

    #[error("while querying \"\"\"\n{query}\"\"\": {source}")]
    Request {
        query: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("endpoint returned HTTP {status} while querying \"\"\"\n{query}\"\"\": {body}")]
    Status {
        status: u16,
        body: String,
        query: String,
    },

    #[error("failed to decode results while querying \"\"\"\n{query}\"\"\": {message}")]
    Decode { query: String, message: String },
}

pub type SparqlResult<T> = Result<T, SparqlError>;
