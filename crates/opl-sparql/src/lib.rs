//! SPARQL endpoint client.
//!
//! Queries are sent as-is after a `prefix` prologue is prepended. SELECT-style
//! queries come back as binding rows, CONSTRUCT-style queries as a Turtle
//! document.

mod client;
mod error;
pub mod prefixes;

pub use client::{Row, SparqlClient, SparqlEndpoint, Term, TermKind};
pub use error::{SparqlError, SparqlResult};
pub use prefixes::PrefixMap;
