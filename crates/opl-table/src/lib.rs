//! Rendering of query result rows as tables.
//!
//! [`QueryResultsTable`] turns a list of rows into an HTML `<table>` or into
//! Confluence storage-format XHTML wrapped in an inline `span` macro, so a
//! result set can be published to a wiki page.

mod table;

pub use table::{QueryResultsTable, Rewriter, TableRow};
