use anyhow::Result;
use opl_config::OplConfig;
use opl_sparql::{Row, SparqlEndpoint};
use opl_table::{QueryResultsTable, TableRow};
use serde_json::Value;
use tracing::info;

use crate::cli::{OutputFormat, TemplateArgs};

pub async fn execute(
    config: &OplConfig,
    args: TemplateArgs,
    format: OutputFormat,
    labels: Vec<(String, String)>,
) -> Result<()> {
    let query = super::prepare_query(config, &args)?;
    let client = super::sparql_client(config)?;

    info!(endpoint = client.endpoint(), "running select query");
    let rows = client.fetch(&query).await?;
    info!(rows = rows.len(), "query returned");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Html => {
            let mut table = QueryResultsTable::new(rows.iter().map(table_row).collect());
            if !labels.is_empty() {
                table = table.with_labels(labels);
            }
            println!("{}", table.to_html());
        }
    }

    Ok(())
}

/// Flatten bound terms to their lexical values for display.
pub fn table_row(row: &Row) -> TableRow {
    row.iter()
        .map(|(name, term)| (name.clone(), Value::String(term.value.clone())))
        .collect()
}
