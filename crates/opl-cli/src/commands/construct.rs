use anyhow::Result;
use opl_config::OplConfig;
use opl_sparql::SparqlEndpoint;
use tracing::info;

use crate::cli::TemplateArgs;

pub async fn execute(config: &OplConfig, args: TemplateArgs) -> Result<()> {
    let query = super::prepare_query(config, &args)?;
    let client = super::sparql_client(config)?;

    info!(endpoint = client.endpoint(), "running construct query");
    let turtle = client.construct(&query).await?;

    print!("{turtle}");
    if !turtle.ends_with('\n') {
        println!();
    }
    Ok(())
}
