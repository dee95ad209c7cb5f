pub mod construct;
pub mod patterns;
pub mod render;
pub mod select;

use anyhow::{Context, Result};
use opl_config::OplConfig;
use opl_query::{Injections, MixinPolicy, Preprocessor, Variables};
use opl_sparql::{PrefixMap, SparqlClient};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::cli::TemplateArgs;

/// Read a template from a file, or from stdin when the path is `-`.
pub fn read_template(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut template = String::new();
        std::io::stdin()
            .read_to_string(&mut template)
            .context("failed to read template from stdin")?;
        return Ok(template);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))
}

/// Read and preprocess the template named by `args`.
pub fn prepare_query(config: &OplConfig, args: &TemplateArgs) -> Result<String> {
    let template = read_template(&args.template)?;

    let mut preprocessor = Preprocessor::from_config(&config.template);
    if args.strict {
        preprocessor = preprocessor.with_policy(MixinPolicy::Strict);
    }

    let variables: Variables = args.vars.iter().cloned().collect();
    let injections: Injections = args.injections.iter().cloned().collect();
    debug!(
        template = %args.template.display(),
        strict = preprocessor.policy().is_strict(),
        variables = variables.len(),
        injections = injections.len(),
        "preprocessing template"
    );

    preprocessor
        .load(&template, &variables, &injections)
        .with_context(|| format!("failed to preprocess {}", args.template.display()))
}

/// Build an endpoint client from the `[sparql]` and `[prefixes]` sections.
pub fn sparql_client(config: &OplConfig) -> Result<SparqlClient> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("opl/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let client = SparqlClient::from_config(http, &config.sparql)
        .context("set [sparql].endpoint in the config file or pass --endpoint")?;

    Ok(client.with_prefixes(PrefixMap::from_config(&config.prefixes)))
}
