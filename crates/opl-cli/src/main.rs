use anyhow::{Context, Result};
use clap::Parser;
use opl_config::ConfigLoader;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use opl_cli::{
    cli::{Cli, Commands},
    commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref())
        .await
        .context("failed to load configuration")?
        .with_endpoint(cli.endpoint.clone());

    // Logs go to stderr so query output on stdout stays pipeable
    let directive = cli.log_directive(config.log_level.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&directive))
        .with_writer(std::io::stderr)
        .init();
    debug!(filter = %directive, "logging initialised");

    match cli.command {
        Commands::Render(args) => commands::render::execute(&config, args)?,
        Commands::Select {
            template,
            format,
            labels,
        } => commands::select::execute(&config, template, format, labels).await?,
        Commands::Construct(args) => commands::construct::execute(&config, args).await?,
        Commands::Patterns { group } => commands::patterns::execute(&config, &group)?,
    }

    Ok(())
}
