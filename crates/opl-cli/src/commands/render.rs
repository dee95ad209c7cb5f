use anyhow::Result;
use opl_config::OplConfig;

use crate::cli::TemplateArgs;

pub fn execute(config: &OplConfig, args: TemplateArgs) -> Result<()> {
    let query = super::prepare_query(config, &args)?;
    println!("{query}");
    Ok(())
}
