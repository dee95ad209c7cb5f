use anyhow::{anyhow, Result};
use opl_config::OplConfig;
use opl_query::{query_definitions, PatternLibrary};

pub fn execute(config: &OplConfig, group: &str) -> Result<()> {
    let library = PatternLibrary::from_config(config);

    let patterns = library.group(group).ok_or_else(|| {
        anyhow!(
            "unknown pattern group '{group}' (available: {})",
            library.group_names().join(", ")
        )
    })?;

    let definitions = query_definitions(patterns)?;
    println!("{}", definitions.join("\n\n"));
    Ok(())
}
