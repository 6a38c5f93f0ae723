use crate::config::Config;
use anyhow::Result;

pub fn cmd_init() -> Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml. Fill in the [panel] section before running jobs.");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}
