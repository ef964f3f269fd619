use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

/// Moves case rows out of the legal articles table into the legal cases table.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CLi {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_to_config_toml() {
        let cli = CLi::parse_from(["case_migrator"]);

        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn config_path_can_be_overridden() {
        let cli = CLi::parse_from(["case_migrator", "--config", "/etc/legal/migrate.toml"]);

        assert_eq!(cli.config, PathBuf::from("/etc/legal/migrate.toml"));
    }
}
