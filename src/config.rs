use once_cell::sync::Lazy;
use regex::Regex;
use serde_derive::Deserialize;

use std::env;
use std::fs;
use std::path::Path;

use crate::error::{CustomError, CustomResult};
use crate::logger::LogLevel;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    #[serde(default = "default_charset")]
    pub charset: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbTechnology {
    pub category: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TablesConfig {
    #[serde(default = "default_source_table")]
    pub source: String,
    #[serde(default = "default_target_table")]
    pub target: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            source: default_source_table(),
            target: default_target_table(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MigrationConfig {
    #[serde(default = "default_case_category")]
    pub case_category: String,
    #[serde(default = "default_content_max_chars")]
    pub content_max_chars: usize,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            case_category: default_case_category(),
            content_max_chars: default_content_max_chars(),
            progress_every: default_progress_every(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogsConfig {
    pub log_level: LogLevel,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
        }
    }
}

// Top level struct to hold the TOML data.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub technology: DbTechnology,
    pub database: DbConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub log: LogsConfig,
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_source_table() -> String {
    "legal_articles".to_string()
}

fn default_target_table() -> String {
    "legal_cases".to_string()
}

fn default_case_category() -> String {
    "案例".to_string()
}

fn default_content_max_chars() -> usize {
    5000
}

fn default_progress_every() -> usize {
    10
}

pub fn read_config(path: &Path) -> CustomResult<Config> {
    println!("Reading config file: {}", path.display());
    let contents = fs::read_to_string(path).map_err(|err| {
        CustomError::Config(format!("Could not read file `{}`: {}", path.display(), err))
    })?;

    let mut data = parse_config(&contents)?;
    apply_env_overrides(&mut data, |key| env::var(key).ok())?;
    data.validate()?;
    println!("Read config file: {}", path.display());

    Ok(data)
}

pub fn parse_config(contents: &str) -> CustomResult<Config> {
    toml::from_str(contents)
        .map_err(|err| CustomError::Config(format!("Unable to parse config: {}", err)))
}

/// Connection parameters may come from the environment so credentials stay out of the file.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> CustomResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("LEGAL_DB_HOST") {
        config.database.host = host;
    }
    if let Some(port) = lookup("LEGAL_DB_PORT") {
        config.database.port = port
            .parse()
            .map_err(|_| CustomError::Config(format!("LEGAL_DB_PORT is not a port: {}", port)))?;
    }
    if let Some(username) = lookup("LEGAL_DB_USER") {
        config.database.username = username;
    }
    if let Some(password) = lookup("LEGAL_DB_PASSWORD") {
        config.database.password = password;
    }
    if let Some(database) = lookup("LEGAL_DB_NAME") {
        config.database.database = database;
    }

    Ok(())
}

impl Config {
    pub fn validate(&self) -> CustomResult<()> {
        for table in [&self.tables.source, &self.tables.target] {
            if !is_valid_identifier(table) {
                return Err(CustomError::Config(format!("Invalid table name: `{}`", table)));
            }
        }

        // Interpolated into `SET NAMES` on connect.
        if !is_valid_identifier(&self.database.charset) {
            return Err(CustomError::Config(format!(
                "Invalid charset: `{}`",
                self.database.charset
            )));
        }

        if self.migration.case_category.is_empty() {
            return Err(CustomError::Config("migration.case_category is empty".to_string()));
        }

        match self.technology.category.as_str() {
            "mysql" | "postgres" => Ok(()),
            other => Err(CustomError::UnsupportedTechnology(other.to_string())),
        }
    }
}

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
        [technology]
        category = "mysql"

        [database]
        host = "localhost"
        port = 3306
        username = "root"
        password = "secret"
        database = "legal_qa"
    "#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.database.charset, "utf8mb4");
        assert_eq!(config.tables, TablesConfig::default());
        assert_eq!(config.migration.case_category, "案例");
        assert_eq!(config.migration.content_max_chars, 5000);
        assert_eq!(config.migration.progress_every, 10);
        assert_eq!(config.log.log_level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_replace_connection_fields() {
        let mut config = parse_config(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            ("LEGAL_DB_HOST", "db.internal"),
            ("LEGAL_DB_PORT", "3307"),
            ("LEGAL_DB_PASSWORD", "from-env"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.password, "from-env");
        assert_eq!(config.database.username, "root");
    }

    #[test]
    fn bad_port_override_is_a_config_error() {
        let mut config = parse_config(MINIMAL).unwrap();
        let result = apply_env_overrides(&mut config, |key| {
            (key == "LEGAL_DB_PORT").then(|| "not-a-port".to_string())
        });

        assert!(matches!(result, Err(CustomError::Config(_))));
    }

    #[test]
    fn rejects_table_names_that_are_not_identifiers() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.tables.target = "legal_cases; DROP TABLE x".to_string();

        assert!(matches!(config.validate(), Err(CustomError::Config(_))));
    }

    #[test]
    fn rejects_charset_that_is_not_an_identifier() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.database.charset = "utf8mb4; SELECT 1".to_string();

        assert!(matches!(config.validate(), Err(CustomError::Config(_))));
    }

    #[test]
    fn rejects_unknown_technology() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.technology.category = "oracle".to_string();

        assert_eq!(
            config.validate(),
            Err(CustomError::UnsupportedTechnology("oracle".to_string()))
        );
    }

    #[test]
    fn identifier_check() {
        assert!(is_valid_identifier("legal_articles"));
        assert!(is_valid_identifier("_cases2"));
        assert!(!is_valid_identifier("2cases"));
        assert!(!is_valid_identifier("legal-articles"));
        assert!(!is_valid_identifier(""));
    }
}
