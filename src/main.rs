use clap::Parser;
mod cli;
mod config;
mod error;
mod extractor;
mod logger;
mod migrator;
mod models;
mod mysql_processor;
mod psql_processor;
#[cfg(test)]
mod test_support;
mod traits;
use cli::CLi;
use config::Config;
use error::{CustomError, CustomResult};
use logger::Logger;
use migrator::Migrator;
use mysql_processor::case_store::MysqlCaseStore;
use psql_processor::case_store::PsqlCaseStore;
use traits::CaseStore;

#[tokio::main]
async fn main() -> CustomResult<()> {
    let cli_args = CLi::parse();
    let config = config::read_config(&cli_args.config)?;

    Logger::init(config.log.log_level);
    let logger = Logger::new();
    logger.info(
        format!(
            "Migrating `{}` rows from {} to {} on {}",
            config.migration.case_category,
            config.tables.source,
            config.tables.target,
            config.technology.category
        )
        .as_str(),
    );

    match config.technology.category.as_str() {
        "mysql" => {
            let store = MysqlCaseStore::connect(&config)?;
            run(store, &config).await
        }
        "postgres" => {
            let store = PsqlCaseStore::connect(&config).await?;
            run(store, &config).await
        }
        other => Err(CustomError::UnsupportedTechnology(other.to_string())),
    }
}

async fn run<S: CaseStore>(store: S, config: &Config) -> CustomResult<()> {
    let mut migrator = Migrator::new(store, config.migration.clone());
    let summary = migrator.run().await?;
    println!("{}", summary);

    Ok(())
}
