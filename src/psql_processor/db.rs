use sqlx::postgres::{PgConnectOptions, PgPoolOptions, Postgres};
use sqlx::pool::PoolConnection;
use sqlx::Pool;

use crate::config::DbConfig;
use crate::error::{CustomError, CustomResult};
use crate::logger::Logger;

/// The migration runs on exactly one connection, so the pool never grows past it.
pub async fn get_connections_pool(db_config: &DbConfig) -> CustomResult<Pool<Postgres>> {
    let logger = Logger::new();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(get_options(db_config))
        .await;

    match pool {
        Ok(pool) => {
            logger.debug("Created connection Pool for DB");
            Ok(pool)
        }
        Err(err) => {
            logger.error(format!("Can't create connection Pool: {:#?}", err).as_str());
            Err(CustomError::DbConnection)
        }
    }
}

pub async fn get_connection(pool: &Pool<Postgres>) -> CustomResult<PoolConnection<Postgres>> {
    pool.acquire().await.map_err(|err| {
        Logger::new().error(format!("Can't get connection from Pool: {:#?}", err).as_str());
        CustomError::DbConnection
    })
}

fn get_options(db_config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&db_config.host)
        .port(db_config.port)
        .username(&db_config.username)
        .password(&db_config.password)
        .database(&db_config.database)
}
