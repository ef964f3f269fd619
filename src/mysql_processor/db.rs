use mysql::*;

use crate::config::DbConfig;
use crate::error::{CustomError, CustomResult};
use crate::logger::Logger;

pub fn get_connection(db_config: &DbConfig) -> CustomResult<PooledConn> {
    let logger = Logger::new();
    let pool = get_connections_pool(db_config)?;

    let connection = match pool.get_conn() {
        Ok(conn) => {
            logger.debug("Got connection from Pool");
            conn
        }
        Err(err) => {
            logger.error(format!("Can't get connection from Pool: {:#?}", err).as_str());
            return Err(CustomError::DbConnection);
        }
    };

    Ok(connection)
}

pub fn get_connections_pool(db_config: &DbConfig) -> CustomResult<Pool> {
    let logger = Logger::new();
    let pool = Pool::new(get_opts(db_config));

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

// Built field by field so passwords with URL-reserved characters need no escaping.
fn get_opts(db_config: &DbConfig) -> OptsBuilder {
    OptsBuilder::new()
        .ip_or_hostname(Some(db_config.host.as_str()))
        .tcp_port(db_config.port)
        .user(Some(db_config.username.as_str()))
        .pass(Some(db_config.password.as_str()))
        .db_name(Some(db_config.database.as_str()))
        .init(vec![format!("SET NAMES {}", db_config.charset)])
}
