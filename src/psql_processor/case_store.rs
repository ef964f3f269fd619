use chrono::NaiveDateTime;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Pool, Postgres, Row};

use crate::config::Config;
use crate::error::{CustomError, CustomResult};
use crate::logger::Logger;
use crate::models::{CaseRecord, SourceRecord};
use crate::psql_processor::db::{get_connection, get_connections_pool};
use crate::traits::CaseStore;

const ROW_SAVEPOINT: &str = "case_row";

pub struct PsqlCaseStore {
    pool: Pool<Postgres>,
    conn: Option<PoolConnection<Postgres>>,
    source_table: String,
    target_table: String,
    case_category: String,
    in_transaction: bool,
    logger: Logger,
}

impl PsqlCaseStore {
    pub async fn connect(config: &Config) -> CustomResult<Self> {
        let logger = Logger::new();
        logger.info("Connecting to Postgres database");
        let pool = get_connections_pool(&config.database).await?;
        let conn = get_connection(&pool).await?;
        logger.info("Connected to Postgres database");

        Ok(Self {
            pool,
            conn: Some(conn),
            source_table: config.tables.source.clone(),
            target_table: config.tables.target.clone(),
            case_category: config.migration.case_category.clone(),
            in_transaction: false,
            logger,
        })
    }

    fn conn(&mut self) -> CustomResult<&mut PgConnection> {
        self.conn.as_deref_mut().ok_or(CustomError::DbConnection)
    }

    async fn execute(&mut self, query: &str) -> CustomResult<()> {
        self.logger.debug(query);
        sqlx::query(query)
            .execute(self.conn()?)
            .await
            .map(|_| ())
            .map_err(|err| statement_failed(query, err))
    }

    async fn ensure_transaction(&mut self) -> CustomResult<()> {
        if !self.in_transaction {
            self.execute("BEGIN")
                .await
                .map_err(|_| CustomError::DbTransaction)?;
            self.in_transaction = true;
        }
        Ok(())
    }

    async fn insert_row(&mut self, case: &CaseRecord) -> CustomResult<()> {
        let query = format!(
            "INSERT INTO {} (title, case_type, content, court_name, judge_date, \
             dispute_point, judgment_result, law_type, create_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            self.target_table
        );

        sqlx::query(&query)
            .bind(&case.title)
            .bind(&case.case_type)
            .bind(&case.content)
            .bind(&case.court_name)
            .bind(case.judge_date)
            .bind(&case.dispute_point)
            .bind(&case.judgment_result)
            .bind(&case.law_type)
            .bind(case.create_time)
            .execute(self.conn()?)
            .await
            .map(|_| ())
            .map_err(|err| statement_failed(&query, err))
    }
}

impl CaseStore for PsqlCaseStore {
    async fn fetch_case_articles(&mut self) -> CustomResult<Vec<SourceRecord>> {
        let query = format!(
            "SELECT id::BIGINT AS id, title, content, law_type, create_time::TIMESTAMP AS create_time \
             FROM {} WHERE law_type = $1",
            self.source_table
        );
        let category = self.case_category.clone();
        let rows = sqlx::query(&query)
            .bind(category)
            .fetch_all(self.conn()?)
            .await
            .map_err(|err| statement_failed(&query, err))?;

        rows.iter().map(source_record_from_row).collect()
    }

    /// A failed statement aborts the whole Postgres transaction, so each row runs under a
    /// savepoint and a bad row is undone on its own.
    async fn begin_row(&mut self) -> CustomResult<()> {
        self.ensure_transaction().await?;
        self.execute(&format!("SAVEPOINT {}", ROW_SAVEPOINT))
            .await
            .map_err(|_| CustomError::DbTransaction)
    }

    async fn end_row(&mut self, keep: bool) -> CustomResult<()> {
        let statement = if keep {
            format!("RELEASE SAVEPOINT {}", ROW_SAVEPOINT)
        } else {
            format!("ROLLBACK TO SAVEPOINT {}", ROW_SAVEPOINT)
        };
        self.execute(&statement)
            .await
            .map_err(|_| CustomError::DbTransaction)
    }

    async fn case_exists(&mut self, title: &str) -> CustomResult<bool> {
        let query = format!("SELECT 1 FROM {} WHERE title = $1 LIMIT 1", self.target_table);
        let row = sqlx::query(&query)
            .bind(title)
            .fetch_optional(self.conn()?)
            .await
            .map_err(|err| statement_failed(&query, err))?;

        Ok(row.is_some())
    }

    async fn insert_case(&mut self, case: &CaseRecord) -> CustomResult<()> {
        self.ensure_transaction().await?;
        self.insert_row(case).await
    }

    async fn delete_case_articles(&mut self) -> CustomResult<u64> {
        self.ensure_transaction().await?;
        let query = format!("DELETE FROM {} WHERE law_type = $1", self.source_table);
        let category = self.case_category.clone();
        let result = sqlx::query(&query)
            .bind(category)
            .execute(self.conn()?)
            .await
            .map_err(|err| statement_failed(&query, err))?;

        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> CustomResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        // COMMIT of an aborted transaction succeeds and silently rolls back; any statement
        // run first fails instead.
        if self.execute("SELECT 1").await.is_err() {
            self.logger
                .error("Transaction was aborted, rolling back instead of committing");
            self.rollback().await?;
            return Err(CustomError::DbTransaction);
        }
        self.execute("COMMIT")
            .await
            .map_err(|_| CustomError::DbTransaction)?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> CustomResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.execute("ROLLBACK")
            .await
            .map_err(|_| CustomError::DbTransaction)
    }

    async fn count_cases(&mut self) -> CustomResult<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.target_table);
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(self.conn()?)
            .await
            .map_err(|err| statement_failed(&query, err))?;

        Ok(count as u64)
    }

    async fn count_case_articles(&mut self) -> CustomResult<u64> {
        let query = format!("SELECT COUNT(*) FROM {} WHERE law_type = $1", self.source_table);
        let category = self.case_category.clone();
        let count: i64 = sqlx::query_scalar(&query)
            .bind(category)
            .fetch_one(self.conn()?)
            .await
            .map_err(|err| statement_failed(&query, err))?;

        Ok(count as u64)
    }

    async fn close(&mut self) {
        if self.conn.take().is_some() {
            self.pool.close().await;
            self.logger.info("Closed Postgres connection");
        }
    }
}

fn statement_failed(query: &str, err: sqlx::Error) -> CustomError {
    Logger::new().error(format!("Failed to execute `{}`: {}", query, err).as_str());
    CustomError::QueryExecution
}

fn source_record_from_row(row: &PgRow) -> CustomResult<SourceRecord> {
    let read = |err: sqlx::Error| {
        Logger::new().error(format!("Failed to read case row: {}", err).as_str());
        CustomError::QueryExecution
    };

    Ok(SourceRecord {
        id: row.try_get("id").map_err(read)?,
        title: row.try_get("title").map_err(read)?,
        content: row.try_get("content").map_err(read)?,
        law_type: row.try_get("law_type").map_err(read)?,
        create_time: row
            .try_get::<Option<NaiveDateTime>, _>("create_time")
            .map_err(read)?,
    })
}
