use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use mysql::prelude::{FromValue, Queryable};
use mysql::{Params, PooledConn, Row, Value};

use crate::config::Config;
use crate::error::{CustomError, CustomResult};
use crate::logger::Logger;
use crate::models::{CaseRecord, SourceRecord};
use crate::mysql_processor::db::get_connection;
use crate::traits::CaseStore;

pub struct MysqlCaseStore {
    conn: Option<PooledConn>,
    source_table: String,
    target_table: String,
    case_category: String,
    in_transaction: bool,
    logger: Logger,
}

impl MysqlCaseStore {
    pub fn connect(config: &Config) -> CustomResult<Self> {
        let logger = Logger::new();
        logger.info("Connecting to MySQL database");
        let conn = get_connection(&config.database)?;
        logger.info("Connected to MySQL database");

        Ok(Self {
            conn: Some(conn),
            source_table: config.tables.source.clone(),
            target_table: config.tables.target.clone(),
            case_category: config.migration.case_category.clone(),
            in_transaction: false,
            logger,
        })
    }

    fn conn(&mut self) -> CustomResult<&mut PooledConn> {
        self.conn.as_mut().ok_or(CustomError::DbConnection)
    }

    fn exec_no_output_statement(&mut self, query: &str) -> CustomResult<()> {
        self.logger.debug(query);
        self.conn()?
            .query_drop(query)
            .map_err(|err| statement_failed(query, err))
    }

    fn ensure_transaction(&mut self) -> CustomResult<()> {
        if !self.in_transaction {
            self.exec_no_output_statement("START TRANSACTION")
                .map_err(|_| CustomError::DbTransaction)?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl CaseStore for MysqlCaseStore {
    async fn fetch_case_articles(&mut self) -> CustomResult<Vec<SourceRecord>> {
        let query = format!(
            "SELECT id, title, content, law_type, create_time FROM `{}` WHERE law_type = ?",
            self.source_table
        );
        let category = self.case_category.clone();
        let rows: Vec<Row> = self
            .conn()?
            .exec(query.as_str(), (category.as_str(),))
            .map_err(|err| statement_failed(&query, err))?;

        rows.iter().map(source_record_from_row).collect()
    }

    async fn case_exists(&mut self, title: &str) -> CustomResult<bool> {
        let query = format!("SELECT id FROM `{}` WHERE title = ?", self.target_table);
        let row: Option<Row> = self
            .conn()?
            .exec_first(query.as_str(), (title,))
            .map_err(|err| statement_failed(&query, err))?;

        Ok(row.is_some())
    }

    async fn insert_case(&mut self, case: &CaseRecord) -> CustomResult<()> {
        self.ensure_transaction()?;
        let query = format!(
            "INSERT INTO `{}` (title, case_type, content, court_name, judge_date, \
             dispute_point, judgment_result, law_type, create_time) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.target_table
        );
        let params = Params::Positional(vec![
            Value::from(case.title.as_str()),
            Value::from(case.case_type.clone()),
            Value::from(case.content.clone()),
            Value::from(case.court_name.clone()),
            case.judge_date.map_or(Value::NULL, date_value),
            Value::from(case.dispute_point.clone()),
            Value::from(case.judgment_result.clone()),
            Value::from(case.law_type.as_str()),
            case.create_time.map_or(Value::NULL, datetime_value),
        ]);

        self.conn()?
            .exec_drop(query.as_str(), params)
            .map_err(|err| statement_failed(&query, err))
    }

    async fn delete_case_articles(&mut self) -> CustomResult<u64> {
        self.ensure_transaction()?;
        let query = format!("DELETE FROM `{}` WHERE law_type = ?", self.source_table);
        let category = self.case_category.clone();
        let conn = self.conn()?;
        conn.exec_drop(query.as_str(), (category.as_str(),))
            .map_err(|err| statement_failed(&query, err))?;

        Ok(conn.affected_rows())
    }

    async fn commit(&mut self) -> CustomResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.exec_no_output_statement("COMMIT")
            .map_err(|_| CustomError::DbTransaction)?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> CustomResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.exec_no_output_statement("ROLLBACK")
            .map_err(|_| CustomError::DbTransaction)
    }

    async fn count_cases(&mut self) -> CustomResult<u64> {
        let query = format!("SELECT COUNT(*) FROM `{}`", self.target_table);
        let count: Option<u64> = self
            .conn()?
            .query_first(query.as_str())
            .map_err(|err| statement_failed(&query, err))?;

        Ok(count.unwrap_or(0))
    }

    async fn count_case_articles(&mut self) -> CustomResult<u64> {
        let query = format!(
            "SELECT COUNT(*) FROM `{}` WHERE law_type = ?",
            self.source_table
        );
        let category = self.case_category.clone();
        let count: Option<u64> = self
            .conn()?
            .exec_first(query.as_str(), (category.as_str(),))
            .map_err(|err| statement_failed(&query, err))?;

        Ok(count.unwrap_or(0))
    }

    async fn close(&mut self) {
        if self.conn.take().is_some() {
            self.logger.info("Closed MySQL connection");
        }
    }
}

fn statement_failed(query: &str, err: mysql::Error) -> CustomError {
    let logger = Logger::new();
    logger.error(format!("Failed to execute `{}`: {}", query, err).as_str());
    CustomError::QueryExecution
}

fn column<T: FromValue>(row: &Row, name: &str) -> CustomResult<T> {
    row.get_opt(name)
        .ok_or_else(|| {
            Logger::new().error(format!("No such column: `{}` in row {:?}", name, row).as_str());
            CustomError::QueryExecution
        })?
        .map_err(|err| {
            Logger::new().error(format!("Bad value in column `{}`: {}", name, err).as_str());
            CustomError::QueryExecution
        })
}

fn source_record_from_row(row: &Row) -> CustomResult<SourceRecord> {
    let create_time: Value = column(row, "create_time")?;

    Ok(SourceRecord {
        id: column(row, "id")?,
        title: column(row, "title")?,
        content: column(row, "content")?,
        law_type: column(row, "law_type")?,
        create_time: datetime_from_value(&create_time),
    })
}

fn date_value(date: NaiveDate) -> Value {
    Value::Date(date.year() as u16, date.month() as u8, date.day() as u8, 0, 0, 0, 0)
}

fn datetime_value(datetime: NaiveDateTime) -> Value {
    Value::Date(
        datetime.year() as u16,
        datetime.month() as u8,
        datetime.day() as u8,
        datetime.hour() as u8,
        datetime.minute() as u8,
        datetime.second() as u8,
        datetime.nanosecond() / 1_000,
    )
}

fn datetime_from_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)?.and_hms_micro_opt(
                *hour as u32,
                *minute as u32,
                *second as u32,
                *micros,
            )
        }
        // Text protocol results carry dates as strings.
        Value::Bytes(bytes) => {
            let text = std::str::from_utf8(bytes).ok()?;
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
                .ok()
        }
        _ => None,
    }
}
