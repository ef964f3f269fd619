use crate::error::CustomResult;
use crate::models::{CaseRecord, SourceRecord};

/// The articles table (source) and the cases table (destination) behind one connection.
///
/// The first write opens a transaction and `commit` or `rollback` closes it, so the migration
/// can commit its inserts and its delete separately.
#[allow(async_fn_in_trait)]
pub trait CaseStore {
    async fn fetch_case_articles(&mut self) -> CustomResult<Vec<SourceRecord>>;

    /// Marks the start of one row's statements. A backend whose transaction is poisoned by
    /// a failed statement sets a savepoint here.
    async fn begin_row(&mut self) -> CustomResult<()> {
        Ok(())
    }

    /// Ends the row started by `begin_row`, keeping its writes when `keep` is set and
    /// undoing them otherwise.
    async fn end_row(&mut self, keep: bool) -> CustomResult<()> {
        let _ = keep;
        Ok(())
    }

    async fn case_exists(&mut self, title: &str) -> CustomResult<bool>;

    async fn insert_case(&mut self, case: &CaseRecord) -> CustomResult<()>;

    /// Returns the number of deleted rows.
    async fn delete_case_articles(&mut self) -> CustomResult<u64>;

    /// Fails with `DbTransaction` when the transaction was aborted and nothing was kept.
    async fn commit(&mut self) -> CustomResult<()>;

    async fn rollback(&mut self) -> CustomResult<()>;

    async fn count_cases(&mut self) -> CustomResult<u64>;

    async fn count_case_articles(&mut self) -> CustomResult<u64>;

    async fn close(&mut self);
}
