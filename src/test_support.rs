use std::collections::HashSet;

use crate::error::{CustomError, CustomResult};
use crate::models::{CaseRecord, SourceRecord};
use crate::traits::CaseStore;

/// In-memory store with staged writes, so commit and rollback behave like a transaction.
///
/// A failed statement aborts the transaction the way Postgres does: every later statement
/// fails until the row is undone with `end_row(false)` or the transaction ends.
#[derive(Debug, Default)]
pub struct MemoryCaseStore {
    pub case_category: String,
    pub articles: Vec<SourceRecord>,
    pub cases: Vec<CaseRecord>,
    pub staged_cases: Vec<CaseRecord>,
    pub staged_deletes: Vec<SourceRecord>,
    pub fail_insert_for: HashSet<String>,
    pub fail_exists_for: HashSet<String>,
    pub ignore_row_marks: bool,
    pub aborted: bool,
    pub row_mark: Option<usize>,
    pub fail_fetch: bool,
    pub fail_delete: bool,
    pub fail_commit: bool,
    pub delete_calls: usize,
    pub rollbacks: usize,
    pub closed: bool,
}

impl MemoryCaseStore {
    pub fn new(case_category: &str, articles: Vec<SourceRecord>) -> Self {
        Self {
            case_category: case_category.to_string(),
            articles,
            ..Self::default()
        }
    }
}

impl MemoryCaseStore {
    fn check_open(&self) -> CustomResult<()> {
        if self.aborted {
            return Err(CustomError::QueryExecution);
        }
        Ok(())
    }

    fn abort(&mut self) -> CustomError {
        self.aborted = true;
        CustomError::QueryExecution
    }
}

impl CaseStore for MemoryCaseStore {
    async fn fetch_case_articles(&mut self) -> CustomResult<Vec<SourceRecord>> {
        if self.fail_fetch {
            return Err(CustomError::DbConnection);
        }
        Ok(self
            .articles
            .iter()
            .filter(|a| a.law_type == self.case_category)
            .cloned()
            .collect())
    }

    async fn begin_row(&mut self) -> CustomResult<()> {
        if self.aborted {
            return Err(CustomError::DbTransaction);
        }
        if !self.ignore_row_marks {
            self.row_mark = Some(self.staged_cases.len());
        }
        Ok(())
    }

    async fn end_row(&mut self, keep: bool) -> CustomResult<()> {
        if let Some(mark) = self.row_mark.take() {
            if !keep {
                self.staged_cases.truncate(mark);
                self.aborted = false;
            }
        }
        Ok(())
    }

    async fn case_exists(&mut self, title: &str) -> CustomResult<bool> {
        self.check_open()?;
        if self.fail_exists_for.contains(title) {
            return Err(self.abort());
        }
        Ok(self
            .cases
            .iter()
            .chain(self.staged_cases.iter())
            .any(|c| c.title == title))
    }

    async fn insert_case(&mut self, case: &CaseRecord) -> CustomResult<()> {
        self.check_open()?;
        if self.fail_insert_for.contains(&case.title) {
            return Err(self.abort());
        }
        self.staged_cases.push(case.clone());
        Ok(())
    }

    async fn delete_case_articles(&mut self) -> CustomResult<u64> {
        self.delete_calls += 1;
        self.check_open()?;
        if self.fail_delete {
            return Err(CustomError::QueryExecution);
        }
        let (deleted, kept): (Vec<_>, Vec<_>) = self
            .articles
            .drain(..)
            .partition(|a| a.law_type == self.case_category);
        self.articles = kept;
        let count = deleted.len() as u64;
        self.staged_deletes.extend(deleted);
        Ok(count)
    }

    async fn commit(&mut self) -> CustomResult<()> {
        if self.fail_commit || self.aborted {
            self.staged_cases.clear();
            self.articles.append(&mut self.staged_deletes);
            self.aborted = false;
            return Err(CustomError::DbTransaction);
        }
        self.cases.append(&mut self.staged_cases);
        self.staged_deletes.clear();
        Ok(())
    }

    async fn rollback(&mut self) -> CustomResult<()> {
        self.rollbacks += 1;
        self.aborted = false;
        self.row_mark = None;
        self.staged_cases.clear();
        self.articles.append(&mut self.staged_deletes);
        Ok(())
    }

    async fn count_cases(&mut self) -> CustomResult<u64> {
        Ok((self.cases.len() + self.staged_cases.len()) as u64)
    }

    async fn count_case_articles(&mut self) -> CustomResult<u64> {
        Ok(self
            .articles
            .iter()
            .filter(|a| a.law_type == self.case_category)
            .count() as u64)
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
