use std::fmt;
use std::time::Instant;

use crate::config::MigrationConfig;
use crate::error::CustomResult;
use crate::extractor::extract;
use crate::logger::Logger;
use crate::models::{CaseRecord, SourceRecord};
use crate::traits::CaseStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationSummary {
    pub migrated: usize,
    pub skipped: usize,
    pub errored: usize,
    pub deleted: u64,
    pub cases_total: u64,
    pub remaining_articles: u64,
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Migration finished")?;
        writeln!(f, "  Migrated:             {}", self.migrated)?;
        writeln!(f, "  Skipped (existing):   {}", self.skipped)?;
        writeln!(f, "  Errors:               {}", self.errored)?;
        writeln!(f, "  Deleted from source:  {}", self.deleted)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Cases in destination table:     {}", self.cases_total)?;
        write!(f, "Case rows left in source table: {}", self.remaining_articles)
    }
}

enum RowOutcome {
    Migrated,
    Skipped,
}

pub struct Migrator<S: CaseStore> {
    store: S,
    config: MigrationConfig,
    logger: Logger,
}

impl<S: CaseStore> Migrator<S> {
    pub fn new(store: S, config: MigrationConfig) -> Self {
        Self {
            store,
            config,
            logger: Logger::new(),
        }
    }

    /// Runs the whole migration. On failure the open transaction is rolled back, the
    /// connection is closed and the error is returned.
    pub async fn run(&mut self) -> CustomResult<MigrationSummary> {
        let start_time = Instant::now();
        let result = self.migrate().await;

        if let Err(err) = &result {
            self.logger
                .error(format!("Migration failed, rolling back: {:?}", err).as_str());
            if let Err(rollback_err) = self.store.rollback().await {
                self.logger
                    .error(format!("Rollback failed: {:?}", rollback_err).as_str());
            }
        }
        self.store.close().await;

        self.logger
            .info(format!("Migration ran for {:?}", start_time.elapsed()).as_str());
        result
    }

    async fn migrate(&mut self) -> CustomResult<MigrationSummary> {
        let mut summary = MigrationSummary::default();

        self.logger.info("Step 1: looking up case rows");
        let articles = self.store.fetch_case_articles().await?;
        self.logger
            .info(format!("Found {} case rows", articles.len()).as_str());

        if articles.is_empty() {
            self.logger.warn("No case rows found, nothing to migrate");
            self.verify(&mut summary).await?;
            return Ok(summary);
        }

        self.logger.info("Step 2: migrating case rows");
        for article in &articles {
            self.store.begin_row().await?;
            let outcome = self.migrate_article(article).await;
            self.store.end_row(outcome.is_ok()).await?;

            match outcome {
                Ok(RowOutcome::Migrated) => {
                    summary.migrated += 1;
                    if self.config.progress_every > 0
                        && summary.migrated % self.config.progress_every == 0
                    {
                        self.logger
                            .info(format!("Migrated {} cases so far", summary.migrated).as_str());
                    }
                }
                Ok(RowOutcome::Skipped) => {
                    self.logger
                        .info(format!("Skipping existing case: {}", article.title).as_str());
                    summary.skipped += 1;
                }
                Err(err) => {
                    self.logger.error(
                        format!(
                            "Failed to migrate case {} (id {}): {:?}",
                            article.title, article.id, err
                        )
                        .as_str(),
                    );
                    summary.errored += 1;
                }
            }
        }
        self.store.commit().await?;

        // Errored and skipped rows go too; the error count is informational.
        self.logger.info("Step 3: deleting case rows from the source table");
        summary.deleted = self.store.delete_case_articles().await?;
        self.store.commit().await?;
        self.logger
            .info(format!("Deleted {} case rows", summary.deleted).as_str());

        self.verify(&mut summary).await?;

        Ok(summary)
    }

    async fn verify(&mut self, summary: &mut MigrationSummary) -> CustomResult<()> {
        summary.cases_total = self.store.count_cases().await?;
        summary.remaining_articles = self.store.count_case_articles().await?;
        Ok(())
    }

    async fn migrate_article(&mut self, article: &SourceRecord) -> CustomResult<RowOutcome> {
        let extracted = extract(article.content.as_deref());

        if self.store.case_exists(&article.title).await? {
            return Ok(RowOutcome::Skipped);
        }

        let case = CaseRecord::from_source(article, extracted, self.config.content_max_chars);
        self.store.insert_case(&case).await?;

        Ok(RowOutcome::Migrated)
    }
}
