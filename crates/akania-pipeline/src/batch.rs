use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use akania_core::query::CompanyQuery;

use crate::controller::ProfilePipeline;

const COMMENT_MARKER: char = '#';

/// One company identifier per line; blank lines and `#` comments skipped.
pub fn parse_batch_input(input: &str) -> Vec<CompanyQuery> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(CompanyQuery::new)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub query: String,
    pub company_name: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn any_succeeded(&self) -> bool {
        self.successful > 0
    }
}

/// Runs every company through `pipeline`, at most `concurrency` at a time.
/// Individual failures, including failed saves, are counted and never stop
/// the batch. Entries keep input order.
pub async fn run_batch(
    pipeline: Arc<ProfilePipeline>,
    companies: Vec<CompanyQuery>,
    concurrency: usize,
) -> BatchReport {
    let total = companies.len();
    info!(total, concurrency, "Starting batch extraction");

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (i, company) in companies.iter().cloned().enumerate() {
        let pipeline = pipeline.clone();
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            info!(index = i + 1, total, company = %company, "Processing company");
            (i, pipeline.run(&company).await)
        });
    }

    let mut slots: Vec<Option<BatchEntry>> = vec![None; total];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((i, Ok(outcome))) => {
                slots[i] = Some(BatchEntry {
                    query: companies[i].to_string(),
                    company_name: outcome
                        .profile
                        .as_ref()
                        .and_then(|p| p.name().map(String::from)),
                    success: outcome.is_success(),
                    error: None,
                });
            }
            Ok((i, Err(e))) => {
                error!(company = %companies[i], error = %e, "Extraction failed");
                slots[i] = Some(BatchEntry {
                    query: companies[i].to_string(),
                    company_name: None,
                    success: false,
                    error: Some(e.to_string()),
                });
            }
            Err(join_err) => {
                error!(error = %join_err, "Batch task panicked");
            }
        }
    }

    let entries: Vec<BatchEntry> = slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.unwrap_or_else(|| BatchEntry {
                query: companies[i].to_string(),
                company_name: None,
                success: false,
                error: Some("task aborted".to_string()),
            })
        })
        .collect();

    let successful = entries.iter().filter(|e| e.success).count();
    let report = BatchReport {
        total,
        successful,
        failed: total - successful,
        entries,
    };

    info!(
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "Batch extraction complete"
    );
    report
}
