use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use akania_core::query::CompanyQuery;
use akania_pipeline::{parse_batch_input, run_batch, ExtractionOutcome};

use crate::state::AppState;

fn print_outcome(outcome: &ExtractionOutcome) -> anyhow::Result<()> {
    match (&outcome.profile, outcome.saved) {
        (Some(profile), true) => {
            println!("{}", serde_json::to_string_pretty(profile)?);
            println!(
                "\nExtracted profile for {} ({:?})",
                profile.name().unwrap_or_default(),
                outcome.resolution
            );
        }
        _ => println!("\nFailed to extract a named profile for {}", outcome.query),
    }
    Ok(())
}

/// Exit status: true when a named profile was produced and saved.
pub async fn extract_single(state: &AppState, company: &str) -> anyhow::Result<bool> {
    let pipeline = state.build_pipeline()?;
    let query = CompanyQuery::new(company);
    if query.as_str().is_empty() {
        anyhow::bail!("company identifier is empty");
    }

    tracing::info!(company = %query, "Single company extraction");
    let outcome = pipeline.run(&query).await?;
    print_outcome(&outcome)?;
    Ok(outcome.is_success())
}

/// Exit status: true when at least one company succeeded.
pub async fn extract_batch(state: &AppState, path: &Path) -> anyhow::Result<bool> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;
    let companies = parse_batch_input(&input);
    if companies.is_empty() {
        println!("No companies found in {}", path.display());
        return Ok(false);
    }

    let pipeline = Arc::new(state.build_pipeline()?);
    println!(
        "Processing {} companies from {}",
        companies.len(),
        path.display()
    );

    let report = run_batch(pipeline, companies, state.config.batch_concurrency).await;

    for entry in &report.entries {
        let status = if entry.success { "ok    " } else { "failed" };
        let detail = entry
            .company_name
            .as_deref()
            .or(entry.error.as_deref())
            .unwrap_or("-");
        println!("  [{status}] {} -> {detail}", entry.query);
    }
    println!("\nSUMMARY");
    println!("Total: {}", report.total);
    println!("Successful: {}", report.successful);
    println!("Failed: {}", report.failed);

    Ok(report.any_succeeded())
}
