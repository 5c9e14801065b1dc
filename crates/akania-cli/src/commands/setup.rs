use std::path::Path;

use crate::state::AppState;

const SAMPLE_BATCH_FILE: &str = "sample_companies.txt";
const ENV_TEMPLATE_FILE: &str = ".env.example";

const SAMPLE_COMPANIES: &str = "\
# African Companies Sample Batch File
# One company per line, comments start with #

Flutterwave Nigeria
Jumia Kenya
Andela Nigeria
Paystack Nigeria
Kuda Bank Nigeria
Sendy Kenya
Kobo360 Nigeria
Cellulant Kenya
";

const ENV_TEMPLATE: &str = "\
# Akania - environment variables

# Required: completion service
ANTHROPIC_API_KEY=your_anthropic_api_key_here
# AKANIA_MODEL=claude-haiku-4-5-20251001

# Search backends (at least one required)
TAVILY_API_KEY=your_tavily_api_key_here
SERPAPI_API_KEY=your_serpapi_key_here

# Optional
# AKANIA_DATA_DIR=data
# AKANIA_MAX_URLS=3
# AKANIA_HTTP_TIMEOUT_SECS=30
# AKANIA_BATCH_CONCURRENCY=1
";

pub fn validate_setup(state: &AppState) -> bool {
    let report = state.config.readiness();

    println!("SYSTEM VALIDATION");
    println!("{}", "=".repeat(40));
    for (component, ready) in report.components() {
        let mark = if ready { "ok     " } else { "missing" };
        println!("  [{mark}] {}", component.replace('_', " "));
    }

    if let Err(e) = state.config.validate() {
        println!("\n{e}");
    }

    if report.is_ready() {
        println!("\nSystem is ready for operation.");
        true
    } else {
        println!("\nSystem setup incomplete. Run `akania --create-sample` for a template.");
        false
    }
}

/// Writes the sample batch file and the env template into `dir`, leaving
/// existing files alone. Returns the paths written.
pub fn create_sample_files(dir: &Path) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let mut written = Vec::new();
    for (name, contents) in [
        (SAMPLE_BATCH_FILE, SAMPLE_COMPANIES),
        (ENV_TEMPLATE_FILE, ENV_TEMPLATE),
    ] {
        let path = dir.join(name);
        if path.exists() {
            tracing::debug!(path = %path.display(), "Sample file already exists");
            continue;
        }
        std::fs::write(&path, contents)?;
        println!("Created {}", path.display());
        written.push(path);
    }
    Ok(written)
}
