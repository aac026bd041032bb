//! `notelock check-paths`: verify the external password files.

use crate::cli::{load_context, output, Cli};
use crate::errors::Result;

/// Execute the `check-paths` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let ctx = load_context(cli).await?;

    let mut checks = Vec::new();
    for doc in ctx.settings.external_documents() {
        let readable = ctx.cache.can_fetch_contents(&doc).await;
        checks.push((doc.to_string(), readable));
    }
    output::print_path_checks(&checks);

    if checks.iter().any(|(_, ok)| !ok) {
        output::warning("Some password files are missing or empty.");
    }
    Ok(())
}
