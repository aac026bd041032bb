//! `notelock encrypt-all` / `notelock decrypt-all`: vault-wide conversion.

use crate::bulk::{BulkEngine, BulkReport, IgnorePatterns};
use crate::cli::{load_context, output, Cli, DialoguerPrompter};
use crate::context::Context;
use crate::errors::{NotelockError, Result};

/// Execute the `encrypt-all` command.
pub async fn execute_encrypt_all(cli: &Cli, ignore: &[String], yes: bool) -> Result<()> {
    let ctx = load_context(cli).await?;
    if !yes && !confirm("Encrypt every plain note in this vault?")? {
        return Err(NotelockError::UserCancelled);
    }

    let patterns = patterns(&ctx, ignore)?;
    let engine = BulkEngine::new(ctx.clone());
    let report = engine
        .encrypt_all(&patterns, &DialoguerPrompter::new())
        .await;
    finish(&ctx, report).await
}

/// Execute the `decrypt-all` command.
pub async fn execute_decrypt_all(cli: &Cli, ignore: &[String], yes: bool) -> Result<()> {
    let ctx = load_context(cli).await?;
    if !yes && !confirm("Decrypt every encrypted document in this vault?")? {
        return Err(NotelockError::UserCancelled);
    }

    let patterns = patterns(&ctx, ignore)?;
    let engine = BulkEngine::new(ctx.clone());
    let report = engine
        .decrypt_all(&patterns, &DialoguerPrompter::new())
        .await;
    finish(&ctx, report).await
}

/// Configured patterns plus the ones given on the command line.
fn patterns(ctx: &Context, extra: &[String]) -> Result<IgnorePatterns> {
    IgnorePatterns::new(ctx.settings.bulk_ignore_paths.iter().chain(extra))
}

fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| NotelockError::CommandFailed(format!("confirmation prompt: {e}")))
}

async fn finish(ctx: &Context, report: Result<BulkReport>) -> Result<()> {
    ctx.shutdown().await;
    let report = report?;
    output::print_bulk_report(&report);
    if report.failed > 0 {
        return Err(NotelockError::CommandFailed(format!(
            "{} document(s) could not be converted",
            report.failed
        )));
    }
    Ok(())
}
