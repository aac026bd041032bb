//! `notelock cat`: print a decrypted document to stdout.

use std::io::Write;

use crate::cli::{document_arg, load_context, Cli, DialoguerPrompter};
use crate::errors::{NotelockError, Result};
use crate::session::Session;

/// Execute the `cat` command.
pub async fn execute(cli: &Cli, path: &str) -> Result<()> {
    let ctx = load_context(cli).await?;
    let doc = document_arg(path)?;

    let session = Session::open_interactive(&ctx, &doc, &DialoguerPrompter::new())
        .await?
        .ok_or(NotelockError::UserCancelled)?;

    let plaintext = session.plaintext().await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.flush()?;

    session.close().await?;
    ctx.shutdown().await;
    Ok(())
}
