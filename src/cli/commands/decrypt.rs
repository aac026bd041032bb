//! `notelock decrypt`: convert one encrypted document back to plain form.

use crate::cache::Credential;
use crate::cli::{document_arg, load_context, Cli, DialoguerPrompter};
use crate::context::Context;
use crate::envelope::Envelope;
use crate::errors::{NotelockError, Result};
use crate::prompt::{PasswordPrompter, PromptRequest};
use crate::session::decrypt_document;
use crate::store::Document;

/// Execute the `decrypt` command.
pub async fn execute(cli: &Cli, path: &str) -> Result<()> {
    let ctx = load_context(cli).await?;
    let doc = document_arg(path)?;

    let result = decrypt_with_retry(&ctx, &doc, &DialoguerPrompter::new()).await;
    ctx.shutdown().await;
    result
}

/// Try the remembered password, then prompt until one works or the user gives up.
async fn decrypt_with_retry(
    ctx: &Context,
    doc: &Document,
    prompter: &dyn PasswordPrompter,
) -> Result<()> {
    let raw = ctx.store.read(doc).await?;
    let hint = Envelope::decode_bytes(&raw)?.hint;

    let mut credential = ctx.cache.get(doc).await;
    let mut failed_attempts = 0;
    loop {
        if credential.is_unknown() {
            let request = PromptRequest::decrypt(format!("Decrypt {}", doc.name()), doc, &hint)
                .after_failures(failed_attempts);
            credential = prompter
                .request(request)
                .await
                .ok_or(NotelockError::UserCancelled)?;
        }

        match decrypt_document(ctx, doc, &credential).await {
            Ok(_) => return Ok(()),
            Err(e) if e.is_recoverable() => {
                failed_attempts += 1;
                credential = Credential::unknown();
            }
            Err(e) => return Err(e),
        }
    }
}
