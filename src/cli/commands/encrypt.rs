//! `notelock encrypt`: convert one plain document to encrypted form.
//!
//! Writes `<stem>.<encrypted_extension>` next to the original, then
//! removes the original.

use crate::cli::{document_arg, load_context, Cli, DialoguerPrompter};
use crate::errors::{NotelockError, Result};
use crate::prompt::{PasswordPrompter, PromptRequest};
use crate::session::encrypt_document;

/// Execute the `encrypt` command.
pub async fn execute(cli: &Cli, path: &str, hint: Option<&str>) -> Result<()> {
    let ctx = load_context(cli).await?;
    let doc = document_arg(path)?;

    let request = PromptRequest::encrypt(
        format!("Password for {}", doc.name()),
        Some(&doc),
        ctx.settings.confirm_password,
    );
    let credential = DialoguerPrompter::with_hint(hint)
        .request(request)
        .await
        .ok_or(NotelockError::UserCancelled)?;

    let result = encrypt_document(&ctx, &doc, &credential).await.map(|_| ());
    ctx.shutdown().await;
    result
}
