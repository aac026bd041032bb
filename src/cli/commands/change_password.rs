//! `notelock change-password`: re-encrypt a document under a new password.
//!
//! Opens the document with its current password, asks for the new one,
//! and overwrites the envelope atomically.  If the write fails the old
//! password still opens the document.

use crate::cli::{document_arg, load_context, output, Cli, DialoguerPrompter};
use crate::errors::{NotelockError, Result};
use crate::prompt::{PasswordPrompter, PromptRequest};
use crate::session::{SavePolicy, Session};

/// Execute the `change-password` command.
pub async fn execute(cli: &Cli, path: &str, hint: Option<&str>) -> Result<()> {
    let ctx = load_context(cli).await?.with_save_policy(SavePolicy::Manual);
    let doc = document_arg(path)?;

    // 1. Open with the current password.
    output::info("Enter the current password.");
    let session = Session::open_interactive(&ctx, &doc, &DialoguerPrompter::new())
        .await?
        .ok_or(NotelockError::UserCancelled)?;

    // 2. Ask for the new one; the current hint is offered for editing.
    output::info("Choose the new password.");
    let request = PromptRequest::encrypt(
        format!("New password for {}", doc.name()),
        Some(&doc),
        ctx.settings.confirm_password,
    )
    .with_hint(session.hint().await);

    let prompter = DialoguerPrompter::for_new_password(hint);
    let Some(credential) = prompter.request(request).await else {
        session.lock_and_close().await;
        return Err(NotelockError::UserCancelled);
    };

    // 3. Re-encrypt and write.
    let result = session.change_password(credential).await;
    session.lock_and_close().await;
    ctx.shutdown().await;
    result
}
