//! `notelock new`: create an empty encrypted note.

use crate::cli::{document_arg, load_context, Cli, DialoguerPrompter};
use crate::errors::{NotelockError, Result};
use crate::prompt::{PasswordPrompter, PromptRequest};
use crate::session::create_encrypted;
use crate::store::Document;

/// Execute the `new` command.
pub async fn execute(cli: &Cli, path: &str, hint: Option<&str>) -> Result<()> {
    let ctx = load_context(cli).await?;

    let mut doc = document_arg(path)?;
    let extension = ctx.settings.encrypted_extension.clone();
    if !doc.has_extension(&extension) {
        doc = Document::new(format!("{}.{extension}", doc.path()));
    }
    if ctx.store.exists(&doc).await? {
        return Err(NotelockError::DocumentExists(doc.to_string()));
    }

    // A remembered password for this scope is reused as-is.
    let remembered = ctx.cache.get(&doc).await;
    let credential = if remembered.is_unknown() {
        let request = PromptRequest::encrypt(
            format!("Password for {}", doc.name()),
            Some(&doc),
            ctx.settings.confirm_password,
        );
        DialoguerPrompter::with_hint(hint)
            .request(request)
            .await
            .ok_or(NotelockError::UserCancelled)?
    } else {
        match hint {
            Some(hint) => remembered.with_hint(hint),
            None => remembered,
        }
    };

    let result = create_encrypted(&ctx, &doc, &credential).await;
    ctx.shutdown().await;
    result
}
