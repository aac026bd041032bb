//! Whole-document conversion between plain and encrypted form.
//!
//! The converted document is created before the source is deleted, so an
//! interruption leaves a duplicate rather than nothing.  When source and
//! target paths coincide the document is overwritten in place.

use tracing::debug;
use zeroize::Zeroizing;

use super::{open_envelope, seal_envelope};
use crate::cache::Credential;
use crate::context::Context;
use crate::envelope::{looks_encrypted_bytes, Envelope, DEFAULT_KIND};
use crate::errors::{NotelockError, Result};
use crate::notify::Notice;
use crate::store::Document;

/// Encrypt a plain document into `<stem>.<encrypted extension>`.
///
/// Fails with `AlreadyEncrypted` if the content is already an envelope.
/// Returns the encrypted document.
pub async fn encrypt_document(
    ctx: &Context,
    doc: &Document,
    credential: &Credential,
) -> Result<Document> {
    let result = transform_encrypt(ctx, doc, credential).await;
    report(ctx, doc, "Encrypted", "Encryption", &result);
    result
}

/// Decrypt an encrypted document back to `<stem>.<original kind>`.
///
/// A wrong password is `AuthenticationFailed` and nothing changes.
/// Returns the decrypted document.
pub async fn decrypt_document(
    ctx: &Context,
    doc: &Document,
    credential: &Credential,
) -> Result<Document> {
    let result = transform_decrypt(ctx, doc, credential).await;
    report(ctx, doc, "Decrypted", "Decryption", &result);
    result
}

/// Create a new, empty encrypted note at `doc`.
pub async fn create_encrypted(ctx: &Context, doc: &Document, credential: &Credential) -> Result<()> {
    if credential.is_unknown() {
        return Err(NotelockError::InvalidContent(
            "password must not be empty".into(),
        ));
    }

    let envelope = seal_envelope(
        Zeroizing::new(Vec::new()),
        credential.clone(),
        Some(DEFAULT_KIND.to_string()),
    )
    .await?;
    let result = ctx.store.create(doc, envelope.encode()?.as_bytes()).await;

    match &result {
        Ok(()) => {
            ctx.cache.put(credential, doc).await;
            ctx.notify(Notice::success(format!("Created encrypted note {doc}")));
        }
        Err(e) => ctx.notify(Notice::error(format!("Cannot create {doc}: {e}"))),
    }
    result
}

/// Encrypt without notifying; the bulk engine reports in aggregate.
pub(crate) async fn transform_encrypt(
    ctx: &Context,
    doc: &Document,
    credential: &Credential,
) -> Result<Document> {
    if credential.is_unknown() {
        return Err(NotelockError::InvalidContent(
            "password must not be empty".into(),
        ));
    }

    let raw = Zeroizing::new(ctx.store.read(doc).await?);
    if looks_encrypted_bytes(&raw) {
        return Err(NotelockError::AlreadyEncrypted(doc.to_string()));
    }

    let original_kind = doc.extension().unwrap_or(DEFAULT_KIND).to_string();
    let target = doc.with_extension(&ctx.settings.encrypted_extension);

    let envelope = seal_envelope(raw, credential.clone(), Some(original_kind)).await?;
    replace(ctx, doc, &target, envelope.encode()?.as_bytes()).await?;

    ctx.cache.put(credential, &target).await;
    debug!(from = %doc, to = %target, "document encrypted");
    Ok(target)
}

/// Decrypt without notifying; the bulk engine reports in aggregate.
pub(crate) async fn transform_decrypt(
    ctx: &Context,
    doc: &Document,
    credential: &Credential,
) -> Result<Document> {
    let raw = ctx.store.read(doc).await?;
    let envelope = Envelope::decode_bytes(&raw)?;
    let original_kind = envelope
        .original_kind
        .clone()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_KIND.to_string());
    let hint = envelope.hint.clone();

    let plaintext = open_envelope(envelope, credential.clone()).await?;

    let target = doc.with_extension(&original_kind);
    replace(ctx, doc, &target, &plaintext).await?;

    ctx.cache.put(&credential.with_hint(hint), &target).await;
    debug!(from = %doc, to = %target, "document decrypted");
    Ok(target)
}

/// Put `data` at `target` and retire `source`.
async fn replace(ctx: &Context, source: &Document, target: &Document, data: &[u8]) -> Result<()> {
    if source == target {
        return ctx.store.write(source, data).await;
    }
    if ctx.store.exists(target).await? {
        return Err(NotelockError::DocumentExists(target.to_string()));
    }
    ctx.store.create(target, data).await?;
    ctx.store.delete(source).await?;
    ctx.cache.rename(source, target).await;
    Ok(())
}

fn report(ctx: &Context, doc: &Document, done: &str, what: &str, result: &Result<Document>) {
    match result {
        Ok(target) => ctx.notify(Notice::success(format!("{done} {doc} -> {target}"))),
        Err(e) if e.is_cancelled() => {}
        Err(e) => ctx.notify(Notice::error(format!("{what} failed for {doc}: {e}"))),
    }
}
