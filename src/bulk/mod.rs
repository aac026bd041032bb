//! Vault-wide encrypt and decrypt.
//!
//! A bulk run never stops on one document's failure, and a pending
//! prompt only holds up the documents waiting on its answer.  Every document
//! ends up counted as succeeded, failed, skipped (prompt cancelled or
//! changed during the run) or ignored (matched an ignore pattern).

pub mod ignore;

use std::fmt;
use std::future::Future;
use std::pin::pin;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info};

use crate::cache::{Credential, ScopeKey};
use crate::context::Context;
use crate::envelope::{looks_encrypted_bytes, Envelope, BINARY_KINDS, DEFAULT_KIND};
use crate::errors::{NotelockError, Result};
use crate::notify::Notice;
use crate::prompt::{PasswordPrompter, PromptRequest};
use crate::session::convert::{transform_decrypt, transform_encrypt};
use crate::store::Document;

pub use ignore::IgnorePatterns;

/// Outcome counts of one bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub ignored: usize,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.ignored
    }
}

impl fmt::Display for BulkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped, {} ignored",
            self.succeeded, self.failed, self.skipped, self.ignored
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wanted {
    Encrypted,
    Plain,
}

pub struct BulkEngine {
    ctx: Context,
}

impl BulkEngine {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    // -----------------------------------------------------------------------
    // Decrypt all
    // -----------------------------------------------------------------------

    /// Decrypt every encrypted document.
    ///
    /// Pass one decrypts documents with a remembered password while one
    /// shared password is asked for, at most once, for the rest.
    /// Cancelling that prompt skips the documents that were waiting on
    /// it.  Pass two asks per document for whatever is left; cancelling
    /// there skips only that document.
    pub async fn decrypt_all(
        &self,
        ignore: &IgnorePatterns,
        prompter: &dyn PasswordPrompter,
    ) -> Result<BulkReport> {
        let mut report = BulkReport::default();
        let encrypted = self.candidates(ignore, Wanted::Encrypted, &mut report).await?;
        if encrypted.is_empty() {
            self.ctx
                .notify(Notice::info("No encrypted documents to decrypt"));
            return Ok(report);
        }

        let remembered = join_all(encrypted.iter().map(|doc| self.ctx.cache.get(doc))).await;
        let mut known = Vec::new();
        let mut awaiting_shared = Vec::new();
        for (doc, credential) in encrypted.iter().zip(remembered) {
            if credential.is_unknown() {
                awaiting_shared.push(doc);
            } else {
                known.push((doc, credential));
            }
        }
        let shared_needed = !awaiting_shared.is_empty();

        info!(
            remembered = known.len(),
            shared = awaiting_shared.len(),
            "decrypt-all: first pass"
        );
        let remembered_pass = join_all(known.iter().map(|(doc, credential)| async move {
            (*doc, transform_decrypt(&self.ctx, doc, credential).await)
        }));
        let shared_prompt = async {
            if shared_needed {
                prompter
                    .request(PromptRequest::decrypt_shared("Decrypt all documents"))
                    .await
            } else {
                None
            }
        };
        let (remembered_results, shared) = futures::join!(remembered_pass, shared_prompt);

        for (doc, result) in remembered_results {
            match result {
                Ok(_) => report.succeeded += 1,
                Err(e) if e.is_recoverable() => awaiting_shared.push(doc),
                Err(e) => self.record_failure(&mut report, doc, &e),
            }
        }

        let retry = match shared {
            Some(shared) => {
                let results = join_all(awaiting_shared.iter().map(|doc| {
                    let shared = &shared;
                    async move { (*doc, transform_decrypt(&self.ctx, doc, shared).await) }
                }))
                .await;
                let mut retry = Vec::new();
                for (doc, result) in results {
                    match result {
                        Ok(_) => report.succeeded += 1,
                        Err(e) if e.is_recoverable() => retry.push(doc),
                        Err(e) => self.record_failure(&mut report, doc, &e),
                    }
                }
                retry
            }
            None if shared_needed => {
                debug!(count = awaiting_shared.len(), "shared prompt cancelled");
                report.skipped += awaiting_shared.len();
                self.summarize("Decrypted", &report);
                return Ok(report);
            }
            None => awaiting_shared,
        };

        if !retry.is_empty() {
            info!(count = retry.len(), "decrypt-all: per-document pass");
        }
        for doc in retry {
            self.decrypt_one_interactively(doc, prompter, &mut report)
                .await;
        }

        self.summarize("Decrypted", &report);
        Ok(report)
    }

    async fn decrypt_one_interactively(
        &self,
        doc: &Document,
        prompter: &dyn PasswordPrompter,
        report: &mut BulkReport,
    ) {
        let hint = match self.hint_of(doc).await {
            Ok(hint) => hint,
            Err(e) => return self.record_failure(report, doc, &e),
        };

        let mut failed_attempts = 0;
        loop {
            let request = PromptRequest::decrypt(format!("Decrypt {}", doc.name()), doc, &hint)
                .after_failures(failed_attempts);
            let Some(credential) = prompter.request(request).await else {
                debug!(path = %doc, "skipped by user");
                report.skipped += 1;
                return;
            };

            match transform_decrypt(&self.ctx, doc, &credential).await {
                Ok(_) => {
                    report.succeeded += 1;
                    return;
                }
                Err(e) if e.is_recoverable() => failed_attempts += 1,
                Err(e) => return self.record_failure(report, doc, &e),
            }
        }
    }

    async fn hint_of(&self, doc: &Document) -> Result<String> {
        let raw = self.ctx.store.read(doc).await?;
        Ok(Envelope::decode_bytes(&raw)?.hint)
    }

    // -----------------------------------------------------------------------
    // Encrypt all
    // -----------------------------------------------------------------------

    /// Encrypt every plain note and image.
    ///
    /// One password is chosen per scope of the active level: a single one
    /// at vault level, one per folder or per document otherwise.  Scopes
    /// with a remembered password start right away; the others are asked
    /// for one at a time while those conversions keep running.
    /// Cancelling a prompt skips every document in that scope.  Each
    /// document is re-checked right before it is encrypted and skipped
    /// if it became encrypted meanwhile.
    pub async fn encrypt_all(
        &self,
        ignore: &IgnorePatterns,
        prompter: &dyn PasswordPrompter,
    ) -> Result<BulkReport> {
        let mut report = BulkReport::default();
        let plain = self.candidates(ignore, Wanted::Plain, &mut report).await?;
        if plain.is_empty() {
            self.ctx.notify(Notice::info("No plain documents to encrypt"));
            return Ok(report);
        }

        let mut scopes: Vec<(Option<ScopeKey>, Vec<Document>)> = Vec::new();
        for doc in plain {
            let key = self.ctx.cache.scope_key(&doc).await;
            match scopes.iter_mut().find(|(k, _)| *k == key) {
                Some((_, docs)) => docs.push(doc),
                None => scopes.push((key, vec![doc])),
            }
        }

        let mut running = FuturesUnordered::new();
        let mut unresolved = Vec::new();
        for (key, docs) in &scopes {
            let Some(first) = docs.first() else { continue };
            let remembered = self.ctx.cache.get(first).await;
            if remembered.is_unknown() {
                unresolved.push((key, docs));
            } else {
                for doc in docs {
                    running.push(self.encrypt_job(doc, remembered.clone()));
                }
            }
        }

        info!(scopes = scopes.len(), asking = unresolved.len(), "encrypt-all: encrypting");
        for (key, docs) in unresolved {
            let Some(first) = docs.first() else { continue };
            let answer = {
                let mut prompt = pin!(self.ask_scope_credential(first, key.as_ref(), prompter));
                loop {
                    tokio::select! {
                        answer = &mut prompt => break answer,
                        Some((doc, result)) = running.next(), if !running.is_empty() => {
                            self.record_encrypted(&mut report, doc, result);
                        }
                    }
                }
            };
            match answer {
                Some(credential) => {
                    for doc in docs {
                        running.push(self.encrypt_job(doc, credential.clone()));
                    }
                }
                None => {
                    debug!(count = docs.len(), "scope skipped by user");
                    report.skipped += docs.len();
                }
            }
        }
        while let Some((doc, result)) = running.next().await {
            self.record_encrypted(&mut report, doc, result);
        }

        self.summarize("Encrypted", &report);
        Ok(report)
    }

    fn encrypt_job<'a>(
        &'a self,
        doc: &'a Document,
        credential: Credential,
    ) -> impl Future<Output = (&'a Document, Result<Document>)> + 'a {
        async move {
            let result = transform_encrypt(&self.ctx, doc, &credential).await;
            (doc, result)
        }
    }

    fn record_encrypted(&self, report: &mut BulkReport, doc: &Document, result: Result<Document>) {
        match result {
            Ok(_) => report.succeeded += 1,
            Err(NotelockError::AlreadyEncrypted(_)) => {
                debug!(path = %doc, "encrypted by someone else during the run");
                report.skipped += 1;
            }
            Err(e) => self.record_failure(report, doc, &e),
        }
    }

    /// Ask for the password of one scope.  `None` if cancelled.
    async fn ask_scope_credential(
        &self,
        doc: &Document,
        key: Option<&ScopeKey>,
        prompter: &dyn PasswordPrompter,
    ) -> Option<Credential> {
        let confirm = self.ctx.settings.confirm_password;
        let request = match key {
            Some(ScopeKey::Folder(folder)) if folder.is_empty() => {
                PromptRequest::encrypt("Encrypt notes in the vault root", None, confirm)
            }
            Some(ScopeKey::Folder(folder)) => {
                PromptRequest::encrypt(format!("Encrypt notes in {folder}"), None, confirm)
            }
            Some(ScopeKey::File(_)) => {
                PromptRequest::encrypt(format!("Encrypt {}", doc.name()), Some(doc), confirm)
            }
            Some(ScopeKey::Vault) | None => {
                PromptRequest::encrypt("Encrypt all notes", None, confirm)
            }
        };
        prompter.request(request).await
    }

    // -----------------------------------------------------------------------
    // Shared
    // -----------------------------------------------------------------------

    /// Enumerate, drop ignored documents and keep those of the wanted form.
    async fn candidates(
        &self,
        ignore: &IgnorePatterns,
        wanted: Wanted,
        report: &mut BulkReport,
    ) -> Result<Vec<Document>> {
        let mut considered = Vec::new();
        for doc in self.ctx.store.enumerate().await? {
            if let Some(pattern) = ignore.matching(&doc) {
                debug!(path = %doc, pattern, "ignored");
                report.ignored += 1;
                continue;
            }
            if wanted == Wanted::Plain && !is_convertible(&doc) {
                continue;
            }
            considered.push(doc);
        }

        let contents = join_all(considered.iter().map(|doc| self.ctx.store.read(doc))).await;

        let mut selected = Vec::new();
        for (doc, content) in considered.into_iter().zip(contents) {
            match content {
                Ok(raw) => {
                    let encrypted = looks_encrypted_bytes(&raw);
                    if encrypted == (wanted == Wanted::Encrypted) {
                        selected.push(doc);
                    }
                }
                Err(e) => self.record_failure(report, &doc, &e),
            }
        }
        Ok(selected)
    }

    fn record_failure(&self, report: &mut BulkReport, doc: &Document, err: &NotelockError) {
        report.failed += 1;
        self.ctx
            .notify(Notice::error(format!("Skipping {doc}: {err}")));
    }

    fn summarize(&self, done: &str, report: &BulkReport) {
        let message = format!("{done} {} document(s) ({report})", report.succeeded);
        if report.failed > 0 {
            self.ctx.notify(Notice::warning(message));
        } else {
            self.ctx.notify(Notice::success(message));
        }
    }
}

/// Notes and the image kinds the envelope can carry.
fn is_convertible(doc: &Document) -> bool {
    doc.has_extension(DEFAULT_KIND) || BINARY_KINDS.iter().any(|kind| doc.has_extension(kind))
}
