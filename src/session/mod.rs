//! Document sessions: the lifecycle of one open encrypted document.
//!
//! Opening reads and decodes the envelope, then tries the remembered
//! password.  When no password works the caller gets a `PendingOpen`
//! back and resumes it with `submit` or abandons it with `cancel`.
//! A ready `Session` owns the plaintext until it is locked or closed.
//!
//! Saves for one document never overlap: every write goes through the
//! session's save lock.  Edits bump a revision counter, and a save
//! writes whatever the latest revision is when it starts.  An edit that
//! lands while a save is writing leaves the session dirty, and the next
//! save (the restarted debounce timer, the next immediate save or the
//! next manual trigger) picks it up.

pub mod convert;
pub mod save;
pub mod state;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::cache::Credential;
use crate::context::Context;
use crate::envelope::{looks_encrypted_bytes, view_mode, ContentKind, Envelope, ViewMode};
use crate::errors::{NotelockError, Result};
use crate::notify::Notice;
use crate::prompt::{PasswordPrompter, PromptRequest};
use crate::store::Document;

pub use convert::{create_encrypted, decrypt_document, encrypt_document};
pub use state::{SavePolicy, SessionState};

// ---------------------------------------------------------------------------
// Blocking crypto helpers
// ---------------------------------------------------------------------------

/// Decrypt on the blocking pool; key derivation is deliberately slow.
pub(crate) async fn open_envelope(
    envelope: Envelope,
    credential: Credential,
) -> Result<Zeroizing<Vec<u8>>> {
    tokio::task::spawn_blocking(move || envelope.open(credential.password()).map(Zeroizing::new))
        .await
        .map_err(|e| NotelockError::TaskFailed(e.to_string()))?
}

/// Encrypt on the blocking pool with a fresh salt and nonce.
pub(crate) async fn seal_envelope(
    plaintext: Zeroizing<Vec<u8>>,
    credential: Credential,
    original_kind: Option<String>,
) -> Result<Envelope> {
    tokio::task::spawn_blocking(move || {
        Envelope::seal(
            &plaintext,
            credential.password(),
            &credential.hint,
            original_kind.as_deref(),
        )
    })
    .await
    .map_err(|e| NotelockError::TaskFailed(e.to_string()))?
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

/// Result of trying to open a document.
pub enum OpenOutcome {
    /// Decrypted; the session is clean.
    Ready(Session),
    /// No known password worked.  Resume with `submit` or `cancel`.
    NeedsCredential(PendingOpen),
}

/// An open that is waiting for the user to supply a password.
pub struct PendingOpen {
    ctx: Context,
    document: Document,
    envelope: Envelope,
    failed_attempts: u32,
}

impl PendingOpen {
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The envelope's hint, for display next to the prompt.
    pub fn hint(&self) -> &str {
        &self.envelope.hint
    }

    /// Wrong passwords submitted so far.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn state(&self) -> SessionState {
        SessionState::Prompting
    }

    /// What to ask the prompter for.
    pub fn prompt_request(&self) -> PromptRequest {
        PromptRequest::decrypt(
            format!("Decrypt {}", self.document.name()),
            &self.document,
            &self.envelope.hint,
        )
        .after_failures(self.failed_attempts)
    }

    /// Try a password.  A wrong one hands the pending open back.
    pub async fn submit(mut self, credential: Credential) -> Result<OpenOutcome> {
        if credential.is_unknown() {
            self.failed_attempts += 1;
            return Ok(OpenOutcome::NeedsCredential(self));
        }
        self.attempt(credential, false).await
    }

    /// Abandon the open.  Nothing was changed.
    pub fn cancel(self) {
        debug!(path = %self.document, "open cancelled");
    }

    async fn attempt(mut self, credential: Credential, remembered: bool) -> Result<OpenOutcome> {
        match open_envelope(self.envelope.clone(), credential.clone()).await {
            Ok(plaintext) => {
                let credential = credential.with_hint(self.envelope.hint.clone());
                self.ctx.cache.put(&credential, &self.document).await;
                debug!(path = %self.document, remembered, "document decrypted");
                self.ctx
                    .notify(Notice::success(format!("Decrypted {}", self.document)));
                let session = Session::start(
                    self.ctx,
                    self.document,
                    plaintext,
                    credential,
                    self.envelope.original_kind,
                );
                Ok(OpenOutcome::Ready(session))
            }
            Err(NotelockError::AuthenticationFailed) => {
                if !remembered {
                    self.failed_attempts += 1;
                }
                debug!(path = %self.document, remembered, "password rejected");
                Ok(OpenOutcome::NeedsCredential(self))
            }
            Err(e) => {
                self.ctx.notify(Notice::error(format!(
                    "Cannot decrypt {}: {e}",
                    self.document
                )));
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// How the session reacted to an external change of its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalChange {
    /// Still encrypted with our password; plaintext reloaded.
    Reloaded,
    /// Still encrypted, but unsaved local edits win.
    KeptLocalEdits,
    /// The document is no longer an envelope; the session closed.
    NoLongerEncrypted,
    /// Our password no longer opens it; the session locked.
    Relocked,
}

pub(crate) struct SessionData {
    document: Document,
    state: SessionState,
    plaintext: Zeroizing<Vec<u8>>,
    credential: Credential,
    original_kind: Option<String>,
    revision: u64,
    saved_revision: u64,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
}

impl SessionData {
    fn ensure_open(&self) -> Result<()> {
        if self.state.is_terminal() {
            Err(NotelockError::SessionClosed(self.document.to_string()))
        } else {
            Ok(())
        }
    }

    fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Recompute Clean/Dirty after a save finished, unless terminal.
    fn settle(&mut self) {
        if !self.state.is_terminal() {
            self.state = if self.is_dirty() {
                SessionState::Dirty
            } else {
                SessionState::Clean
            };
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.timer_generation += 1;
    }

    fn discard_plaintext(&mut self) {
        self.plaintext = Zeroizing::new(Vec::new());
    }
}

pub(crate) struct Shared {
    ctx: Context,
    policy: SavePolicy,
    save_lock: Mutex<()>,
    data: Mutex<SessionData>,
}

/// A decrypted, open document.  Clones share the same session.
///
/// Saves are serialized per session.  Hosts keep at most one session per
/// document; two sessions on the same document may write concurrently
/// (each write is still atomic, the last one wins).
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    /// Read and decode `doc`, then try the remembered password.
    ///
    /// Content that is not an envelope fails with `EnvelopeFormat`; the
    /// caller should treat it as plain data.
    pub async fn open(ctx: &Context, doc: &Document) -> Result<OpenOutcome> {
        let raw = ctx.store.read(doc).await?;
        let envelope = Envelope::decode_bytes(&raw)?;

        let pending = PendingOpen {
            ctx: ctx.clone(),
            document: doc.clone(),
            envelope,
            failed_attempts: 0,
        };

        let remembered = ctx.cache.get(doc).await;
        if remembered.is_unknown() {
            debug!(path = %doc, "no remembered password");
            return Ok(OpenOutcome::NeedsCredential(pending));
        }
        pending.attempt(remembered, true).await
    }

    /// Open, prompting until a password works.  `None` if the user cancelled.
    pub async fn open_interactive(
        ctx: &Context,
        doc: &Document,
        prompter: &dyn PasswordPrompter,
    ) -> Result<Option<Session>> {
        let mut outcome = Session::open(ctx, doc).await?;
        loop {
            match outcome {
                OpenOutcome::Ready(session) => return Ok(Some(session)),
                OpenOutcome::NeedsCredential(pending) => {
                    match prompter.request(pending.prompt_request()).await {
                        Some(credential) => outcome = pending.submit(credential).await?,
                        None => {
                            pending.cancel();
                            return Ok(None);
                        }
                    }
                }
            }
        }
    }

    fn start(
        ctx: Context,
        document: Document,
        plaintext: Zeroizing<Vec<u8>>,
        credential: Credential,
        original_kind: Option<String>,
    ) -> Self {
        let policy = ctx.save_policy();
        let data = SessionData {
            document,
            state: SessionState::Clean,
            plaintext,
            credential,
            original_kind,
            revision: 0,
            saved_revision: 0,
            timer: None,
            timer_generation: 0,
        };
        Self {
            shared: Arc::new(Shared {
                ctx,
                policy,
                save_lock: Mutex::new(()),
                data: Mutex::new(data),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub async fn document(&self) -> Document {
        self.shared.data.lock().await.document.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.shared.data.lock().await.state
    }

    pub async fn hint(&self) -> String {
        self.shared.data.lock().await.credential.hint.clone()
    }

    pub async fn original_kind(&self) -> Option<String> {
        self.shared.data.lock().await.original_kind.clone()
    }

    pub async fn view_mode(&self) -> ViewMode {
        let data = self.shared.data.lock().await;
        view_mode(data.original_kind.as_deref(), data.state.is_decrypted())
    }

    pub fn save_policy(&self) -> SavePolicy {
        self.shared.policy
    }

    /// A copy of the current plaintext.
    pub async fn plaintext(&self) -> Result<Zeroizing<Vec<u8>>> {
        let data = self.shared.data.lock().await;
        data.ensure_open()?;
        Ok(data.plaintext.clone())
    }

    /// The plaintext as text.
    pub async fn text(&self) -> Result<Zeroizing<String>> {
        let bytes = self.plaintext().await?;
        std::str::from_utf8(&bytes)
            .map(|s| Zeroizing::new(s.to_string()))
            .map_err(|_| NotelockError::InvalidContent("document is not text".into()))
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Replace the plaintext and apply the save policy.
    ///
    /// Text documents must stay valid UTF-8.  Under the immediate policy
    /// the returned error is the save's.
    pub async fn set_plaintext(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let bytes = Zeroizing::new(bytes.into());
        {
            let mut data = self.shared.data.lock().await;
            data.ensure_open()?;

            let kind = ContentKind::from_original_kind(data.original_kind.as_deref());
            if kind == ContentKind::Text && std::str::from_utf8(&bytes).is_err() {
                return Err(NotelockError::InvalidContent(
                    "text documents must be valid UTF-8".into(),
                ));
            }
            if *data.plaintext == *bytes {
                return Ok(());
            }

            data.plaintext = bytes;
            data.revision += 1;
            data.state = SessionState::Dirty;
        }

        match self.shared.policy {
            SavePolicy::Immediate => self.save().await,
            SavePolicy::Delayed(delay) => {
                self.schedule_save(delay).await;
                Ok(())
            }
            SavePolicy::Manual => Ok(()),
        }
    }

    pub async fn set_text(&self, text: &str) -> Result<()> {
        self.set_plaintext(text.as_bytes().to_vec()).await
    }

    // -----------------------------------------------------------------------
    // Ending the session
    // -----------------------------------------------------------------------

    /// Drop the plaintext and the remembered password, and end the session.
    ///
    /// A pending debounced save is cancelled.  A save already writing is
    /// allowed to finish first.
    pub async fn lock_and_close(&self) {
        let document = {
            let mut data = self.shared.data.lock().await;
            if data.state == SessionState::Locked {
                return;
            }
            data.state = SessionState::Locked;
            data.cancel_timer();
            data.document.clone()
        };

        let _in_flight = self.shared.save_lock.lock().await;
        self.shared.data.lock().await.discard_plaintext();
        self.shared.ctx.cache.clear(&document).await;

        info!(path = %document, "session locked");
        self.shared
            .ctx
            .notify(Notice::info(format!("Locked {document}")));
    }

    /// Flush unsaved edits, then end the session.
    ///
    /// If the final save fails the session stays open so it can be retried.
    pub async fn close(&self) -> Result<()> {
        {
            let mut data = self.shared.data.lock().await;
            if data.state.is_terminal() {
                return Ok(());
            }
            data.cancel_timer();
        }

        self.save().await?;

        let mut data = self.shared.data.lock().await;
        data.state = SessionState::Closed;
        data.discard_plaintext();
        debug!(path = %data.document, "session closed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Host events
    // -----------------------------------------------------------------------

    /// The host renamed the document.  The remembered password follows it.
    pub async fn on_renamed(&self, new_document: Document) -> Result<()> {
        let old = {
            let mut data = self.shared.data.lock().await;
            data.ensure_open()?;
            std::mem::replace(&mut data.document, new_document.clone())
        };
        self.shared.ctx.cache.rename(&old, &new_document).await;
        debug!(from = %old, to = %new_document, "session renamed");
        Ok(())
    }

    /// The document's stored content changed under us.
    ///
    /// Re-checks whether it is still an envelope before treating it as one.
    pub async fn on_external_change(&self) -> Result<ExternalChange> {
        let (document, credential) = {
            let data = self.shared.data.lock().await;
            data.ensure_open()?;
            (data.document.clone(), data.credential.clone())
        };

        let raw = self.shared.ctx.store.read(&document).await?;
        if !looks_encrypted_bytes(&raw) {
            let mut data = self.shared.data.lock().await;
            data.cancel_timer();
            data.state = SessionState::Closed;
            data.discard_plaintext();
            drop(data);
            self.shared.ctx.notify(Notice::warning(format!(
                "{document} is no longer encrypted; closed without saving"
            )));
            return Ok(ExternalChange::NoLongerEncrypted);
        }

        let envelope = Envelope::decode_bytes(&raw)?;
        let hint = envelope.hint.clone();
        let original_kind = envelope.original_kind.clone();

        match open_envelope(envelope, credential.clone()).await {
            Ok(plaintext) => {
                let mut data = self.shared.data.lock().await;
                data.ensure_open()?;
                if data.is_dirty() {
                    return Ok(ExternalChange::KeptLocalEdits);
                }
                data.plaintext = plaintext;
                data.original_kind = original_kind;
                data.credential = credential.with_hint(hint);
                Ok(ExternalChange::Reloaded)
            }
            Err(NotelockError::AuthenticationFailed) => {
                self.lock_and_close().await;
                Ok(ExternalChange::Relocked)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn ctx_with(doc: &str, password: &str, text: &str) -> Context {
        let envelope = Envelope::seal(text.as_bytes(), password, "hint", Some("md")).unwrap();
        let store = MemoryStore::with_documents([(doc, envelope.encode().unwrap().into_bytes())]);
        Context::headless(Arc::new(store))
            .await
            .with_save_policy(SavePolicy::Manual)
    }

    #[tokio::test]
    async fn open_without_cached_password_prompts() {
        let ctx = ctx_with("a.mdenc", "pw", "hello").await;
        let doc = Document::new("a.mdenc");

        let OpenOutcome::NeedsCredential(pending) = Session::open(&ctx, &doc).await.unwrap() else {
            panic!("expected a prompt");
        };
        assert_eq!(pending.hint(), "hint");

        let pending = match pending.submit(Credential::new("wrong", "")).await.unwrap() {
            OpenOutcome::NeedsCredential(p) => p,
            OpenOutcome::Ready(_) => panic!("wrong password accepted"),
        };
        assert_eq!(pending.failed_attempts(), 1);

        let OpenOutcome::Ready(session) = pending.submit(Credential::new("pw", "")).await.unwrap()
        else {
            panic!("right password rejected");
        };
        assert_eq!(&*session.text().await.unwrap(), "hello");
        assert_eq!(session.hint().await, "hint");
        assert_eq!(session.state().await, SessionState::Clean);
    }

    #[tokio::test]
    async fn remembered_password_opens_directly() {
        let ctx = ctx_with("a.mdenc", "pw", "hello").await;
        let doc = Document::new("a.mdenc");
        ctx.cache.put(&Credential::new("pw", ""), &doc).await;

        assert!(matches!(
            Session::open(&ctx, &doc).await.unwrap(),
            OpenOutcome::Ready(_)
        ));
    }

    #[tokio::test]
    async fn plain_content_is_not_an_envelope() {
        let store = MemoryStore::with_documents([("a.md", b"# just text".to_vec())]);
        let ctx = Context::headless(Arc::new(store)).await;
        let err = Session::open(&ctx, &Document::new("a.md")).await.err().unwrap();
        assert!(matches!(err, NotelockError::EnvelopeFormat(_)));
    }

    #[tokio::test]
    async fn empty_password_is_rejected() {
        let ctx = ctx_with("a.mdenc", "pw", "").await;
        let OpenOutcome::NeedsCredential(pending) =
            Session::open(&ctx, &Document::new("a.mdenc")).await.unwrap()
        else {
            panic!("expected a prompt");
        };
        assert!(matches!(
            pending.submit(Credential::unknown()).await.unwrap(),
            OpenOutcome::NeedsCredential(_)
        ));
    }

    #[tokio::test]
    async fn edits_mark_dirty_and_reject_bad_utf8() {
        let ctx = ctx_with("a.mdenc", "pw", "hello").await;
        let doc = Document::new("a.mdenc");
        ctx.cache.put(&Credential::new("pw", ""), &doc).await;
        let OpenOutcome::Ready(session) = Session::open(&ctx, &doc).await.unwrap() else {
            panic!("expected ready");
        };

        session.set_text("hello").await.unwrap();
        assert_eq!(session.state().await, SessionState::Clean);

        session.set_text("changed").await.unwrap();
        assert_eq!(session.state().await, SessionState::Dirty);

        let err = session.set_plaintext(vec![0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, NotelockError::InvalidContent(_)));
    }
}
