//! Writing a session back to the store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{seal_envelope, Session, SessionState, Shared};
use crate::cache::Credential;
use crate::errors::{NotelockError, Result};
use crate::notify::Notice;
use crate::store::Document;

impl Shared {
    /// Save the latest revision if it is not saved yet.
    async fn save(&self) -> Result<()> {
        let _in_flight = self.save_lock.lock().await;

        let (document, plaintext, credential, original_kind, revision) = {
            let mut data = self.data.lock().await;
            data.ensure_open()?;
            if !data.is_dirty() {
                return Ok(());
            }
            data.state = SessionState::Saving;
            (
                data.document.clone(),
                data.plaintext.clone(),
                data.credential.clone(),
                data.original_kind.clone(),
                data.revision,
            )
        };

        let result = self
            .write_sealed(&document, plaintext, &credential, original_kind)
            .await;

        let mut data = self.data.lock().await;
        match result {
            Ok(()) => {
                data.saved_revision = revision;
                data.settle();
                drop(data);
                self.ctx.cache.put(&credential, &document).await;
                debug!(path = %document, revision, "saved");
                self.ctx.notify(Notice::success(format!("Saved {document}")));
                Ok(())
            }
            Err(e) => {
                data.settle();
                drop(data);
                self.report_failure(&document, "Save", &e);
                Err(e)
            }
        }
    }

    /// Seal and overwrite, unless the session ended while sealing.
    async fn write_sealed(
        &self,
        document: &Document,
        plaintext: Zeroizing<Vec<u8>>,
        credential: &Credential,
        original_kind: Option<String>,
    ) -> Result<()> {
        let envelope = seal_envelope(plaintext, credential.clone(), original_kind).await?;
        let encoded = envelope.encode()?;

        self.data.lock().await.ensure_open()?;
        self.ctx.store.write(document, encoded.as_bytes()).await
    }

    fn report_failure(&self, document: &Document, what: &str, err: &NotelockError) {
        if matches!(err, NotelockError::SessionClosed(_)) {
            debug!(path = %document, "{what} skipped, session ended");
            return;
        }
        warn!(path = %document, error = %err, "{what} failed");
        self.ctx
            .notify(Notice::error(format!("{what} failed for {document}: {err}")));
    }
}

impl Session {
    /// Save now.  Cancels a pending debounced save.
    pub async fn save(&self) -> Result<()> {
        self.shared.data.lock().await.cancel_timer();
        self.shared.save().await
    }

    /// (Re)start the debounce timer.
    pub(super) async fn schedule_save(&self, delay: Duration) {
        let mut data = self.shared.data.lock().await;
        data.cancel_timer();
        let generation = data.timer_generation;
        let shared = Arc::clone(&self.shared);

        data.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut data = shared.data.lock().await;
                if data.timer_generation != generation {
                    return;
                }
                // From here on nothing aborts this task.
                data.timer = None;
            }
            // Failures were already reported.
            let _ = shared.save().await;
        }));
    }

    /// Re-encrypt with `credential` and make it the session's password.
    ///
    /// If the write fails the old password stays in force.
    pub async fn change_password(&self, credential: Credential) -> Result<()> {
        if credential.is_unknown() {
            return Err(NotelockError::InvalidContent(
                "new password must not be empty".into(),
            ));
        }

        let shared = &self.shared;
        let _in_flight = shared.save_lock.lock().await;

        let (document, plaintext, original_kind, revision) = {
            let mut data = shared.data.lock().await;
            data.ensure_open()?;
            data.state = SessionState::Saving;
            (
                data.document.clone(),
                data.plaintext.clone(),
                data.original_kind.clone(),
                data.revision,
            )
        };

        let result = shared
            .write_sealed(&document, plaintext, &credential, original_kind)
            .await;

        let mut data = shared.data.lock().await;
        match result {
            Ok(()) => {
                data.credential = credential.clone();
                data.saved_revision = revision;
                data.settle();
                drop(data);
                shared.ctx.cache.put(&credential, &document).await;
                shared
                    .ctx
                    .notify(Notice::success(format!("Password changed for {document}")));
                Ok(())
            }
            Err(e) => {
                data.settle();
                drop(data);
                shared.report_failure(&document, "Password change", &e);
                Err(e)
            }
        }
    }
}
