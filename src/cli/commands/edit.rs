//! `notelock edit`: edit a decrypted note in an editor.
//!
//! Decrypts the note to a private temporary file, launches `$VISUAL` /
//! `$EDITOR` / `vi`, and saves the edited text back through the session.
//! The session is locked afterwards either way.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use zeroize::Zeroize;

use crate::cli::{document_arg, load_context, output, Cli, DialoguerPrompter};
use crate::envelope::{ContentKind, DEFAULT_KIND};
use crate::errors::{NotelockError, Result};
use crate::session::{SavePolicy, Session};

/// Execute the `edit` command.
pub async fn execute(cli: &Cli, path: &str) -> Result<()> {
    let ctx = load_context(cli).await?.with_save_policy(SavePolicy::Manual);
    let doc = document_arg(path)?;

    let session = Session::open_interactive(&ctx, &doc, &DialoguerPrompter::new())
        .await?
        .ok_or(NotelockError::UserCancelled)?;

    let original_kind = session.original_kind().await;
    if ContentKind::from_original_kind(original_kind.as_deref()) == ContentKind::Binary {
        session.lock_and_close().await;
        return Err(NotelockError::EditorError(format!(
            "{doc} holds binary content and cannot be edited as text"
        )));
    }

    let result = edit_session(&session, original_kind.as_deref()).await;
    session.lock_and_close().await;
    ctx.shutdown().await;
    result
}

async fn edit_session(session: &Session, extension: Option<&str>) -> Result<()> {
    let original = session.text().await?;
    let tmp_path = write_temp_file(&original, extension)?;

    let editor = find_editor();
    let status = match run_editor(&editor, &tmp_path).await {
        Ok(status) => status,
        Err(e) => {
            secure_delete(&tmp_path);
            return Err(e);
        }
    };
    if !status.success() {
        secure_delete(&tmp_path);
        return Err(NotelockError::EditorError(format!(
            "editor exited with code {}",
            status.code().unwrap_or(-1)
        )));
    }

    let edited = fs::read_to_string(&tmp_path)
        .map_err(|e| NotelockError::EditorError(format!("failed to read edited file: {e}")));

    secure_delete(&tmp_path);
    let mut edited = edited?;

    if edited.as_str() == original.as_str() {
        edited.zeroize();
        output::info("No changes detected.");
        return Ok(());
    }

    let saved = async {
        session.set_text(&edited).await?;
        session.save().await
    }
    .await;
    edited.zeroize();
    saved
}

/// Launch the editor on a blocking thread and wait for it.
async fn run_editor(editor: &str, file: &Path) -> Result<ExitStatus> {
    let editor = editor.to_string();
    let file = file.to_path_buf();
    tokio::task::spawn_blocking(move || {
        Command::new(&editor)
            .arg(&file)
            .status()
            .map_err(|e| NotelockError::EditorError(format!("failed to launch '{editor}': {e}")))
    })
    .await
    .map_err(|e| NotelockError::TaskFailed(e.to_string()))?
}

/// Private scratch file holding `text`, named after the note's kind so
/// the editor picks a matching syntax mode.
fn write_temp_file(text: &str, extension: Option<&str>) -> Result<PathBuf> {
    let extension = extension.filter(|ext| !ext.is_empty()).unwrap_or(DEFAULT_KIND);
    let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let path = std::env::temp_dir().join(format!(
        "notelock-edit-{}-{stamp}.{extension}",
        std::process::id()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&path)
        .map_err(|e| NotelockError::EditorError(format!("cannot create scratch file: {e}")))?;

    file.write_all(text.as_bytes())?;
    file.flush()?;
    Ok(path)
}

/// `$VISUAL`, then `$EDITOR`, then `vi`.
fn find_editor() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Zero the scratch file, then remove it.  Errors are ignored.
fn secure_delete(path: &Path) {
    let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if len > 0 {
        if let Ok(mut file) = fs::OpenOptions::new().write(true).open(path) {
            let _ = file.write_all(&vec![0u8; len as usize]);
            let _ = file.sync_all();
        }
    }
    let _ = fs::remove_file(path);
}
