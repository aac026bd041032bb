//! Integration tests for vault-wide encrypt and decrypt.

mod common;

use std::time::Duration;

use common::{harness, sealed, GatedPrompter, ScriptedPrompter};
use notelock::bulk::{BulkEngine, BulkReport, IgnorePatterns};
use notelock::cache::{Credential, ScopeLevel};
use notelock::config::Settings;
use notelock::envelope::{looks_encrypted_bytes, Envelope};
use notelock::prompt::PromptPurpose;
use notelock::store::{Document, DocumentStore, MemoryStore};
use pretty_assertions::assert_eq;

fn no_ignores() -> IgnorePatterns {
    IgnorePatterns::new(Vec::<String>::new()).unwrap()
}

fn settings_at(level: ScopeLevel) -> Settings {
    Settings {
        remember_password_level: level,
        confirm_password: false,
        ..Settings::default()
    }
}

fn encrypted_vault() -> MemoryStore {
    MemoryStore::with_documents([
        ("a.mdenc", sealed("alpha", "hunter2", "")),
        ("notes/b.mdenc", sealed("beta", "hunter2", "")),
        ("notes/c.mdenc", sealed("gamma", "other", "not the usual")),
    ])
}

fn plain_vault() -> MemoryStore {
    MemoryStore::with_documents([
        ("a.md", b"# alpha".to_vec()),
        ("img.png", vec![0x89, b'P', b'N', b'G']),
        ("notes/b.md", b"# beta".to_vec()),
        ("notes/c.md", b"# gamma".to_vec()),
    ])
}

async fn read_text(store: &MemoryStore, path: &str) -> String {
    String::from_utf8(store.read(&Document::new(path)).await.unwrap()).unwrap()
}

/// Polls until `path` exists; gives up after about ten seconds.
async fn appears(store: &MemoryStore, path: &str) -> bool {
    for _ in 0..200 {
        if store.exists(&Document::new(path)).await.unwrap() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

// ---------------------------------------------------------------------------
// Decrypt all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn decrypt_all_uses_shared_password_then_asks_per_document() {
    let h = harness(encrypted_vault(), Settings::default()).await;
    let prompter = ScriptedPrompter::new([Some("hunter2"), Some("other")]);

    let report = BulkEngine::new(h.ctx.clone())
        .decrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();

    assert_eq!(
        report,
        BulkReport {
            succeeded: 3,
            ..BulkReport::default()
        }
    );
    assert_eq!(read_text(&h.store, "a.md").await, "alpha");
    assert_eq!(read_text(&h.store, "notes/c.md").await, "gamma");
    assert!(!h.store.exists(&Document::new("notes/b.mdenc")).await.unwrap());

    let requests = prompter.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].document.is_none());
    assert_eq!(
        requests[1].document.as_ref().map(Document::path),
        Some("notes/c.mdenc")
    );
    assert_eq!(requests[1].hint, "not the usual");
}

#[tokio::test]
async fn decrypt_all_skips_remembered_prompt_when_everything_is_known() {
    let h = harness(encrypted_vault(), settings_at(ScopeLevel::File)).await;
    for (path, pw) in [
        ("a.mdenc", "hunter2"),
        ("notes/b.mdenc", "hunter2"),
        ("notes/c.mdenc", "other"),
    ] {
        h.ctx
            .cache
            .put(&Credential::new(pw, ""), &Document::new(path))
            .await;
    }
    let prompter = ScriptedPrompter::default();

    let report = BulkEngine::new(h.ctx.clone())
        .decrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();
    assert_eq!(report.succeeded, 3);
    assert!(prompter.requests().is_empty());
}

#[tokio::test]
async fn decrypt_all_counts_ignored_and_skipped() {
    let store = MemoryStore::with_documents([
        ("a.mdenc", sealed("alpha", "hunter2", "")),
        ("notes/b.mdenc", sealed("beta", "hunter2", "")),
        ("notes/c.mdenc", sealed("gamma", "other", "")),
        ("Templates/daily.mdenc", sealed("template", "hunter2", "")),
    ]);
    let h = harness(store, Settings::default()).await;
    let ignore = IgnorePatterns::new(["Templates/**"]).unwrap();
    // Shared password works for two; cancel the prompt for the third.
    let prompter = ScriptedPrompter::new([Some("hunter2"), None]);

    let report = BulkEngine::new(h.ctx.clone())
        .decrypt_all(&ignore, &prompter)
        .await
        .unwrap();

    assert_eq!(
        report,
        BulkReport {
            succeeded: 2,
            failed: 0,
            skipped: 1,
            ignored: 1,
        }
    );
    assert_eq!(report.total(), 4);
    assert!(h
        .store
        .exists(&Document::new("Templates/daily.mdenc"))
        .await
        .unwrap());
    assert!(h.store.exists(&Document::new("notes/c.mdenc")).await.unwrap());
}

#[tokio::test]
async fn cancelling_the_shared_prompt_skips_only_documents_waiting_on_it() {
    let h = harness(encrypted_vault(), settings_at(ScopeLevel::File)).await;
    h.ctx
        .cache
        .put(&Credential::new("hunter2", ""), &Document::new("a.mdenc"))
        .await;
    let prompter = ScriptedPrompter::new([None]);

    let report = BulkEngine::new(h.ctx.clone())
        .decrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(prompter.requests().len(), 1);
    assert_eq!(read_text(&h.store, "a.md").await, "alpha");
    assert!(h.store.exists(&Document::new("notes/b.mdenc")).await.unwrap());
    assert!(h.store.exists(&Document::new("notes/c.mdenc")).await.unwrap());
}

#[tokio::test]
async fn remembered_documents_decrypt_while_the_shared_prompt_is_open() {
    let store = MemoryStore::with_documents([
        ("a.mdenc", sealed("alpha", "known", "")),
        ("b.mdenc", sealed("beta", "other", "")),
    ]);
    let h = harness(store, settings_at(ScopeLevel::File)).await;
    h.ctx
        .cache
        .put(&Credential::new("known", ""), &Document::new("a.mdenc"))
        .await;
    let prompter = GatedPrompter::new("other");
    let engine = BulkEngine::new(h.ctx.clone());
    let ignore = no_ignores();

    let (report, done_while_prompting) = tokio::join!(engine.decrypt_all(&ignore, &prompter), async {
        let done = appears(&h.store, "a.md").await;
        let prompt_open = prompter.asked() == 1;
        prompter.open_gate();
        done && prompt_open
    });

    assert!(done_while_prompting, "a.md waited for an unrelated prompt");
    let report = report.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(read_text(&h.store, "b.md").await, "beta");
}

#[tokio::test]
async fn decrypt_all_keeps_going_past_io_failures() {
    let h = harness(encrypted_vault(), Settings::default()).await;
    h.store.fail_writes(&Document::new("notes/b.md")).await;
    let prompter = ScriptedPrompter::new([Some("hunter2"), Some("other")]);

    let report = BulkEngine::new(h.ctx.clone())
        .decrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert!(h.store.exists(&Document::new("notes/b.mdenc")).await.unwrap());
}

// ---------------------------------------------------------------------------
// Encrypt all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn encrypt_all_at_vault_level_asks_once() {
    let h = harness(plain_vault(), settings_at(ScopeLevel::Vault)).await;
    let prompter = ScriptedPrompter::new([Some("pw")]);

    let report = BulkEngine::new(h.ctx.clone())
        .encrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 4);
    assert_eq!(prompter.requests().len(), 1);
    assert_eq!(prompter.requests()[0].purpose, PromptPurpose::Encrypt);

    for path in ["a.mdenc", "notes/b.mdenc", "notes/c.mdenc"] {
        let raw = h.store.read(&Document::new(path)).await.unwrap();
        assert!(looks_encrypted_bytes(&raw), "{path} should be encrypted");
        let envelope = Envelope::decode_bytes(&raw).unwrap();
        assert_eq!(envelope.original_kind.as_deref(), Some("md"));
        assert!(envelope.open("pw").is_ok());
    }
    assert!(!h.store.exists(&Document::new("a.md")).await.unwrap());

    // Images travel base64 inside the envelope and keep their kind.
    assert!(!h.store.exists(&Document::new("img.png")).await.unwrap());
    let raw = h.store.read(&Document::new("img.mdenc")).await.unwrap();
    let envelope = Envelope::decode_bytes(&raw).unwrap();
    assert_eq!(envelope.original_kind.as_deref(), Some("png"));
    assert_eq!(envelope.open("pw").unwrap(), vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn encrypt_all_at_folder_level_asks_per_folder() {
    let h = harness(plain_vault(), settings_at(ScopeLevel::Folder)).await;
    let prompter = ScriptedPrompter::new([Some("root pw"), Some("notes pw")]);

    let report = BulkEngine::new(h.ctx.clone())
        .encrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 4);
    assert_eq!(prompter.requests().len(), 2);

    let open = |path: &'static str, pw: &'static str| {
        let store = h.store.clone();
        async move {
            let raw = store.read(&Document::new(path)).await.unwrap();
            Envelope::decode_bytes(&raw).unwrap().open_text(pw).unwrap()
        }
    };
    assert_eq!(open("a.mdenc", "root pw").await, "# alpha");
    assert_eq!(open("notes/b.mdenc", "notes pw").await, "# beta");
    assert_eq!(open("notes/c.mdenc", "notes pw").await, "# gamma");
    assert!(h.store.exists(&Document::new("img.mdenc")).await.unwrap());
}

#[tokio::test]
async fn remembered_scopes_encrypt_while_another_scope_is_asked() {
    let h = harness(plain_vault(), settings_at(ScopeLevel::Folder)).await;
    h.ctx
        .cache
        .put(&Credential::new("root pw", ""), &Document::new("a.md"))
        .await;
    let prompter = GatedPrompter::new("notes pw");
    let engine = BulkEngine::new(h.ctx.clone());
    let ignore = no_ignores();

    let (report, done_while_prompting) = tokio::join!(engine.encrypt_all(&ignore, &prompter), async {
        let done = appears(&h.store, "a.mdenc").await && appears(&h.store, "img.mdenc").await;
        let prompt_open = prompter.asked() == 1;
        prompter.open_gate();
        done && prompt_open
    });

    assert!(done_while_prompting, "root folder waited for the notes prompt");
    let report = report.unwrap();
    assert_eq!(report.succeeded, 4);
    let raw = h.store.read(&Document::new("notes/b.mdenc")).await.unwrap();
    assert_eq!(
        Envelope::decode_bytes(&raw).unwrap().open_text("notes pw").unwrap(),
        "# beta"
    );
}

#[tokio::test]
async fn cancelling_a_scope_skips_all_its_documents() {
    let h = harness(plain_vault(), settings_at(ScopeLevel::Folder)).await;
    let prompter = ScriptedPrompter::new([Some("root pw"), None]);

    let report = BulkEngine::new(h.ctx.clone())
        .encrypt_all(&no_ignores(), &prompter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(read_text(&h.store, "notes/b.md").await, "# beta");
}

#[tokio::test]
async fn encrypt_all_leaves_encrypted_and_ignored_notes_alone() {
    let store = MemoryStore::with_documents([
        ("a.md", b"# alpha".to_vec()),
        ("Templates/daily.md", b"# {{date}}".to_vec()),
        ("secret.mdenc", sealed("already", "x", "")),
    ]);
    let h = harness(store, settings_at(ScopeLevel::Vault)).await;
    let ignore = IgnorePatterns::new(["Templates/**"]).unwrap();
    let prompter = ScriptedPrompter::new([Some("pw")]);

    let report = BulkEngine::new(h.ctx.clone())
        .encrypt_all(&ignore, &prompter)
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.ignored, 1);
    assert_eq!(read_text(&h.store, "Templates/daily.md").await, "# {{date}}");
    let raw = h.store.read(&Document::new("secret.mdenc")).await.unwrap();
    assert_eq!(
        Envelope::decode_bytes(&raw).unwrap().open_text("x").unwrap(),
        "already"
    );
}

#[tokio::test]
async fn empty_vault_reports_nothing() {
    let h = harness(MemoryStore::new(), Settings::default()).await;
    let prompter = ScriptedPrompter::default();
    let engine = BulkEngine::new(h.ctx.clone());

    assert_eq!(
        engine.encrypt_all(&no_ignores(), &prompter).await.unwrap(),
        BulkReport::default()
    );
    assert_eq!(
        engine.decrypt_all(&no_ignores(), &prompter).await.unwrap(),
        BulkReport::default()
    );
    assert!(prompter.requests().is_empty());
}
