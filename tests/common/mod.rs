//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notelock::cache::Credential;
use notelock::context::Context;
use notelock::envelope::Envelope;
use notelock::notify::RecordingNotifier;
use notelock::prompt::{PasswordPrompter, PromptRequest};
use notelock::config::Settings;
use notelock::store::MemoryStore;
use tokio::sync::Notify;

/// Answers prompts from a script; `None` entries cancel.
/// Runs out as a cancel.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Option<Credential>>>,
    seen: Mutex<Vec<PromptRequest>>,
}

impl ScriptedPrompter {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<&'static str>>,
    {
        Self {
            answers: Mutex::new(
                answers
                    .into_iter()
                    .map(|a| a.map(|pw| Credential::new(pw, "")))
                    .collect(),
            ),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordPrompter for ScriptedPrompter {
    async fn request(&self, request: PromptRequest) -> Option<Credential> {
        self.seen.lock().unwrap().push(request);
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

/// Holds every prompt open until the gate is opened, then answers
/// with a fixed password.
pub struct GatedPrompter {
    answer: &'static str,
    gate: Notify,
    asked: AtomicUsize,
}

impl GatedPrompter {
    pub fn new(answer: &'static str) -> Self {
        Self {
            answer,
            gate: Notify::new(),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PasswordPrompter for GatedPrompter {
    async fn request(&self, _request: PromptRequest) -> Option<Credential> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Some(Credential::new(self.answer, ""))
    }
}

/// Serialized envelope of `text` under `password`.
pub fn sealed(text: &str, password: &str, hint: &str) -> Vec<u8> {
    Envelope::seal(text.as_bytes(), password, hint, Some("md"))
        .unwrap()
        .encode()
        .unwrap()
        .into_bytes()
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notices: Arc<RecordingNotifier>,
    pub ctx: Context,
}

pub async fn harness(store: MemoryStore, settings: Settings) -> Harness {
    let store = Arc::new(store);
    let notices = Arc::new(RecordingNotifier::new());
    let ctx = Context::new(store.clone(), notices.clone(), settings).await;
    Harness {
        store,
        notices,
        ctx,
    }
}
