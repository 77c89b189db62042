use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{Completion, CompletionRequest, InferenceClient, InferenceError};

/// Canned behaviour for one system prompt.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Fail(String),
    /// Parks the call until `release` is notified, then replies.
    Hold { release: Arc<Notify>, reply: String },
}

/// In-process stand-in for an inference backend. Calls are routed by their
/// system prompt and every call is recorded, including ones that later fail.
#[derive(Debug, Default)]
pub struct ScriptedInference {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<CompletionRequest>>,
    arrivals: Notify,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, system_prompt: impl Into<String>, script: Script) -> Self {
        self.set_script(system_prompt, script);
        self
    }

    pub fn with_reply(self, system_prompt: impl Into<String>, reply: impl Into<String>) -> Self {
        self.with_script(system_prompt, Script::Reply(reply.into()))
    }

    pub fn set_script(&self, system_prompt: impl Into<String>, script: Script) {
        self.scripts.lock().insert(system_prompt.into(), script);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().clone()
    }

    /// Resolves once at least `count` calls have arrived.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.arrivals.notified();
            if self.call_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, InferenceError> {
        let script = request
            .system_prompt()
            .and_then(|prompt| self.scripts.lock().get(prompt).cloned());
        self.calls.lock().push(request);
        self.arrivals.notify_waiters();

        match script {
            Some(Script::Reply(reply)) => Completion::from_raw(&reply),
            Some(Script::Fail(message)) => Err(InferenceError::Transport(message)),
            Some(Script::Hold { release, reply }) => {
                release.notified().await;
                Completion::from_raw(&reply)
            }
            None => Err(InferenceError::Backend {
                status: 404,
                body: "no script for system prompt".to_string(),
            }),
        }
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}
