//! Shared mock collaborators for server tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use heimdall_core::{HeimdallError, Result};
use heimdall_github::{ChangedFile, PullRequestDetails, SourceControl};
use heimdall_model::{ChatMessage, InvokeOptions, ModelProvider};

/// Programmable in-memory [`SourceControl`] that counts every call.
pub struct MockScm {
    files: Vec<ChangedFile>,
    policy_yaml: Option<String>,
    pub file_list_calls: AtomicU64,
    pub detail_calls: AtomicU64,
    pub content_calls: AtomicU64,
    pub comment_calls: AtomicU64,
    pub last_comment: Mutex<Option<String>>,
}

impl MockScm {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            policy_yaml: None,
            file_list_calls: AtomicU64::new(0),
            detail_calls: AtomicU64::new(0),
            content_calls: AtomicU64::new(0),
            comment_calls: AtomicU64::new(0),
            last_comment: Mutex::new(None),
        }
    }

    pub fn with_files(mut self, files: Vec<ChangedFile>) -> Self {
        self.files = files;
        self
    }

    pub fn with_policy(mut self, yaml: &str) -> Self {
        self.policy_yaml = Some(yaml.to_string());
        self
    }

    pub fn text_file(name: &str, patch: &str) -> ChangedFile {
        serde_json::from_value(serde_json::json!({
            "filename": name,
            "status": "modified",
            "additions": 1,
            "deletions": 0,
            "patch": patch,
        }))
        .expect("valid changed-file JSON")
    }

    /// Total API calls of any kind, for no-side-effect assertions.
    pub fn total_calls(&self) -> u64 {
        self.file_list_calls.load(Ordering::SeqCst)
            + self.detail_calls.load(Ordering::SeqCst)
            + self.content_calls.load(Ordering::SeqCst)
            + self.comment_calls.load(Ordering::SeqCst)
    }

    pub fn comments_posted(&self) -> u64 {
        self.comment_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceControl for MockScm {
    async fn get_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> Result<PullRequestDetails> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequestDetails {
            number,
            title: Some("Add widgets".into()),
            body: Some("Introduces the widget module.".into()),
            head_ref: "feature/widgets".into(),
        })
    }

    async fn list_changed_files(
        &self,
        _owner: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<Vec<ChangedFile>> {
        self.file_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.clone())
    }

    async fn get_file_content(
        &self,
        _owner: &str,
        _repo: &str,
        _path: &str,
        _git_ref: &str,
    ) -> Result<Option<String>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.policy_yaml.clone())
    }

    async fn create_comment(
        &self,
        _owner: &str,
        _repo: &str,
        _issue_number: u64,
        body: &str,
    ) -> Result<u64> {
        let n = self.comment_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_comment.lock().unwrap() = Some(body.to_string());
        Ok(100 + n)
    }

    async fn update_comment(
        &self,
        _owner: &str,
        _repo: &str,
        _comment_id: u64,
        body: &str,
    ) -> Result<()> {
        *self.last_comment.lock().unwrap() = Some(body.to_string());
        Ok(())
    }
}

/// [`ModelProvider`] returning a canned response and remembering prompts.
pub struct CannedProvider {
    name: &'static str,
    response: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedProvider {
    pub fn ok(name: &'static str, content: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: Ok(content.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelProvider for CannedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn format_messages(&self, _messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::Value::Array(vec![])
    }

    async fn invoke(&self, prompt: &str, _options: &InvokeOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.response {
            Ok(content) => Ok(content.clone()),
            Err(message) => Err(HeimdallError::Provider {
                provider: self.name.to_string(),
                message: message.clone(),
            }),
        }
    }
}
