//! Tests for the issue-comment bridge: command handling, propose workflows,
//! and the GitHub client contract.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use httpmock::prelude::*;
use prbridge_ai::{CompletionClient, CompletionRequest, ModelError};
use prbridge_github_issues::issue_command_parser::CommandVerb;
use prbridge_github_issues::path_policy::PathAllowlist;
use serde_json::json;

use super::{
    BridgeOutcome, BridgeRuntimeConfig, GithubApiClient, IssueCommentBridge, MutationStep,
    RepoRef, RepositoryMutator,
};


const ISSUE_NUMBER: u64 = 7;

struct ScriptedCompletionClient {
    reply: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionClient {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn exhausted() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        self.requests
            .lock()
            .expect("requests lock")
            .last()
            .map(|request| request.input.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete_text(&self, request: CompletionRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("requests lock").push(request);
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(ModelError::TransientExhausted {
                attempts: 6,
                last_status: 503,
            }),
        }
    }
}

fn test_bridge_config(base_url: &str, client: Arc<dyn CompletionClient>) -> BridgeRuntimeConfig {
    BridgeRuntimeConfig {
        client,
        model: "gpt-4.1-mini".to_string(),
        repo_slug: "owner/repo".to_string(),
        issue_number: ISSUE_NUMBER,
        base_branch: "main".to_string(),
        api_base: base_url.to_string(),
        token: "test-token".to_string(),
        request_timeout_ms: 3_000,
        command_prefix: "/ai".to_string(),
        allowlist: PathAllowlist::default(),
    }
}

fn test_bridge(server: &MockServer, client: Arc<dyn CompletionClient>) -> IssueCommentBridge {
    IssueCommentBridge::new(test_bridge_config(&server.base_url(), client)).expect("bridge")
}

fn test_github_client(server: &MockServer) -> GithubApiClient {
    GithubApiClient::new(
        &server.base_url(),
        "test-token",
        RepoRef::parse("owner/repo").expect("repo"),
        3_000,
    )
    .expect("github client")
}

fn comment_path() -> String {
    format!("/repos/owner/repo/issues/{ISSUE_NUMBER}/comments")
}

fn comment_created() -> serde_json::Value {
    json!({"id": 9001, "html_url": "https://example.test/comment/9001"})
}

#[test]
fn unit_repo_ref_parse_accepts_owner_repo_and_rejects_malformed_values() {
    let repo = RepoRef::parse(" owner/repo ").expect("repo");
    assert_eq!(repo.as_slug(), "owner/repo");
    for raw in ["", "owner", "/repo", "owner/", "owner/repo/extra"] {
        assert!(RepoRef::parse(raw).is_err(), "expected error for {raw:?}");
    }
}

#[test]
fn unit_mutation_step_labels_name_the_failing_operation() {
    assert_eq!(
        MutationStep::CreateBranch {
            name: "ai/pr-7-1".to_string()
        }
        .to_string(),
        "create branch `ai/pr-7-1`"
    );
    assert_eq!(
        MutationStep::UpsertFile {
            path: "docs/a.md".to_string()
        }
        .to_string(),
        "upsert docs/a.md"
    );
    assert_eq!(MutationStep::OpenPullRequest.to_string(), "open pull request");
}
