//! Runtime crate for the issue-comment PR bridge.
//!
//! Wires command parsing, model completion, change-set validation, repository
//! mutation, and issue notification into one run per comment event.

mod github_issues_runtime;

pub use github_issues_runtime::{
    BranchRef, BridgeOutcome, BridgeRuntimeConfig, GithubApiClient, GithubCommentCreateResponse,
    IssueCommentBridge, IssueNotifier, MutationError, MutationStep, PullRequestResult, RepoRef,
    RepositoryMutator, DEFAULT_GITHUB_API_BASE, DEFAULT_GITHUB_REQUEST_TIMEOUT_MS,
};
