use std::sync::Arc;

use anyhow::{Context, Result};
use prbridge_ai::{OpenAiResponsesClient, OpenAiResponsesConfig};
use prbridge_github_issues_runtime::{BridgeOutcome, BridgeRuntimeConfig, IssueCommentBridge};

use crate::cli_args::Cli;
use crate::startup_preflight::{resolve_bridge_inputs, ResolvedBridgeInputs};

pub(crate) fn build_bridge_runtime_config(
    cli: &Cli,
    inputs: &ResolvedBridgeInputs,
) -> Result<BridgeRuntimeConfig> {
    let mut model_config = OpenAiResponsesConfig::with_api_key(inputs.openai_api_key.clone());
    model_config.api_base = cli.openai_api_base.clone();
    model_config.request_timeout_ms = cli.model_timeout_ms;
    let client =
        OpenAiResponsesClient::new(model_config).context("failed to create completion client")?;

    Ok(BridgeRuntimeConfig {
        client: Arc::new(client),
        model: cli.model.trim().to_string(),
        repo_slug: inputs.repo.as_slug(),
        issue_number: inputs.issue_number,
        base_branch: cli.base_branch.trim().to_string(),
        api_base: cli.github_api_base.clone(),
        token: inputs.github_token.clone(),
        request_timeout_ms: cli.github_timeout_ms,
        command_prefix: cli.command_prefix.trim().to_string(),
        allowlist: inputs.allowlist.clone(),
    })
}

pub(crate) async fn run_cli(cli: Cli) -> Result<BridgeOutcome> {
    let inputs = resolve_bridge_inputs(&cli)?;
    tracing::info!(
        repo = %inputs.repo.as_slug(),
        issue = inputs.issue_number,
        model = %cli.model,
        base_branch = %cli.base_branch,
        allowed_prefixes = %inputs.allowlist.display_list(),
        "starting issue comment bridge"
    );
    let config = build_bridge_runtime_config(&cli, &inputs)?;
    let bridge = IssueCommentBridge::new(config)?;
    bridge.handle_comment(&inputs.comment_body).await
}
