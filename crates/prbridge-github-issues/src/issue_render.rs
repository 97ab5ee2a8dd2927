//! Issue-comment bodies for every terminal state of a bridge run.

use crate::change_set::ChangeSetError;
use crate::github_transport_helpers::truncate_for_error;
use crate::issue_command_parser::CommandVerb;

const COMMENT_ERROR_MAX_CHARS: usize = 600;

pub fn render_plan_comment(plan_markdown: &str) -> String {
    let plan = plan_markdown.trim();
    let plan = if plan.is_empty() {
        "_(No plan returned.)_"
    } else {
        plan
    };
    format!("**AI PLAN**\n\n{plan}")
}

pub fn render_usage_comment(command_prefix: &str, verb: CommandVerb) -> String {
    format!(
        "Usage: `{} {} <what you want>`",
        command_prefix.trim(),
        verb.as_str()
    )
}

pub fn render_parse_failure_comment(error: &ChangeSetError) -> String {
    format!(
        "**AI PR generation failed**: could not parse JSON from model output.\n\nError: `{}`\n\nTip: Try again, or simplify the request.",
        truncate_for_error(&error.to_string(), COMMENT_ERROR_MAX_CHARS)
    )
}

pub fn render_validation_rejection_comment(error: &ChangeSetError) -> String {
    format!(
        "**AI PR blocked**: {}\n\nNo branch was created and no files were changed.",
        error
    )
}

pub fn render_mutation_failure_comment(
    step: &str,
    branch: Option<&str>,
    error_message: &str,
) -> String {
    let branch_line = match branch {
        Some(branch) => format!(
            "Branch `{branch}` was left in place for inspection; delete it manually if it is not needed."
        ),
        None => "No branch was created.".to_string(),
    };
    format!(
        "**AI PR failed** while trying to {step}.\n\nError: `{}`\n\n{branch_line}",
        truncate_for_error(error_message, COMMENT_ERROR_MAX_CHARS)
    )
}

pub fn render_pull_request_created_comment(branch: &str, pull_request_url: &str) -> String {
    format!(
        "**AI PR created**\n\n- Branch: `{branch}`\n- PR: {pull_request_url}\n\nNext: review the PR, run checks, then merge."
    )
}
