use crate::issue_command_parser::CommandVerb;
use crate::path_policy::PathAllowlist;

/// Render the model prompt for one bridge command.
///
/// The prompt only advises the model; the change-set validator remains the
/// enforcement point for the allowlist.
pub fn build_bridge_prompt(
    verb: CommandVerb,
    request_text: &str,
    repo_slug: &str,
    base_branch: &str,
    allowlist: &PathAllowlist,
) -> String {
    match verb {
        CommandVerb::Plan => build_plan_prompt(request_text, repo_slug, base_branch, allowlist),
        CommandVerb::Propose => {
            build_propose_prompt(request_text, repo_slug, base_branch, allowlist)
        }
    }
}

pub fn build_plan_prompt(
    request_text: &str,
    repo_slug: &str,
    base_branch: &str,
    allowlist: &PathAllowlist,
) -> String {
    format!(
        r#"You are an assistant helping with a GitHub repository workflow.
Return a concise, actionable plan in Markdown bullet points.

Repo: {repo_slug}
Base branch: {base_branch}
Constraints:
- Only these path prefixes are allowed for file changes: {prefixes}
- PR-only workflow (never push to {base_branch} directly).

User request:
{request_text}
"#,
        prefixes = allowlist.display_list(),
    )
}

pub fn build_propose_prompt(
    request_text: &str,
    repo_slug: &str,
    base_branch: &str,
    allowlist: &PathAllowlist,
) -> String {
    let quoted_prefixes = allowlist
        .prefixes()
        .iter()
        .map(|prefix| format!("\"{prefix}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let path_hint = allowlist
        .prefixes()
        .iter()
        .map(|prefix| format!("{prefix}..."))
        .collect::<Vec<_>>()
        .join(" or ");
    format!(
        r#"You are an assistant preparing a safe GitHub pull request change-set.

Repo: {repo_slug}
Base branch: {base_branch}

STRICT constraints:
- You may ONLY modify, create, or delete files under these path prefixes: [{quoted_prefixes}]
- Do NOT include any other paths.
- Paths must be relative and must not contain '..'.
- Output MUST be valid JSON only (no prose, no code fences).

JSON schema:
{{
  "title": "PR title",
  "body": "PR body markdown",
  "commit_message": "Commit message",
  "changes": [
    {{
      "path": "{path_hint}",
      "action": "upsert" | "delete",
      "content": "full file content (required for upsert)"
    }}
  ]
}}

User request:
{request_text}
"#
    )
}
