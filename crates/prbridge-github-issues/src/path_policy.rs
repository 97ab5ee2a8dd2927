//! Path allowlist enforced on every model-proposed change before any write.

pub const DEFAULT_ALLOWED_PATH_PREFIXES: [&str; 2] = ["docs/", ".github/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `PathPolicyDecision` used across bridge components.
pub struct PathPolicyDecision {
    pub accepted: bool,
    pub reason_code: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fixed set of repository path prefixes under which mutation is permitted.
pub struct PathAllowlist {
    prefixes: Vec<String>,
}

impl Default for PathAllowlist {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_ALLOWED_PATH_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }
}

impl PathAllowlist {
    /// Builds an allowlist from directory prefixes. Each prefix is normalized to
    /// end with `/` so that `docs` never admits `docs-private/...`.
    pub fn new<I, S>(prefixes: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for raw in prefixes {
            let trimmed = raw.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            if is_absolute_path(trimmed) || has_parent_traversal(trimmed) {
                return Err(format!(
                    "allowed path prefix '{trimmed}' must be relative and must not contain '..'"
                ));
            }
            let prefix = if trimmed.ends_with('/') {
                trimmed.to_string()
            } else {
                format!("{trimmed}/")
            };
            if !normalized.contains(&prefix) {
                normalized.push(prefix);
            }
        }
        if normalized.is_empty() {
            return Err("at least one allowed path prefix is required".to_string());
        }
        Ok(Self {
            prefixes: normalized,
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Comma-separated rendering used in prompts and rejection messages.
    pub fn display_list(&self) -> String {
        self.prefixes.join(", ")
    }

    pub fn evaluate(&self, path: &str) -> PathPolicyDecision {
        if has_control_character(path) {
            return PathPolicyDecision {
                accepted: false,
                reason_code: "deny_control_character",
            };
        }
        if !self
            .prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return PathPolicyDecision {
                accepted: false,
                reason_code: "deny_prefix_not_allowlisted",
            };
        }
        if has_parent_traversal(path) {
            return PathPolicyDecision {
                accepted: false,
                reason_code: "deny_parent_traversal",
            };
        }
        if is_absolute_path(path) {
            return PathPolicyDecision {
                accepted: false,
                reason_code: "deny_absolute_path",
            };
        }
        if !has_file_name(path) {
            return PathPolicyDecision {
                accepted: false,
                reason_code: "deny_missing_file_name",
            };
        }
        PathPolicyDecision {
            accepted: true,
            reason_code: "allow_prefix_allowlist",
        }
    }
}

pub fn has_parent_traversal(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// URL parsers drop tabs and newlines, so `.\t.` would reach GitHub as `..`.
pub fn has_control_character(path: &str) -> bool {
    path.chars().any(char::is_control)
}

/// True when the last segment names a file rather than a directory.
pub fn has_file_name(path: &str) -> bool {
    path.split(['/', '\\'])
        .last()
        .is_some_and(|segment| !segment.is_empty() && segment != ".")
}

pub fn is_absolute_path(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
