//! Branch name validation following git-style conventions.
//!
//! Valid branch names are non-empty, contain no whitespace or any of
//! `~ ^ : ? * [ \`, contain neither `..` nor `@{`, do not end with `.lock`,
//! and consist of non-empty `/`-separated components that do not start
//! with `.`.

use crate::error::{RefError, Result};

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

const FORBIDDEN_SEQUENCES: &[(&str, &str)] = &[
    ("..", "must not contain '..'"),
    ("@{", "must not contain '@{'"),
];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use cairn_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("master").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    for (sequence, reason) in FORBIDDEN_SEQUENCES {
        if name.contains(sequence) {
            return Err(invalid(name, *reason));
        }
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    // Catches leading/trailing '/' and '//' as empty components, and
    // leading '.' on any component.
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(name, format!("component must not start with '.': {component:?}")));
        }
    }

    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }

    Ok(())
}
