// ABOUTME: Input checks for user-supplied branch names before any resource is created
// ABOUTME: Git remains the final authority on ref validity; this rejects the obvious cases

use thiserror::Error;

use crate::utils::sanitize_branch_name;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Branch name must not be empty")]
    EmptyBranch,

    #[error("Branch name '{0}' must not start with '-'")]
    LeadingDash(String),

    #[error("Branch name '{0}' contains characters git does not allow")]
    InvalidCharacters(String),

    #[error("Branch name '{0}' has no characters usable in a worktree id")]
    EmptyIdentifier(String),
}

/// Validate a branch name and return the derived worktree id.
pub fn validate_branch_name(branch: &str) -> Result<String, ValidationError> {
    if branch.trim().is_empty() {
        return Err(ValidationError::EmptyBranch);
    }
    if branch.starts_with('-') {
        return Err(ValidationError::LeadingDash(branch.to_string()));
    }
    if branch.chars().any(char::is_control) || branch.contains("..") {
        return Err(ValidationError::InvalidCharacters(branch.to_string()));
    }

    let id = sanitize_branch_name(branch);
    if id.is_empty() {
        return Err(ValidationError::EmptyIdentifier(branch.to_string()));
    }
    Ok(id)
}
