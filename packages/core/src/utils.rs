// ABOUTME: Branch-to-identifier sanitization and resource naming helpers
// ABOUTME: Every container, volume and checkout name is derived from the worktree id

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{APP_CONTAINER_PREFIX, DB_CONTAINER_PREFIX};

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Turn a branch name into a worktree identifier.
///
/// Lowercases, maps every character outside `[a-z0-9-]` to `-`, collapses
/// hyphen runs and trims leading/trailing hyphens. The result may be empty.
pub fn sanitize_branch_name(branch: &str) -> String {
    let lowered = branch.to_lowercase();
    let replaced = DISALLOWED.replace_all(&lowered, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Database container name; the data volume shares it
pub fn db_container_name(id: &str) -> String {
    format!("{}{}", DB_CONTAINER_PREFIX, id)
}

pub fn app_container_name(id: &str) -> String {
    format!("{}{}", APP_CONTAINER_PREFIX, id)
}

/// Recover a worktree id from a database container name
pub fn id_from_db_container(name: &str) -> Option<&str> {
    name.strip_prefix(DB_CONTAINER_PREFIX)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("feature/Auth System", "feature-auth-system")]
    #[case("main", "main")]
    #[case("fix/#123_login", "fix-123-login")]
    #[case("--Leading--and--trailing--", "leading-and-trailing")]
    #[case("release/v1.2.0", "release-v1-2-0")]
    #[case("///", "")]
    #[case("", "")]
    fn test_sanitize_branch_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_branch_name(input), expected);
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(db_container_name("feature-x"), "grove-db-wt-feature-x");
        assert_eq!(app_container_name("feature-x"), "grove-wt-feature-x");
    }

    #[test]
    fn test_id_from_db_container() {
        assert_eq!(id_from_db_container("grove-db-wt-feature-x"), Some("feature-x"));
        assert_eq!(id_from_db_container("grove-db-wt-"), None);
        assert_eq!(id_from_db_container("postgres"), None);
    }

    proptest! {
        #[test]
        fn sanitized_ids_use_restricted_alphabet(branch in ".{0,64}") {
            let id = sanitize_branch_name(&branch);
            prop_assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!id.starts_with('-') && !id.ends_with('-'));
            prop_assert!(!id.contains("--"));
        }

        #[test]
        fn sanitize_is_idempotent(branch in ".{0,64}") {
            let once = sanitize_branch_name(&branch);
            prop_assert_eq!(sanitize_branch_name(&once), once.clone());
        }
    }
}
