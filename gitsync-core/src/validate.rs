//! Input validation for repository declarations.
//!
//! Repository names become directory names below `work_dir`, so they are held
//! to filesystem-safe identifiers. Remote urls, users and branch names end up
//! as separate git arguments and must not carry whitespace or look like options.

use crate::error::ConfigError;
use crate::types::RepositoryConfig;

/// Maximum length for repository names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate a repository name.
///
/// Rules:
/// - 1-255 characters
/// - ASCII alphanumeric, underscore, hyphen and dot only
/// - cannot start with a dot or hyphen (no hidden dirs, no option-like names)
pub fn validate_repository_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid("exceeds maximum length"));
    }
    for (i, c) in name.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' && c != '.' {
            return Err(invalid(
                "contains invalid characters (only alphanumeric, underscore, hyphen, and dot allowed)",
            ));
        }
        if i == 0 && (c == '.' || c == '-') {
            return Err(invalid("cannot start with dot or hyphen"));
        }
    }
    Ok(())
}

/// Validate a branch name used for `pull`/`push`.
pub fn validate_branch(owner: &str, branch: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidBranch {
        owner: owner.to_string(),
        branch: branch.to_string(),
        reason,
    };

    if branch.is_empty() {
        return Err(invalid("cannot be empty"));
    }
    if branch.starts_with('-') {
        return Err(invalid("cannot start with hyphen"));
    }
    if branch.chars().any(char::is_whitespace) {
        return Err(invalid("cannot contain whitespace"));
    }
    Ok(())
}

/// Validate one repository declaration: its name, branch and every remote.
pub fn validate_repository(repo: &RepositoryConfig) -> Result<(), ConfigError> {
    validate_repository_name(repo.name.as_str())?;
    if let Some(branch) = &repo.branch {
        validate_branch(&format!("repository '{}'", repo.name), branch)?;
    }

    for (index, remote) in repo.remotes.iter().enumerate() {
        let invalid = |reason| ConfigError::InvalidRemote {
            repository: repo.name.0.clone(),
            index,
            reason,
        };
        if remote.url.trim().is_empty() {
            return Err(invalid("url cannot be empty"));
        }
        if remote.user.trim().is_empty() {
            return Err(invalid("user cannot be empty"));
        }
        if remote.url.starts_with('-') {
            return Err(invalid("url cannot start with hyphen"));
        }
        if remote.user.starts_with('-') {
            return Err(invalid("user cannot start with hyphen"));
        }
        if remote.url.chars().any(char::is_whitespace) {
            return Err(invalid("url cannot contain whitespace"));
        }
        if remote.user.chars().any(char::is_whitespace) {
            return Err(invalid("user cannot contain whitespace"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Remote, RepositoryName};

    fn repo(name: &str, remotes: Vec<Remote>) -> RepositoryConfig {
        RepositoryConfig {
            name: RepositoryName::from(name),
            remotes,
            branch: None,
        }
    }

    #[test]
    fn valid_names() {
        assert!(validate_repository_name("demo").is_ok());
        assert!(validate_repository_name("my-repo").is_ok());
        assert!(validate_repository_name("site.example.com").is_ok());
        assert!(validate_repository_name("repo_2").is_ok());
    }

    #[test]
    fn path_traversal_blocked() {
        assert!(validate_repository_name("..").is_err());
        assert!(validate_repository_name("../secret").is_err());
        assert!(validate_repository_name("foo/bar").is_err());
        assert!(validate_repository_name("foo\\bar").is_err());
    }

    #[test]
    fn hidden_and_option_like_names_rejected() {
        assert!(validate_repository_name(".git").is_err());
        assert!(validate_repository_name("-rf").is_err());
    }

    #[test]
    fn empty_and_too_long() {
        assert!(validate_repository_name("").is_err());
        assert!(validate_repository_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn remote_fields_checked() {
        let ok = repo(
            "demo",
            vec![Remote {
                url: "https://a/demo.git".into(),
                user: "u1".into(),
            }],
        );
        assert!(validate_repository(&ok).is_ok());

        let blank_user = repo(
            "demo",
            vec![Remote {
                url: "https://a/demo.git".into(),
                user: " ".into(),
            }],
        );
        let err = validate_repository(&blank_user).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRemote { index: 0, .. }));

        let spaced_url = repo(
            "demo",
            vec![Remote {
                url: "https://a/demo one.git".into(),
                user: "u1".into(),
            }],
        );
        assert!(validate_repository(&spaced_url).is_err());
    }

    #[test]
    fn option_like_remote_fields_rejected() {
        let url = repo(
            "demo",
            vec![Remote {
                url: "--upload-pack=touch".into(),
                user: "u1".into(),
            }],
        );
        let err = validate_repository(&url).unwrap_err();
        assert!(err.to_string().contains("url cannot start with hyphen"), "got: {err}");

        let user = repo(
            "demo",
            vec![
                Remote {
                    url: "https://a/demo.git".into(),
                    user: "u1".into(),
                },
                Remote {
                    url: "https://b/demo.git".into(),
                    user: "-c".into(),
                },
            ],
        );
        let err = validate_repository(&user).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRemote { index: 1, .. }), "got: {err}");
    }

    #[test]
    fn branch_rules() {
        assert!(validate_branch("settings", "main").is_ok());
        assert!(validate_branch("settings", "release/1.x").is_ok());
        assert!(validate_branch("settings", "").is_err());
        assert!(validate_branch("settings", "--force").is_err());
        assert!(validate_branch("settings", "two words").is_err());
    }
}
