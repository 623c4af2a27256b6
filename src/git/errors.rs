use std::fmt;

/// Categorized git failures with actionable guidance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// Network-related errors (DNS, connection timeout, unreachable)
    Network(String),
    /// Authentication failures (SSH keys, passwords, tokens)
    Authentication(String),
    /// Resource not found (repository, branch, tag, commit)
    NotFound(String),
    /// Histories that cannot be fast-forwarded, or conflicting local changes
    Conflict(String),
    /// File system permission errors
    Permission(String),
    /// Invalid reference name or format
    InvalidRef(String),
    /// Unknown or uncategorized error
    Unknown(String),
}

impl GitError {
    /// Parse git command stderr to categorize the error
    ///
    /// Analyzes common git error patterns; the message keeps git's own wording.
    #[must_use]
    pub fn from_stderr(command: &str, stderr: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = format!("{command}: {}", extract_meaningful_message(stderr));

        // Permission errors (checked before authentication, both say "permission denied")
        if stderr_lower.contains("permission denied (os")
            || stderr_lower.contains("unable to create")
            || stderr_lower.contains("read-only file system")
            || stderr_lower.contains("could not create work tree")
        {
            return Self::Permission(message);
        }

        if stderr_lower.contains("could not resolve host")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("network is unreachable")
            || stderr_lower.contains("failed to connect")
            || stderr_lower.contains("connection refused")
            || (stderr_lower.contains("could not read from remote repository")
                && stderr_lower.contains("connection closed"))
        {
            return Self::Network(message);
        }

        if stderr_lower.contains("authentication failed")
            || stderr_lower.contains("permission denied")
            || stderr_lower.contains("publickey")
            || stderr_lower.contains("host key verification failed")
            || stderr_lower.contains("invalid credentials")
            || stderr_lower.contains("could not read username")
            || stderr_lower.contains("terminal prompts disabled")
        {
            return Self::Authentication(message);
        }

        if stderr_lower.contains("does not exist")
            || stderr_lower.contains("not found")
            || stderr_lower.contains("couldn't find remote ref")
            || stderr_lower.contains("does not appear to be a git repository")
            || stderr_lower.contains("not a git repository")
            || stderr_lower.contains("did not match any")
        {
            return Self::NotFound(message);
        }

        if stderr_lower.contains("not possible to fast-forward")
            || stderr_lower.contains("non-fast-forward")
            || stderr_lower.contains("diverging branches")
            || stderr_lower.contains("would be overwritten")
            || stderr_lower.contains("conflict")
        {
            return Self::Conflict(message);
        }

        if stderr_lower.contains("is not a valid branch name")
            || stderr_lower.contains("not a valid ref")
            || stderr_lower.contains("bad revision")
            || stderr_lower.contains("ambiguous argument")
        {
            return Self::InvalidRef(message);
        }

        Self::Unknown(message)
    }

    /// The message, as reported by git
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Network(msg)
            | Self::Authentication(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Permission(msg)
            | Self::InvalidRef(msg)
            | Self::Unknown(msg) => msg,
        }
    }

    /// Actionable suggestions for the user
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::Network(_) => {
                "Suggestions:\n\
                 - Check your internet connection\n\
                 - Verify the repository URL is correct\n\
                 - Check if a firewall or proxy is blocking the connection"
            }
            Self::Authentication(_) => {
                "Suggestions:\n\
                 - Pass the private key with --identity or GIT_CLONE_KEY\n\
                 - Verify the key is authorized for this repository\n\
                 - For HTTPS, set up a credential helper"
            }
            Self::NotFound(_) => {
                "Suggestions:\n\
                 - Verify the repository URL is correct\n\
                 - Verify the branch or tag exists on the remote"
            }
            Self::Conflict(_) => {
                "Suggestions:\n\
                 - The local branch has diverged from the remote; only fast-forward pulls are done\n\
                 - Reset or rebase the local branch manually"
            }
            Self::Permission(_) => {
                "Suggestions:\n\
                 - Check file and directory permissions\n\
                 - Ensure you have write access to the destination directory"
            }
            Self::InvalidRef(_) => {
                "Suggestions:\n\
                 - Check the branch/tag name for invalid characters\n\
                 - Use tags/<name> to select a tag"
            }
            Self::Unknown(_) => "Please check the message above for details.",
        }
    }

    /// Get a short description of the error type
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network Error",
            Self::Authentication(_) => "Authentication Error",
            Self::NotFound(_) => "Not Found",
            Self::Conflict(_) => "Conflict",
            Self::Permission(_) => "Permission Denied",
            Self::InvalidRef(_) => "Invalid Reference",
            Self::Unknown(_) => "Unknown Error",
        }
    }
}

impl fmt::Display for GitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for GitError {}

/// Extract the most meaningful part of the error message
///
/// Progress lines are dropped. `fatal:`/`error:` lines win when present,
/// otherwise the first three non-empty lines are kept.
fn extract_meaningful_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let errors: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| {
            let lower = l.to_lowercase();
            lower.starts_with("fatal:") || lower.starts_with("error:")
        })
        .collect();

    let chosen: Vec<&str> = if errors.is_empty() {
        lines.into_iter().take(3).collect()
    } else {
        errors
    };

    if chosen.is_empty() {
        return "No error details available".to_string();
    }

    chosen.join(" | ")
}
