//! Identity resolution for SSH public key authentication.
//!
//! An identity is either inline private key material or a path to a key file.
//! Either way the result is a key file on disk that git's ssh is pointed at
//! through `GIT_SSH_COMMAND`; inline material is written to a private
//! temporary file that lives as long as the [`AuthCredential`].

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// Marker identifying inline key material instead of a file path.
pub const INLINE_KEY_MARKER: &str = "RSA PRIVATE KEY";

/// Environment variable git consults for the ssh command line.
pub const SSH_COMMAND_ENV: &str = "GIT_SSH_COMMAND";

/// Failures while setting up authentication
#[derive(Debug)]
pub enum AuthError {
    /// The key file could not be read
    Unreadable {
        /// Path that was tried
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// The content is not a private key
    InvalidKey(String),
    /// The key is protected by a passphrase
    Encrypted(String),
    /// Inline key material could not be written to a temporary file
    TempFile(io::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "cannot read identity file {}: {source}", path.display())
            }
            Self::InvalidKey(origin) => write!(f, "{origin} does not contain a private key"),
            Self::Encrypted(origin) => write!(
                f,
                "{origin} is passphrase protected; only unencrypted keys are supported"
            ),
            Self::TempFile(err) => write!(f, "cannot store inline identity: {err}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } | Self::TempFile(source) => Some(source),
            Self::InvalidKey(_) | Self::Encrypted(_) => None,
        }
    }
}

/// Where the private key lives.
#[derive(Debug)]
enum KeySource {
    /// A key file supplied by the user.
    File(PathBuf),
    /// Inline material written to a temporary file, removed on drop.
    Inline(TempPath),
}

/// An SSH identity handed to git.
#[derive(Debug)]
pub struct AuthCredential {
    key: KeySource,
}

impl AuthCredential {
    /// Resolves an `--identity` value.
    ///
    /// Values containing [`INLINE_KEY_MARKER`] are key material, anything else
    /// is a path to a key file (`~` is expanded).
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be read, is not a private key, is
    /// encrypted, or cannot be stored.
    pub fn resolve(identity: &str) -> Result<Self, AuthError> {
        if identity.contains(INLINE_KEY_MARKER) {
            Self::from_key_material(identity)
        } else {
            Self::from_file(&expand_tilde(identity))
        }
    }

    /// Builds a credential from inline private key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is not a usable key or the temporary
    /// key file cannot be written.
    pub fn from_key_material(material: &str) -> Result<Self, AuthError> {
        validate_key(material, "inline identity")?;

        let mut file = tempfile::Builder::new()
            .prefix("gclone-identity-")
            .tempfile()
            .map_err(AuthError::TempFile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(AuthError::TempFile)?;
        }

        // ssh rejects key files without a final newline
        file.write_all(material.trim_end().as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .and_then(|()| file.flush())
            .map_err(AuthError::TempFile)?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), "stored inline identity");

        Ok(Self {
            key: KeySource::Inline(path),
        })
    }

    /// Builds a credential from a key file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a usable key.
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path).map_err(|source| AuthError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        validate_key(&content, &path.display().to_string())?;
        debug!(path = %path.display(), "using identity file");

        Ok(Self {
            key: KeySource::File(path.to_path_buf()),
        })
    }

    /// Path of the key file ssh will read.
    #[must_use]
    pub fn key_path(&self) -> &Path {
        match &self.key {
            KeySource::File(path) => path.as_path(),
            KeySource::Inline(path) => &**path,
        }
    }

    /// Whether the key came from inline material.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self.key, KeySource::Inline(_))
    }

    /// The ssh command line git should use for this identity.
    #[must_use]
    pub fn ssh_command(&self) -> String {
        format!(
            "ssh -i {} -o IdentitiesOnly=yes",
            shell_words::quote(&self.key_path().to_string_lossy())
        )
    }

    /// Environment variables to set on every git invocation that may connect.
    #[must_use]
    pub fn git_env(&self) -> Vec<(&'static str, String)> {
        vec![(SSH_COMMAND_ENV, self.ssh_command())]
    }
}

/// Checks that `content` holds an unencrypted private key.
fn validate_key(content: &str, origin: &str) -> Result<(), AuthError> {
    if !(content.contains("-----BEGIN") && content.contains("PRIVATE KEY-----")) {
        return Err(AuthError::InvalidKey(origin.to_string()));
    }
    if content.contains("ENCRYPTED") {
        return Err(AuthError::Encrypted(origin.to_string()));
    }
    Ok(())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(path)
}
