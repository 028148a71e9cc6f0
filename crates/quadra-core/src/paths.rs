use crate::error::{Result, RosterError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const QUADRA_DIR: &str = ".quadra";
pub const CONFIG_FILE: &str = ".quadra/config.yaml";
pub const DEFAULT_DB_FILE: &str = ".quadra/roster.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn quadra_dir(root: &Path) -> PathBuf {
    root.join(QUADRA_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured store path. Relative paths are taken from `root`.
pub fn resolve_db_path(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]{1,128}$").unwrap())
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

/// Record and team ids travel in URLs and store keys.
pub fn validate_id(id: &str) -> Result<()> {
    if !id_re().is_match(id) {
        return Err(RosterError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Trim and lowercase an email address; lookups and storage both go through here.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize and validate an email address in one step.
pub fn validated_email(email: &str) -> Result<String> {
    let normalized = normalize_email(email);
    if normalized.len() > 254 || !email_re().is_match(&normalized) {
        return Err(RosterError::InvalidEmail(email.to_string()));
    }
    Ok(normalized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["inv1", "teamA", "a", "3f2c-9a_b"] {
            validate_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ids() {
        for id in ["", "has space", "slash/id", "dot.id"] {
            assert!(validate_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(validated_email("  U1@X.com ").unwrap(), "u1@x.com");
        assert!(validated_email("not-an-email").is_err());
        assert!(validated_email("a@b").is_err());
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/club");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/club/.quadra/config.yaml")
        );
        assert_eq!(
            resolve_db_path(root, Path::new(DEFAULT_DB_FILE)),
            PathBuf::from("/tmp/club/.quadra/roster.db")
        );
        assert_eq!(
            resolve_db_path(root, Path::new("/var/lib/roster.db")),
            PathBuf::from("/var/lib/roster.db")
        );
    }
}
