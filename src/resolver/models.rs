// Pcheckers — Resolved credential models
//
// SECURITY: the password of a resolved credential is private, zeroized on
// drop and never part of Debug or Display output.

use std::collections::BTreeMap;
use std::fmt;

use zeroize::Zeroizing;

/// How the password column of a resolved credential is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordExposure {
    /// The plaintext from the password map.
    #[default]
    Plain,
    /// The password reference instead of the plaintext.
    Reference,
}

/// Knobs of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Narrow several matches down to the one whose title equals the filter.
    pub prefer_single_exact: bool,
    /// Retry with separators replaced by blanks when nothing matches.
    pub loosen: bool,
    pub exposure: PasswordExposure,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            prefer_single_exact: true,
            loosen: true,
            exposure: PasswordExposure::Plain,
        }
    }
}

/// An account title with its username and password looked up.
#[derive(Clone)]
pub struct ResolvedCredential {
    pub title: String,
    pub username: String,
    password: Zeroizing<String>,
}

impl ResolvedCredential {
    pub fn new(title: String, username: String, password: String) -> Self {
        Self {
            title,
            username,
            password: Zeroizing::new(password),
        }
    }

    /// The password column, as selected by [`PasswordExposure`].
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.username)
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub matches: Vec<ResolvedCredential>,
    /// Each distinct filter tried, with the 1-based attempt that first
    /// produced it (1 is the verbatim filter).
    pub attempts: BTreeMap<String, usize>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Filters tried, sorted.
    pub fn tried(&self) -> Vec<&str> {
        self.attempts.keys().map(String::as_str).collect()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
