//! Auth gate — static credential table and bearer token derivation.
//!
//! Tokens are `token_<username>`. They carry no signature and never expire:
//! anyone who knows a username can build a valid-looking token for it. The
//! bearer check only verifies the format.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::ConfigError;

/// Prefix for every issued bearer token.
pub const TOKEN_PREFIX: &str = "token_";

/// Value reported as `token_type` in login responses.
pub const TOKEN_TYPE: &str = "bearer";

/// Built-in credential table used when none is configured.
pub const DEFAULT_CREDENTIALS: &[(&str, &str)] = &[("user123", "password123")];

/// Authentication errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Opaque bearer token handed to clients after login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Derive the token for a username.
    pub fn for_username(username: &str) -> Self {
        Self(format!("{TOKEN_PREFIX}{username}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the username embedded in a well-formed bearer token.
///
/// Only the shape is checked (`token_` followed by at least one character).
pub fn token_subject(token: &str) -> Option<&str> {
    token
        .strip_prefix(TOKEN_PREFIX)
        .filter(|subject| !subject.is_empty())
}

/// Read-only username → password table, fixed at startup.
#[derive(Debug, Clone)]
pub struct CredentialTable {
    entries: HashMap<String, String>,
}

impl CredentialTable {
    /// Build a table from `(username, password)` pairs.
    pub fn new<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    /// Parse a comma-separated `user:pass,user2:pass2` list.
    ///
    /// The password is everything after the first `:`, so it may itself
    /// contain colons. Usernames must be non-empty.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut entries = HashMap::new();
        for raw in list.split(',') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }
            let (user, pass) = entry
                .split_once(':')
                .filter(|(user, _)| !user.is_empty())
                .ok_or_else(|| ConfigError::InvalidCredentialEntry(entry.to_string()))?;
            entries.insert(user.to_string(), pass.to_string());
        }
        if entries.is_empty() {
            return Err(ConfigError::EmptyCredentialTable);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check a username/password pair and issue its token.
    ///
    /// Exact, case-sensitive comparison.
    pub fn login(&self, username: &str, password: &str) -> Result<Token, AuthError> {
        match self.entries.get(username) {
            Some(expected) if expected == password => Ok(Token::for_username(username)),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

impl Default for CredentialTable {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS.iter().copied())
    }
}
