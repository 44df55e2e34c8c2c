//! # companion_core
//!
//! Core domain logic for Companion: the credential check, the per-token
//! session store and the chat provider abstraction.

pub mod auth;
pub mod chat;
pub mod config;
pub mod llm;
pub mod persona;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
