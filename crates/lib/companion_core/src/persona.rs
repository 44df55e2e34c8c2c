//! Persona instruction sent as the system prompt of every conversation.

use std::path::Path;

use tracing::info;

use crate::config::ConfigError;

/// Built-in persona, compiled into the binary.
pub const DEFAULT_PERSONA: &str = include_str!("../persona.md");

/// Resolve the persona text: the file at `path` if given, else the built-in.
pub fn load(path: Option<&Path>) -> Result<String, ConfigError> {
    match path {
        None => Ok(DEFAULT_PERSONA.to_string()),
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::PersonaFile {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), bytes = text.len(), "loaded persona from file");
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_persona_is_not_empty() {
        assert!(!DEFAULT_PERSONA.trim().is_empty());
        assert_eq!(load(None).unwrap(), DEFAULT_PERSONA);
    }

    #[test]
    fn persona_file_overrides_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Be terse.").unwrap();
        assert_eq!(load(Some(file.path())).unwrap(), "Be terse.");
    }

    #[test]
    fn missing_persona_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.md");
        assert!(matches!(
            load(Some(&missing)),
            Err(ConfigError::PersonaFile { .. })
        ));
    }
}
