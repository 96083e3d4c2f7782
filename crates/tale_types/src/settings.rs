// Export Settings - Project wide text escaping configuration

use serde::{Deserialize, Serialize};

/// Default character budget of text previews
pub const DEFAULT_PREVIEW_LENGTH: usize = 15;

/// Escaping and preview settings of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Character written in front of every character that needs escaping
    #[serde(default = "default_escape_character")]
    pub escape_character: String,
    /// Characters that must be escaped in generated string literals
    #[serde(default = "default_characters_needing_escaping")]
    pub characters_needing_escaping: String,
    /// Replacement for line breaks in generated string literals
    #[serde(default = "default_newline_character")]
    pub newline_character: String,
    /// Character budget of text previews
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
}

fn default_escape_character() -> String {
    "\\".to_string()
}

fn default_characters_needing_escaping() -> String {
    "\"".to_string()
}

fn default_newline_character() -> String {
    "\\n".to_string()
}

fn default_preview_length() -> usize {
    DEFAULT_PREVIEW_LENGTH
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            escape_character: default_escape_character(),
            characters_needing_escaping: default_characters_needing_escaping(),
            newline_character: default_newline_character(),
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: ExportSettings = serde_json::from_str(r#"{"escape_character": "%"}"#).unwrap();
        assert_eq!(settings.escape_character, "%");
        assert_eq!(settings.characters_needing_escaping, "\"");
        assert_eq!(settings.newline_character, "\\n");
        assert_eq!(settings.preview_length, DEFAULT_PREVIEW_LENGTH);
    }
}
