//! Text helpers shared by both template engines
//!
//! Escaping for generated string literals, bounded previews, blank line
//! trimming and block re-indentation.

use tale_types::ExportSettings;

/// Appended to truncated previews
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Escape a text for use inside a generated string literal.
///
/// Every character listed in `characters_needing_escaping` is prefixed with the
/// escape character and every line break is replaced by `newline_character`.
/// The text is scanned once, so replacements are never escaped again.
pub fn escape_text(text: &str, settings: &ExportSettings) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(&settings.newline_character);
            }
            '\n' => out.push_str(&settings.newline_character),
            c if settings.characters_needing_escaping.contains(c) => {
                out.push_str(&settings.escape_character);
                out.push(c);
            }
            c => out.push(c),
        }
    }

    out
}

/// Single line preview of a text, truncated to `max_chars` characters
pub fn text_preview(text: &str, max_chars: usize) -> String {
    let flattened = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let flattened = flattened.trim();

    if flattened.chars().count() <= max_chars {
        return flattened.to_string();
    }

    let mut preview: String = flattened.chars().take(max_chars).collect();
    preview.push_str(PREVIEW_ELLIPSIS);
    preview
}

/// Remove leading and trailing lines that contain only whitespace
pub fn trim_empty_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Re-indent a block: strip its common indentation, then prefix every
/// non-blank line with `indent`. Blank lines become empty.
pub fn indent_block(text: &str, indent: &str) -> String {
    let common = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(leading_whitespace)
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, &line[common..])
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn arbitrary text into an identifier made of `[A-Za-z0-9_]`
pub fn sanitize_identifier(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(escape: &str, targets: &str, newline: &str) -> ExportSettings {
        ExportSettings {
            escape_character: escape.to_string(),
            characters_needing_escaping: targets.to_string(),
            newline_character: newline.to_string(),
            ..ExportSettings::default()
        }
    }

    #[test]
    fn test_escape_newline_exact() {
        let settings = settings("\\", "\"", "\\n");
        assert_eq!(escape_text("Hello\nWorld", &settings), "Hello\\nWorld");
        assert_eq!(escape_text("a\r\nb", &settings), "a\\nb");
    }

    #[test]
    fn test_escape_every_target_is_prefixed() {
        let inputs = ["say \"hi\"", "\"\"\"", "no quotes", "'single' and \"double\"", ""];
        for target in ['"', '\'', '%'] {
            let settings = settings("\\", &target.to_string(), "\\n");
            for input in inputs {
                let escaped = escape_text(input, &settings);
                let chars: Vec<char> = escaped.chars().collect();
                for (i, c) in chars.iter().enumerate() {
                    if *c == target {
                        assert!(i > 0 && chars[i - 1] == '\\', "unescaped {target} in {escaped}");
                    }
                }
                let before = input.chars().filter(|c| *c == target).count();
                let after = escaped.chars().filter(|c| *c == target).count();
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_preview_truncates_and_flattens() {
        assert_eq!(text_preview("short", 15), "short");
        assert_eq!(text_preview("line one\nline two", 8), "line one...");
        assert_eq!(text_preview("  padded \r\n ", 15), "padded");
    }

    #[test]
    fn test_trim_empty_lines() {
        assert_eq!(trim_empty_lines("\n  \n  code\n    more\n \n"), "  code\n    more");
        assert_eq!(trim_empty_lines("   \n\t\n"), "");
    }

    #[test]
    fn test_indent_block() {
        let block = "    if x then\n        y()\n\n    end";
        assert_eq!(indent_block(block, "  "), "  if x then\n      y()\n\n  end");
    }

    #[test]
    fn test_whitespace_only_block_is_empty_for_any_indent() {
        for indent in ["", " ", "\t\t", "        "] {
            assert_eq!(indent_block(&trim_empty_lines("  \n\t \n   "), indent), "");
        }
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Old Bob's Shop"), "Old_Bob_s_Shop");
        assert_eq!(sanitize_identifier("--a--b--"), "a_b");
    }
}
