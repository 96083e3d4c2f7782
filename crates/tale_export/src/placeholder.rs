// Placeholders - `{{Name}}` substitution and `{{Name_Start}}...{{Name_End}}` ranges
//
// Scalar placeholders are replaced in a single pass so substituted values are
// never scanned again. Ranges keep the indentation of their start marker: the
// rendered block is trimmed, its common indentation removed and the marker's
// indentation applied to every line.

use std::collections::HashMap;
use std::sync::LazyLock;

use dashmap::DashMap;
use regex::{Captures, Regex};

use crate::text::{indent_block, trim_empty_lines};

/// Suffix of the marker opening a range
pub const RANGE_START_SUFFIX: &str = "_Start";
/// Suffix of the marker closing a range
pub const RANGE_END_SUFFIX: &str = "_End";

static SCALAR_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("scalar placeholder pattern is valid")
});

static RANGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+?)_(Start|End)\}\}").expect("range marker pattern is valid")
});

/// Compiled range patterns by range name
static RANGE_PATTERNS: LazyLock<DashMap<String, Regex>> = LazyLock::new(DashMap::new);

/// Replace every scalar placeholder the resolver knows, leaving unknown ones verbatim
pub fn replace_placeholders<F>(code: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    SCALAR_PLACEHOLDER
        .replace_all(code, |caps: &Captures<'_>| {
            let name = &caps[1];
            resolve(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Like [`replace_placeholders`], but every further line of a multi-line
/// value is indented like the line holding the placeholder
pub fn replace_block_placeholders<F>(code: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    SCALAR_PLACEHOLDER
        .replace_all(code, |caps: &Captures<'_>| {
            let Some(value) = resolve(&caps[1]) else {
                return caps[0].to_string();
            };
            let start = caps.get(0).map_or(0, |m| m.start());
            let line_start = code[..start].rfind('\n').map_or(0, |i| i + 1);
            let indent: String = code[line_start..start]
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            if indent.is_empty() || !value.contains('\n') {
                return value;
            }

            value
                .lines()
                .enumerate()
                .map(|(i, line)| match i {
                    0 => line.to_string(),
                    _ if line.trim().is_empty() => String::new(),
                    _ => format!("{}{}", indent, line),
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned()
}

fn range_pattern(name: &str) -> Regex {
    if let Some(pattern) = RANGE_PATTERNS.get(name) {
        return pattern.clone();
    }

    let source = format!(
        r"(?ms)(?:^(?P<indent>[ \t]*))?\{{\{{{name}{start}\}}\}}(?P<inner>.*?)\{{\{{{name}{end}\}}\}}",
        name = regex::escape(name),
        start = RANGE_START_SUFFIX,
        end = RANGE_END_SUFFIX,
    );
    let pattern = Regex::new(&source).expect("escaped range pattern is valid");
    RANGE_PATTERNS.insert(name.to_string(), pattern.clone());
    pattern
}

/// Index right after the line break following `end`, if the rest of that line is blank
fn skip_trailing_line_break(code: &str, end: usize) -> usize {
    let rest = &code[end..];
    let line_end = rest.find('\n').unwrap_or(rest.len());
    if rest[..line_end].trim().is_empty() {
        (end + line_end + 1).min(code.len())
    } else {
        end
    }
}

/// Render every occurrence of the range `name` with `render(inner_template)`
///
/// A range whose start marker begins a line is re-indented to the marker's
/// column. A range that renders to whitespace only disappears together with
/// its line.
pub fn render_range<F>(code: &str, name: &str, mut render: F) -> String
where
    F: FnMut(&str) -> String,
{
    let pattern = range_pattern(name);
    let mut out = String::with_capacity(code.len());
    let mut last = 0;

    for caps in pattern.captures_iter(code) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&code[last..whole.start()]);

        let indent = caps.name("indent").map(|m| m.as_str());
        let inner = caps.name("inner").map_or("", |m| m.as_str());
        let rendered = trim_empty_lines(&render(inner));

        last = whole.end();
        match indent {
            Some(_) if rendered.is_empty() => {
                last = skip_trailing_line_break(code, whole.end());
            }
            Some(indent) => out.push_str(&indent_block(&rendered, indent)),
            None => out.push_str(rendered.trim_start()),
        }
    }

    out.push_str(&code[last..]);
    out
}

/// Keep the content of `name` ranges when `include` holds, drop it otherwise
pub fn render_conditional_range(code: &str, name: &str, include: bool) -> String {
    render_range(code, name, |inner| {
        if include {
            inner.to_string()
        } else {
            String::new()
        }
    })
}

/// Render the content of `name` ranges once per item, joined by line breaks
pub fn render_list_range<T, F>(code: &str, name: &str, items: &[T], mut render: F) -> String
where
    F: FnMut(&str, &T, usize) -> String,
{
    render_range(code, name, |inner| {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| trim_empty_lines(&render(inner, item, index)))
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Names of ranges whose start and end markers do not pair up
pub fn unbalanced_ranges(code: &str) -> Vec<String> {
    let mut depth: HashMap<&str, i64> = HashMap::new();
    let mut broken: Vec<String> = Vec::new();

    for caps in RANGE_MARKER.captures_iter(code) {
        let (Some(name), Some(marker)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let name = name.as_str();
        let counter = depth.entry(name).or_insert(0);
        if marker.as_str() == "Start" {
            *counter += 1;
        } else {
            *counter -= 1;
            if *counter < 0 && !broken.iter().any(|b| b == name) {
                broken.push(name.to_string());
            }
        }
    }

    for (name, counter) in depth {
        if counter > 0 && !broken.iter().any(|b| b == name) {
            broken.push(name.to_string());
        }
    }

    broken.sort();
    broken
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_is_single_pass() {
        let code = "say({{A}}) {{B}} {{Unknown}}";
        let result = replace_placeholders(code, |name| match name {
            "A" => Some("{{B}}".to_string()),
            "B" => Some("b".to_string()),
            _ => None,
        });
        assert_eq!(result, "say({{B}}) b {{Unknown}}");
    }

    #[test]
    fn test_block_placeholder_follows_indentation() {
        let code = "function f()\n    {{Body}}\nend {{Tail}}";
        let result = replace_block_placeholders(code, |name| match name {
            "Body" => Some("a()\n\nif x then\n    b()\nend".to_string()),
            "Tail" => Some("-- one\n-- two".to_string()),
            _ => None,
        });
        assert_eq!(
            result,
            "function f()\n    a()\n\n    if x then\n        b()\n    end\nend -- one\n-- two"
        );
    }

    #[test]
    fn test_range_keeps_marker_indentation() {
        let code = "function f()\n    {{Has_Start}}\n        call()\n        other()\n    {{Has_End}}\nend";
        let result = render_conditional_range(code, "Has", true);
        assert_eq!(result, "function f()\n    call()\n    other()\nend");
    }

    #[test]
    fn test_excluded_range_removes_its_line() {
        let code = "a\n  {{Has_Start}}\n  b\n  {{Has_End}}\nc";
        assert_eq!(render_conditional_range(code, "Has", false), "a\nc");
    }

    #[test]
    fn test_whitespace_only_range_renders_empty() {
        let code = "x\n\t{{Items_Start}}   \n \t \n{{Items_End}}\ny";
        let result = render_range(code, "Items", |inner| inner.to_string());
        assert_eq!(result, "x\ny");
    }

    #[test]
    fn test_inline_range() {
        let code = "if a {{Not_Start}}not {{Not_End}}b";
        assert_eq!(render_conditional_range(code, "Not", true), "if a not b");
        assert_eq!(render_conditional_range(code, "Not", false), "if a b");
    }

    #[test]
    fn test_list_range() {
        let code = "  {{Opts_Start}}\n  opt({{Idx}})\n  {{Opts_End}}";
        let items = ["a", "b"];
        let result = render_list_range(code, "Opts", &items, |inner, item, index| {
            replace_placeholders(inner, |name| match name {
                "Idx" => Some(format!("{}:{}", index, item)),
                _ => None,
            })
        });
        assert_eq!(result, "  opt(0:a)\n  opt(1:b)");
    }

    #[test]
    fn test_unbalanced_ranges() {
        assert!(unbalanced_ranges("{{A_Start}}x{{A_End}}{{B_Start}}{{B_End}}").is_empty());
        assert_eq!(unbalanced_ranges("{{A_Start}}x"), vec!["A"]);
        assert_eq!(unbalanced_ranges("{{B_End}}{{B_Start}}"), vec!["B"]);
    }
}
