// Language Key Paths - `lang_key(tale_choice.choices[0].text)` support
//
// The scripting engine cannot hand an expression's origin to a function, so
// calls are rewritten to pass the member path as a string. The path is then
// walked through the render context and its last parent decides which
// kind of key is generated.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tale_types::LanguageKeyCategory;

/// Name of the scripting function generating language keys
pub const LANG_KEY_FUNCTION: &str = "lang_key";

static LANG_KEY_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\blang_key\(\s*([A-Za-z_][A-Za-z0-9_]*(?:\s*\.\s*[A-Za-z_][A-Za-z0-9_]*|\s*\[\s*(?:[0-9]+|"[^"'\\]*"|'[^"'\\]*')\s*\])*)\s*\)"#,
    )
    .expect("lang_key call pattern is valid")
});

/// Rewrite `lang_key(a.b[0]["c"].d)` into `lang_key("a.b[0]['c'].d")`
///
/// Calls that already pass a string literal are left alone.
pub fn quote_lang_key_paths(code: &str) -> String {
    LANG_KEY_CALL
        .replace_all(code, |caps: &Captures<'_>| match LanguageKeyPath::parse(&caps[1]) {
            Some(path) => format!("{}(\"{}\")", LANG_KEY_FUNCTION, path),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// One step of a member path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Member(String),
    Index(usize),
    /// String subscript such as `fields["Name"]`
    Key(String),
}

/// Parsed member path such as `tale_choice.choices[0].text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageKeyPath {
    root: String,
    tokens: Vec<PathToken>,
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn identifier(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
        out.push(c);
    }
    out
}

/// Content of a subscript, the opening bracket already consumed
fn subscript(chars: &mut Peekable<Chars<'_>>) -> Option<PathToken> {
    let mut inner = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            let inner = inner.trim();
            let quoted = ['"', '\''].into_iter().find_map(|quote| {
                inner
                    .strip_prefix(quote)
                    .and_then(|rest| rest.strip_suffix(quote))
            });
            return match quoted {
                Some(key) if !key.contains(['"', '\'', '\\']) => Some(PathToken::Key(key.to_string())),
                Some(_) => None,
                None => inner.parse().ok().map(PathToken::Index),
            };
        }
        inner.push(c);
    }
    None
}

impl LanguageKeyPath {
    /// Parse a member path; `None` when it is not one
    ///
    /// Whitespace between tokens is ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let mut chars = path.trim().chars().peekable();
        let root = identifier(&mut chars);
        if root.is_empty() || root.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let mut tokens = Vec::new();
        loop {
            skip_whitespace(&mut chars);
            match chars.next() {
                None => break,
                Some('.') => {
                    skip_whitespace(&mut chars);
                    let member = identifier(&mut chars);
                    if member.is_empty() {
                        return None;
                    }
                    tokens.push(PathToken::Member(member));
                }
                Some('[') => tokens.push(subscript(&mut chars)?),
                Some(_) => return None,
            }
        }

        Some(Self { root, tokens })
    }

    /// Root variable name
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Tokens after the root
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Tokens leading to the parent of the last member, and that member
    ///
    /// `None` if the path does not end in a member access.
    pub fn split_last_member(&self) -> Option<(&[PathToken], &str)> {
        match self.tokens.split_last() {
            Some((PathToken::Member(member), parents)) => Some((parents, member.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for LanguageKeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for token in &self.tokens {
            match token {
                PathToken::Member(m) => write!(f, ".{}", m)?,
                PathToken::Index(i) => write!(f, "[{}]", i)?,
                PathToken::Key(k) => write!(f, "['{}']", k)?,
            }
        }
        Ok(())
    }
}

/// Category of a key for member `member` of a context value tagged `kind`
///
/// `object_type` is the object's type for values of kind `object`.
pub fn key_category(kind: &str, member: &str, object_type: Option<&str>) -> Option<LanguageKeyCategory> {
    match (kind, member) {
        ("object", "name") if object_type == Some("quest") => Some(LanguageKeyCategory::QuestText),
        ("object", "name") => Some(LanguageKeyCategory::ObjectName),
        ("field", "value") => Some(LanguageKeyCategory::FieldValue),
        ("text_line", "text" | "unescaped_text") => Some(LanguageKeyCategory::DialogLine),
        ("choice_option", "text" | "unescaped_text") => Some(LanguageKeyCategory::ChoiceText),
        ("action", "floating_text" | "unescaped_floating_text") => Some(LanguageKeyCategory::DialogLine),
        ("reference", "text" | "unescaped_text") => Some(LanguageKeyCategory::DialogLine),
        _ => None,
    }
}
