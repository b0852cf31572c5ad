//! Repository configuration file parser.
//!
//! Parses the INI-like format: `[section]` headers, `key = value` lines,
//! `#`/`;` comments and quoted values with backslash escapes.

use super::Config;
use crate::error::{Error, Result};

/// Parses configuration file content into a `Config` instance.
pub fn parse(content: &str) -> Result<Config> {
    let mut config = Config::new();
    let mut current_section: Option<String> = None;

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let malformed = || Error::InvalidConfig(format!("line {}: {}", number + 1, line));

        if line.starts_with('[') {
            current_section = Some(parse_section_header(line).ok_or_else(malformed)?);
            continue;
        }

        let section = current_section.as_deref().ok_or_else(malformed)?;
        let (key, value) = parse_key_value(line).ok_or_else(malformed)?;
        config.set(section, &key, &value);
    }

    Ok(config)
}

/// Parses a section header like `[core]`.
fn parse_section_header(line: &str) -> Option<String> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();

    if inner.is_empty() || !inner.chars().all(is_name_char) {
        return None;
    }

    Some(inner.to_string())
}

/// Parses a key-value line like `key = value` or `key=value`.
fn parse_key_value(line: &str) -> Option<(String, String)> {
    let eq_pos = line.find('=')?;

    let key = line[..eq_pos].trim();
    if key.is_empty() || !key.chars().all(is_name_char) {
        return None;
    }

    Some((key.to_string(), parse_value(&line[eq_pos + 1..])))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}

/// Parses a value, handling quotes and escapes.
fn parse_value(s: &str) -> String {
    let s = remove_inline_comment(s.trim());

    if let Some(quoted) = s.strip_prefix('"') {
        if let Some(end) = find_closing_quote(quoted) {
            return unescape_value(&quoted[..end]);
        }
    }

    unescape_value(s)
}

fn find_closing_quote(s: &str) -> Option<usize> {
    let mut escape_next = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escape_next => escape_next = false,
            '\\' => escape_next = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Removes inline comments from a value.
fn remove_inline_comment(s: &str) -> &str {
    let mut in_quotes = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' => escape_next = true,
            '"' => in_quotes = !in_quotes,
            '#' | ';' if !in_quotes => return s[..i].trim_end(),
            _ => {}
        }
    }

    s
}

/// Unescapes a value string.
fn unescape_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            _ => {
                result.push(c);
                continue;
            }
        }
        chars.next();
    }

    result
}

/// Escapes a value so that `parse_value` reads it back unchanged.
pub(super) fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }

    let needs_quotes = escaped.contains(['#', ';'])
        || escaped.starts_with(char::is_whitespace)
        || escaped.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("[core]").unwrap(), "core");
        assert_eq!(parse_section_header("[ core ]").unwrap(), "core");
        assert!(parse_section_header("[]").is_none());
        assert!(parse_section_header("[core").is_none());
        assert!(parse_section_header("[remote \"origin\"]").is_none());
    }

    #[test]
    fn test_parse_key_value_simple() {
        let (key, value) = parse_key_value("tracked = notes.txt").unwrap();
        assert_eq!(key, "tracked");
        assert_eq!(value, "notes.txt");
    }

    #[test]
    fn test_parse_key_value_no_spaces() {
        let (key, value) = parse_key_value("verifyObjects=true").unwrap();
        assert_eq!(key, "verifyObjects");
        assert_eq!(value, "true");
    }

    #[test]
    fn test_parse_key_value_quoted() {
        let (_, value) = parse_key_value("tracked = \"my notes.txt\"").unwrap();
        assert_eq!(value, "my notes.txt");

        let (_, value) = parse_key_value(r#"tracked = "a \"b\" c""#).unwrap();
        assert_eq!(value, "a \"b\" c");
    }

    #[test]
    fn test_parse_key_value_with_comment() {
        let (_, value) = parse_key_value("tracked = notes.txt # the file").unwrap();
        assert_eq!(value, "notes.txt");

        let (_, value) = parse_key_value("tracked = notes.txt ; the file").unwrap();
        assert_eq!(value, "notes.txt");

        let (_, value) = parse_key_value("tracked = \"notes#1.txt\"").unwrap();
        assert_eq!(value, "notes#1.txt");
    }

    #[test]
    fn test_parse_key_value_escaped() {
        let (_, value) = parse_key_value("message = Hello\\nWorld").unwrap();
        assert_eq!(value, "Hello\nWorld");
    }

    #[test]
    fn test_parse_key_value_invalid() {
        assert!(parse_key_value("no equals sign").is_none());
        assert!(parse_key_value("= value").is_none());
        assert!(parse_key_value("bad key = value").is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
# written by trackit init
[core]
    tracked = notes.txt
    verifyObjects = false ; inline comment

[extra]
    empty =
"#;

        let config = parse(content).unwrap();
        assert_eq!(config.get("core", "tracked"), Some("notes.txt"));
        assert_eq!(config.get("core", "verifyobjects"), Some("false"));
        assert_eq!(config.get("extra", "empty"), Some(""));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(matches!(
            parse("tracked = x\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            parse("[core]\njust text\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(parse("[core\n"), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_escape_value_reads_back() {
        for value in ["plain", "a b", " lead", "trail ", "x#y", "semi;colon", "q\"uote", "back\\slash", "two\nlines", ""] {
            let line = format!("key = {}", escape_value(value));
            let (_, parsed) = parse_key_value(&line).unwrap();
            assert_eq!(parsed, value, "value {:?} via {:?}", value, line);
        }
    }
}
