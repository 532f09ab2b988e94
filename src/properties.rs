use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use error_stack::{IntoReport, Report, ResultExt};

#[derive(Debug)]
pub struct PropertiesError;
impl fmt::Display for PropertiesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Properties error")
    }
}
impl std::error::Error for PropertiesError {}

pub type PropertiesResult<T> = error_stack::Result<T, PropertiesError>;

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// Key/value pairs read from `.properties` text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn load<R: Read>(mut reader: R) -> PropertiesResult<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .into_report()
            .attach_printable("Failed to read the properties stream")
            .change_context(PropertiesError)?;
        // ISO-8859-1 is the traditional encoding: every byte maps to one char
        let text = String::from_utf8(bytes).unwrap_or_else(|invalid| {
            log::debug!("Properties text is not UTF-8, reading it as ISO-8859-1");
            invalid.into_bytes().iter().map(|&b| b as char).collect()
        });
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> PropertiesResult<Self> {
        let mut properties = Self::new();
        let mut logical = String::new();
        let mut continuing = false;
        for (index, raw) in physical_lines(text).enumerate() {
            let line = raw.trim_start_matches(is_blank);
            if continuing {
                logical.push_str(line);
            } else {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                logical.clear();
                logical.push_str(line);
            }
            let trailing = logical.chars().rev().take_while(|c| *c == '\\').count();
            if trailing % 2 == 1 {
                logical.pop();
                continuing = true;
                continue;
            }
            continuing = false;
            properties
                .insert_line(&logical)
                .attach_printable_lazy(|| format!("Malformed entry ending at line {}", index + 1))?;
        }
        if continuing {
            properties.insert_line(&logical)?;
        }
        Ok(properties)
    }

    fn insert_line(&mut self, line: &str) -> PropertiesResult<()> {
        let (key, value) = split_entry(line);
        let key = unescape(key)?;
        let value = unescape(value)?;
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// Lines end at `\r\n`, `\n` or a lone `\r`.
fn physical_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(end) => {
                let line = &rest[..end];
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}

// Splits a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut has_separator = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' {
            key_end = index;
            has_separator = true;
            break;
        } else if is_blank(c) {
            key_end = index;
            break;
        }
    }
    let key = &line[..key_end];
    let mut rest = &line[key_end..];
    if has_separator {
        rest = &rest[1..];
    }
    rest = rest.trim_start_matches(is_blank);
    if !has_separator {
        if let Some(stripped) = rest.strip_prefix(|c: char| c == '=' || c == ':') {
            rest = stripped.trim_start_matches(is_blank);
        }
    }
    (key, rest)
}

fn read_code_unit(chars: &mut std::str::Chars<'_>) -> PropertiesResult<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Report::new(PropertiesError)
            .attach_printable(format!("Malformed \\uxxxx encoding: \\u{}", hex)));
    }
    u32::from_str_radix(&hex, 16)
        .into_report()
        .attach_printable_lazy(|| format!("Malformed \\uxxxx encoding: \\u{}", hex))
        .change_context(PropertiesError)
}

fn unescape(raw: &str) -> PropertiesResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\x0c'),
            'u' => {
                let unit = read_code_unit(&mut chars)?;
                let code_point = if (0xD800..0xDC00).contains(&unit) {
                    // high surrogate, must be followed by an escaped low surrogate
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_code_unit(&mut chars)?,
                        _ => 0,
                    };
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(Report::new(PropertiesError)
                            .attach_printable(format!("Unpaired surrogate \\u{:04X}", unit)));
                    }
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                let decoded = char::from_u32(code_point).ok_or_else(|| {
                    Report::new(PropertiesError)
                        .attach_printable(format!("Invalid code point U+{:04X}", code_point))
                })?;
                out.push(decoded);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators() {
        let properties = Properties::parse(
            "clientSecret=secret\nclientId : 123\naccessToken APP_USR-1\nappId   =   42\n",
        )
        .unwrap();
        assert_eq!(properties.len(), 4);
        assert_eq!(properties.get("clientSecret"), Some("secret"));
        assert_eq!(properties.get("clientId"), Some("123"));
        assert_eq!(properties.get("accessToken"), Some("APP_USR-1"));
        assert_eq!(properties.get("appId"), Some("42"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let properties =
            Properties::parse("# comment\n   ! another\n\n\t\nkey=value\n#key=other\n").unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get("key"), Some("value"));
    }

    #[test]
    fn test_empty_value_and_key_only() {
        let properties = Properties::parse("empty=\nalone\n").unwrap();
        assert_eq!(properties.get("empty"), Some(""));
        assert_eq!(properties.get("alone"), Some(""));
    }

    #[test]
    fn test_line_continuation() {
        let properties = Properties::parse("fruits=apple, \\\n    banana, \\\n    pear\n").unwrap();
        assert_eq!(properties.get("fruits"), Some("apple, banana, pear"));
    }

    #[test]
    fn test_escaped_backslash_is_not_continuation() {
        let properties = Properties::parse("path=c:\\\\dir\\\\\nnext=1\n").unwrap();
        assert_eq!(properties.get("path"), Some("c:\\dir\\"));
        assert_eq!(properties.get("next"), Some("1"));
    }

    #[test]
    fn test_escapes() {
        let properties =
            Properties::parse("my\\ key\\=x=tab\\there\\nnl \\u00e9\\uD83D\\uDE00\n").unwrap();
        assert_eq!(properties.get("my key=x"), Some("tab\there\nnl é😀"));
    }

    #[test]
    fn test_crlf_lines() {
        let properties = Properties::parse("a=1\r\nb=2\r\n").unwrap();
        assert_eq!(properties.get("a"), Some("1"));
        assert_eq!(properties.get("b"), Some("2"));
    }

    #[test]
    fn test_later_duplicate_overrides() {
        let properties = Properties::parse("a=1\na=2\n").unwrap();
        assert_eq!(properties.get("a"), Some("2"));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        assert!(Properties::parse("a=\\u12\n").is_err());
        assert!(Properties::parse("a=\\uZZZZ\n").is_err());
        assert!(Properties::parse("a=\\uD83D\n").is_err());
        assert!(Properties::parse("a=\\u+041\n").is_err());
        assert!(Properties::parse("a=\\u-041\n").is_err());
    }

    #[test]
    fn test_load_reads_latin1() {
        let bytes: &[u8] = b"# configura\xe7\xe3o\nclientSecret=s\nname=Jos\xe9\n";
        let properties = Properties::load(bytes).unwrap();
        assert_eq!(properties.get("clientSecret"), Some("s"));
        assert_eq!(properties.get("name"), Some("Jos\u{e9}"));
    }

    #[test]
    fn test_load_keeps_utf8() {
        let bytes = "name=Jos\u{e9}\n".as_bytes();
        let properties = Properties::load(bytes).unwrap();
        assert_eq!(properties.get("name"), Some("Jos\u{e9}"));
    }

    #[test]
    fn test_lone_carriage_return_ends_line() {
        let properties = Properties::parse("a=1\rb=2\rc=x\\\r  y\r").unwrap();
        assert_eq!(properties.len(), 3);
        assert_eq!(properties.get("a"), Some("1"));
        assert_eq!(properties.get("b"), Some("2"));
        assert_eq!(properties.get("c"), Some("xy"));
    }

    #[test]
    fn test_load_from_reader() {
        let bytes: &[u8] = b"clientId=abc\n";
        let properties = Properties::load(bytes).unwrap();
        assert_eq!(properties.get("clientId"), Some("abc"));
        assert!(properties.contains_key("clientId"));
    }
}
