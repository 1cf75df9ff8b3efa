use std::collections::BTreeMap;
use std::ops::Range;

pub const OPEN: &str = "(***";
pub const CLOSE: &str = "***)";

/// A single-line `(*** key:value, ... ***)` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Keys are unique; a repeated key keeps its last value.
    pub options: BTreeMap<String, String>,
    /// Byte span of the directive line, for error reporting.
    pub span: Range<usize>,
}

impl Directive {
    /// Decode a directive from the concatenated comment text of one line.
    ///
    /// Returns `None` for anything that is not exactly one `(*** ... ***)` envelope
    /// around a well-formed entry list. Such text is ordinary comment content.
    pub fn parse(text: &str, span: Range<usize>) -> Option<Directive> {
        let body = text
            .trim()
            .strip_prefix(OPEN)?
            .strip_suffix(CLOSE)?;
        if body.contains('\n') || body.contains(OPEN) || body.contains(CLOSE) {
            return None;
        }
        let body = body.trim();
        if body.is_empty() {
            return None;
        }

        let mut options = BTreeMap::new();
        for entry in split_entries(body) {
            let (key, value) = parse_entry(entry)?;
            options.insert(key.to_string(), value.to_string());
        }
        Some(Directive { options, span })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Every entry rendered as `key:value`, sorted by key.
    pub fn pairs(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect()
    }
}

/// Split on commas outside double quotes.
fn split_entries(body: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                entries.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&body[start..]);
    entries
}

/// `key:value`, `key=value` or a bare `key`.
fn parse_entry(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.trim();
    let (key, value) = match entry.find([':', '=']) {
        Some(i) => (entry[..i].trim(), entry[i + 1..].trim()),
        None => (entry, ""),
    };
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_key {
        return None;
    }
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some((key, value))
}
