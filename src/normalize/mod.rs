//! Tolerant field extraction over scraper output.
//!
//! Scraper items are arbitrary JSON whose field names drift between actors and
//! versions. Canonical fields are resolved through ordered alias tables of dotted
//! paths (`stats.diggCount`), and metrics fall back to a depth-first search over
//! the whole item when no known alias carries a value.

use serde_json::Value;

/// Subtrees that hold creator metadata; their numeric ids must never be read as metrics
pub const AUTHOR_KEYS: &[&str] = &["author", "authorMeta"];

/// Known comment-count aliases, most specific first
pub const COMMENT_PATHS: &[&str] = &[
    "commentCount",
    "comments",
    "comment_count",
    "stats.commentCount",
    "stats.comment_count",
    "stats.comments",
    "statistics.commentCount",
    "statistics.comment_count",
    "engagement.commentCount",
    "engagement.comments",
    "commentsCount",
    "totalCommentCount",
    "numComments",
];

/// Deepest nesting level visited by [`DeepSearch`]
pub const MAX_SEARCH_DEPTH: usize = 16;

/// Coerce any JSON value to a non-negative integer.
///
/// Numbers are truncated, text is read like a lenient integer parse (leading
/// digits only), and everything else is 0. Negative values clamp to 0.
pub fn to_number(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if n.is_i64() {
                0
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f.trunc() as u64)
                    .unwrap_or(0)
            }
        }
        Value::String(s) => parse_leading_integer(s),
        _ => 0,
    }
}

fn parse_leading_integer(text: &str) -> u64 {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];

    if negative || digits.is_empty() {
        return 0;
    }

    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// Resolve a dotted path inside a JSON object; `null` counts as absent
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// First alias that is present at all, in declared order
pub fn first_defined<'a>(item: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(item, path))
}

/// Numeric field: the first present alias wins, then goes through [`to_number`]
pub fn numeric_field(item: &Value, paths: &[&str]) -> u64 {
    first_defined(item, paths).map(to_number).unwrap_or(0)
}

/// Text field: the first alias holding non-empty text or a non-zero number wins
pub fn text_field(item: &Value, paths: &[&str]) -> String {
    paths
        .iter()
        .filter_map(|path| lookup(item, path))
        .find_map(as_text)
        .unwrap_or_default()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Array values are comma-joined, plain text passes through
pub fn joined_list(item: &Value, paths: &[&str]) -> String {
    match first_defined(item, paths) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => v
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Depth-first, pre-order search for a metric whose key matches a pattern
#[derive(Debug, Clone, Copy)]
pub struct DeepSearch<'a> {
    /// Case-insensitive substring a key must contain
    pub pattern: &'a str,

    /// Keys whose subtrees are never entered
    pub excluded_keys: &'a [&'a str],

    pub max_depth: usize,
}

impl<'a> DeepSearch<'a> {
    pub fn new(pattern: &'a str, excluded_keys: &'a [&'a str]) -> Self {
        Self {
            pattern,
            excluded_keys,
            max_depth: MAX_SEARCH_DEPTH,
        }
    }

    /// Returns the first positive match, or 0 when nothing matches
    pub fn find(&self, record: &Value) -> u64 {
        let pattern = self.pattern.to_lowercase();
        self.visit(record, &pattern, 0)
    }

    fn visit(&self, node: &Value, pattern: &str, depth: usize) -> u64 {
        if depth > self.max_depth {
            return 0;
        }

        match node {
            Value::Object(map) => {
                for (key, value) in map {
                    if matches!(value, Value::Number(_) | Value::String(_))
                        && key.to_lowercase().contains(pattern)
                    {
                        let n = to_number(value);
                        if n > 0 {
                            return n;
                        }
                    }

                    if (value.is_object() || value.is_array())
                        && !self.excluded_keys.contains(&key.as_str())
                    {
                        let found = self.visit(value, pattern, depth + 1);
                        if found > 0 {
                            return found;
                        }
                    }
                }
                0
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.visit(item, pattern, depth + 1))
                .find(|n| *n > 0)
                .unwrap_or(0),
            _ => 0,
        }
    }
}

/// Search `record` for any key containing `pattern`, skipping `excluded_keys` subtrees
pub fn deep_field_search(record: &Value, pattern: &str, excluded_keys: &[&str]) -> u64 {
    DeepSearch::new(pattern, excluded_keys).find(record)
}

/// First candidate alias that coerces to a positive number, else the deep search result
pub fn extract_metric(record: &Value, candidate_paths: &[&str], fallback: &DeepSearch<'_>) -> u64 {
    candidate_paths
        .iter()
        .filter_map(|path| lookup(record, path))
        .map(to_number)
        .find(|n| *n > 0)
        .unwrap_or_else(|| fallback.find(record))
}

/// Comment count with the standard alias table and author-excluding fallback
pub fn comment_count(record: &Value) -> u64 {
    extract_metric(record, COMMENT_PATHS, &DeepSearch::new("comment", AUTHOR_KEYS))
}
