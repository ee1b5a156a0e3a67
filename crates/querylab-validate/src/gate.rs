//! Lexical allow-list for submitted queries.
//!
//! A forbidden verb anywhere in the text, string literals and comments
//! included, rejects the query.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use querylab_core::{Error, Result};

/// Verbs that may never appear as a whole word in a submitted query.
pub const FORBIDDEN_KEYWORDS: [&str; 9] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "EXEC", "PRAGMA",
];

static LEADING_KEYWORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(SELECT|WITH)\b").ok());

static FORBIDDEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({})\b", FORBIDDEN_KEYWORDS.join("|"))).ok()
});

/// Accept `sql` only if it is a single read-only `SELECT`/`WITH` query.
///
/// Normalization (trim, uppercase) is for inspection only; callers execute
/// the original text.
pub fn check_query(sql: &str) -> Result<()> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(Error::Security("query is empty".to_string()));
    }
    let normalized = trimmed.to_uppercase();

    let (Some(leading), Some(forbidden)) = (LEADING_KEYWORD.as_ref(), FORBIDDEN.as_ref()) else {
        return Err(Error::Security(
            "query gate patterns failed to compile".to_string(),
        ));
    };

    if !leading.is_match(&normalized) {
        return Err(Error::Security(format!(
            "only SELECT or WITH queries are allowed: {}",
            excerpt(trimmed)
        )));
    }

    if let Some(found) = forbidden.find(&normalized) {
        return Err(Error::Security(format!(
            "forbidden keyword {} in query: {}",
            found.as_str(),
            excerpt(trimmed)
        )));
    }

    if let Some(offset) = second_statement_offset(trimmed) {
        return Err(Error::Security(format!(
            "multiple statements are not allowed (extra statement at byte {offset}): {}",
            excerpt(trimmed)
        )));
    }

    debug!(query_len = sql.len(), "query accepted by gate");
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    SingleQuoted,
    DoubleQuoted,
    Backtick,
    Bracket,
    LineComment,
    BlockComment,
}

/// Byte offset of the first code after a top-level `;`, if any.
///
/// Semicolons inside literals, quoted identifiers and comments are ignored;
/// a trailing `;` followed only by whitespace or comments is allowed.
fn second_statement_offset(sql: &str) -> Option<usize> {
    let mut state = Scan::Code;
    let mut terminated = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match state {
            Scan::Code => {
                let next = chars.peek().map(|(_, next)| *next);
                match (ch, next) {
                    ('-', Some('-')) => {
                        chars.next();
                        state = Scan::LineComment;
                    }
                    ('/', Some('*')) => {
                        chars.next();
                        state = Scan::BlockComment;
                    }
                    (c, _) if c.is_whitespace() => {}
                    _ if terminated => return Some(offset),
                    (';', _) => terminated = true,
                    ('\'', _) => state = Scan::SingleQuoted,
                    ('"', _) => state = Scan::DoubleQuoted,
                    ('`', _) => state = Scan::Backtick,
                    ('[', _) => state = Scan::Bracket,
                    _ => {}
                }
            }
            // Doubled quotes re-enter the literal on the next character.
            Scan::SingleQuoted if ch == '\'' => state = Scan::Code,
            Scan::DoubleQuoted if ch == '"' => state = Scan::Code,
            Scan::Backtick if ch == '`' => state = Scan::Code,
            Scan::Bracket if ch == ']' => state = Scan::Code,
            Scan::LineComment if ch == '\n' => state = Scan::Code,
            Scan::BlockComment if ch == '*' => {
                if chars.peek().map(|(_, next)| *next) == Some('/') {
                    chars.next();
                    state = Scan::Code;
                }
            }
            _ => {}
        }
    }

    None
}

fn excerpt(sql: &str) -> String {
    const LIMIT: usize = 120;
    if sql.chars().count() <= LIMIT {
        sql.to_string()
    } else {
        let head: String = sql.chars().take(LIMIT).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::second_statement_offset;

    #[test]
    fn semicolons_in_literals_and_comments_are_ignored() {
        assert_eq!(second_statement_offset("SELECT ';' AS s"), None);
        assert_eq!(second_statement_offset("SELECT 'it''s; fine'"), None);
        assert_eq!(second_statement_offset("SELECT 1 -- done; really\n"), None);
        assert_eq!(second_statement_offset("SELECT 1 /* a; b */"), None);
        assert_eq!(second_statement_offset("SELECT \"a;b\" FROM t"), None);
    }

    #[test]
    fn trailing_semicolon_is_allowed() {
        assert_eq!(second_statement_offset("SELECT 1;"), None);
        assert_eq!(second_statement_offset("SELECT 1;  \n -- bye\n"), None);
        assert_eq!(second_statement_offset("SELECT 1; /* bye */"), None);
    }

    #[test]
    fn code_after_semicolon_is_reported() {
        assert_eq!(second_statement_offset("SELECT 1; SELECT 2"), Some(10));
        assert_eq!(second_statement_offset("SELECT 1;;"), Some(9));
    }
}
