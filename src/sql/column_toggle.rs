//! Column insertion and removal on free-form query text
//!
//! These functions keep the select list tidy (no stray, doubled, leading or
//! trailing commas) without understanding the rest of the query. Quoted
//! literals and comments are never rewritten.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

use crate::sql::select_lexer::{Lexer, SelectClause, Token};

static COMMA_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*,)+").unwrap());

static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Insert `column` when it is not present, remove it when it is.
///
/// If removal cannot find the column where it expects it (the caller's
/// `currently_present` disagrees with the text) the text is returned
/// unchanged.
pub fn toggle_column(text: &str, column: &str, currently_present: bool) -> String {
    if currently_present {
        remove_column(text, column)
    } else {
        insert_column(text, column)
    }
}

/// Add `column` as the last element of the select list.
///
/// When the text has a `SELECT ... FROM` clause the column goes at the end
/// of that list; otherwise it is appended to the end of the text. Empty text
/// becomes exactly `column`.
pub fn insert_column(text: &str, column: &str) -> String {
    let column = column.trim();
    if column.is_empty() {
        return text.to_string();
    }
    if text.trim().is_empty() {
        return column.to_string();
    }

    let clause = SelectClause::locate(text);
    let head = &text[..clause.content_end];
    let rest = &text[clause.content_end..clause.list_end];
    let tail = &text[clause.list_end..];

    let mut updated = String::with_capacity(text.len() + column.len() + 2);
    updated.push_str(head);

    if clause.content_end == clause.list_start {
        if clause.list_start > 0 {
            updated.push(' ');
        }
    } else if head.ends_with(',') {
        updated.push(' ');
    } else {
        updated.push_str(", ");
    }
    updated.push_str(column);

    // Comments after the last list element stay after the new column
    let remainder = if rest.trim().is_empty() && tail.is_empty() {
        ""
    } else {
        &text[clause.content_end..]
    };
    if !remainder.is_empty() {
        if !remainder.starts_with(char::is_whitespace) {
            updated.push(' ');
        }
        updated.push_str(remainder);
    }

    debug!(target: "column_toggle", "Inserted column '{}'", column);
    updated
}

/// Remove the select-list item referencing `column` together with exactly
/// one adjacent comma, then normalise the text.
pub fn remove_column(text: &str, column: &str) -> String {
    let clause = SelectClause::locate(text);

    let Some(idx) = clause.find_reference(text, column) else {
        debug!(target: "column_toggle",
            "Column '{}' not found in select list, leaving text unchanged",
            column
        );
        return text.to_string();
    };

    let Some(range) = removal_range(&clause, idx) else {
        return text.to_string();
    };

    let mut updated = String::with_capacity(text.len());
    updated.push_str(&text[..range.start]);
    updated.push_str(&text[range.end..]);

    debug!(target: "column_toggle", "Removed column '{}' (item {} of {})",
        column,
        idx + 1,
        clause.items.len()
    );
    normalize_query_text(&updated)
}

/// Byte range to excise for item `idx`: the reference plus the comma that
/// would otherwise dangle
fn removal_range(clause: &SelectClause, idx: usize) -> Option<Range<usize>> {
    let item = clause.items.get(idx)?;
    let (ref_start, ref_end) = item.reference_span()?;
    let last = clause.items.len() - 1;

    let range = if last == 0 {
        // Sole item: drop it entirely, including any DISTINCT
        item.start..item.end
    } else if idx == 0 {
        ref_start..clause.commas[0] + 1
    } else {
        // Last or middle: the preceding comma goes, the following one
        // (if any) keeps the neighbours joined
        clause.commas[idx - 1]..ref_end
    };
    Some(range)
}

/// Tidy query text: collapse comma runs, drop commas at the edges of the
/// select list and of the text, collapse whitespace runs and trim.
pub fn normalize_query_text(text: &str) -> String {
    let mut current = collapse_runs(text);

    loop {
        let clause = SelectClause::locate(&current);
        let items = &clause.items;
        let edge_comma = if items.len() > 1 && items[0].is_empty() {
            clause.commas.first().copied()
        } else if items.len() > 1 && items[items.len() - 1].is_empty() {
            clause.commas.last().copied()
        } else {
            None
        };

        let Some(comma) = edge_comma else {
            break;
        };
        current.replace_range(comma..comma + 1, " ");
        current = collapse_runs(&current);
    }

    strip_edge_commas(current.trim())
}

/// Apply the comma and whitespace collapses outside literals and comments
fn collapse_runs(text: &str) -> String {
    let tokens = Lexer::new(text).tokenize_all_with_positions();

    let mut segments: Vec<(&str, bool)> = Vec::new();
    let mut cursor = 0;
    for (start, end, token) in &tokens {
        if token.is_opaque() {
            if *start > cursor {
                segments.push((&text[cursor..*start], false));
            }
            segments.push((&text[*start..*end], true));
            cursor = *end;
        }
    }
    if cursor < text.len() {
        segments.push((&text[cursor..], false));
    }

    let mut collapsed = String::with_capacity(text.len());
    for (segment, opaque) in segments {
        if opaque {
            collapsed.push_str(segment);
        } else {
            let without_runs = COMMA_RUNS.replace_all(segment, ",");
            collapsed.push_str(&WHITESPACE_RUNS.replace_all(&without_runs, " "));
        }
    }
    collapsed
}

fn strip_edge_commas(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let tokens = Lexer::new(&current).tokenize_all_with_positions();
        let edge = match (tokens.first(), tokens.last()) {
            (Some((s, e, Token::Comma)), _) => Some(*s..*e),
            (_, Some((s, e, Token::Comma))) => Some(*s..*e),
            _ => None,
        };
        let Some(range) = edge else {
            return current;
        };
        current.replace_range(range, "");
        current = current.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::select_lexer::select_items;

    #[test]
    fn test_insert_into_empty_text() {
        assert_eq!(insert_column("", "a"), "a");
        assert_eq!(insert_column("  \n ", "a"), "a");
    }

    #[test]
    fn test_insert_appends_to_select_list() {
        assert_eq!(
            insert_column("SELECT a FROM CUR", "b"),
            "SELECT a, b FROM CUR"
        );
        assert_eq!(
            insert_column("SELECT a\nFROM CUR", "b"),
            "SELECT a, b\nFROM CUR"
        );
    }

    #[test]
    fn test_insert_separator_policy_without_from() {
        assert_eq!(insert_column("a", "b"), "a, b");
        assert_eq!(insert_column("a,", "b"), "a, b");
        assert_eq!(insert_column("a, ", "b"), "a, b");
        assert_eq!(insert_column("a ", "b"), "a, b");
        assert_eq!(insert_column("SELECT", "b"), "SELECT b");
        assert_eq!(insert_column("SELECT ", "b"), "SELECT b");
    }

    #[test]
    fn test_insert_before_trailing_comments() {
        assert_eq!(
            insert_column("SELECT a -- first\nFROM CUR", "b"),
            "SELECT a, b -- first\nFROM CUR"
        );
        assert_eq!(
            insert_column("SELECT a /* x */ FROM CUR", "b"),
            "SELECT a, b /* x */ FROM CUR"
        );
        assert_eq!(insert_column("a -- note", "b"), "a, b -- note");
        assert_eq!(
            insert_column("SELECT -- pick columns\nFROM CUR", "b"),
            "SELECT b -- pick columns\nFROM CUR"
        );
    }

    #[test]
    fn test_insert_into_empty_select_list() {
        assert_eq!(insert_column("SELECT FROM CUR", "b"), "SELECT b FROM CUR");
        assert_eq!(insert_column("FROM CUR", "b"), "b FROM CUR");
    }

    #[test]
    fn test_remove_last_element() {
        assert_eq!(
            remove_column("SELECT a, b FROM CUR", "b"),
            "SELECT a FROM CUR"
        );
    }

    #[test]
    fn test_remove_first_element() {
        assert_eq!(
            remove_column("SELECT a, b FROM CUR", "a"),
            "SELECT b FROM CUR"
        );
        assert_eq!(
            remove_column("SELECT DISTINCT a, b FROM CUR", "a"),
            "SELECT DISTINCT b FROM CUR"
        );
    }

    #[test]
    fn test_remove_middle_element() {
        assert_eq!(
            remove_column("SELECT a, b, c FROM CUR", "b"),
            "SELECT a, c FROM CUR"
        );
        assert_eq!(remove_column("a,b,c", "b"), "a,c");
    }

    #[test]
    fn test_remove_only_element() {
        assert_eq!(remove_column("SELECT a FROM CUR", "a"), "SELECT FROM CUR");
        assert_eq!(remove_column("a", "a"), "");
    }

    #[test]
    fn test_remove_absent_column_leaves_text_unchanged() {
        let text = "SELECT  a,   b FROM CUR";
        assert_eq!(remove_column(text, "c"), text);
        // Substring of a present column
        assert_eq!(remove_column("SELECT ab FROM CUR", "a"), "SELECT ab FROM CUR");
        // Referenced only inside an expression
        let text = "SELECT sum(a) FROM CUR";
        assert_eq!(remove_column(text, "a"), text);
    }

    #[test]
    fn test_remove_keeps_literals_intact() {
        let text = "SELECT a, b FROM CUR WHERE note = 'x,,  y'";
        assert_eq!(
            remove_column(text, "a"),
            "SELECT b FROM CUR WHERE note = 'x,,  y'"
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_query_text(" , a,, ,b , "), "a,b");
        assert_eq!(normalize_query_text("a ,  , b"), "a , b");
        assert_eq!(normalize_query_text("SELECT , a FROM t"), "SELECT a FROM t");
        assert_eq!(normalize_query_text("SELECT a, FROM t"), "SELECT a FROM t");
        assert_eq!(normalize_query_text("SELECT\n\ta,\n\tb\nFROM t"), "SELECT a, b FROM t");
    }

    #[test]
    fn test_toggle_round_trip_keeps_other_columns() {
        let text = "SELECT a, b FROM CUR WHERE c > 1";
        let with_d = toggle_column(text, "d", false);
        assert_eq!(select_items(&with_d), vec!["a", "b", "d"]);
        let back = toggle_column(&with_d, "d", true);
        assert_eq!(select_items(&back), vec!["a", "b"]);
        assert_eq!(back, text);
    }

    #[test]
    fn test_empty_column_name_is_ignored() {
        assert_eq!(insert_column("SELECT a", "  "), "SELECT a");
        assert_eq!(remove_column("SELECT a", ""), "SELECT a");
    }
}
