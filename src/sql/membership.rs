use std::collections::BTreeSet;
use tracing::trace;

use crate::catalog::ColumnCatalog;
use crate::sql::select_lexer::SelectClause;

/// Compute the catalog columns currently referenced by the select list of
/// `text`.
///
/// A column counts as present only when a select-list item is exactly that
/// column name (optionally preceded by DISTINCT), so a column whose name is
/// a substring of another never produces a false positive. Structural
/// keywords are matched case-insensitively, column names exactly.
/// Malformed or empty text yields an empty set.
pub fn resolve_membership(text: &str, catalog: &ColumnCatalog) -> BTreeSet<String> {
    if text.trim().is_empty() {
        return BTreeSet::new();
    }

    let clause = SelectClause::locate(text);
    let members: BTreeSet<String> = clause
        .items
        .iter()
        .filter_map(|item| item.reference(text))
        .filter(|name| catalog.contains(name))
        .map(str::to_string)
        .collect();

    trace!(target: "membership",
        "Resolved {} catalog columns from {} select items",
        members.len(),
        clause.items.len()
    );

    members
}

/// Membership check for a single column
pub fn is_member(text: &str, column: &str) -> bool {
    let clause = SelectClause::locate(text);
    clause.find_reference(text, column).is_some()
}
