use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::data::cell_compare::{compare_sort_keys, parse_number, SortKey};
use crate::data::filter_spec::{FilterSpec, NumericFilter, SortDirection, SortSpec};
use crate::data::query_result::{QueryResult, Row, EMPTY_LABEL};

/// The filtered, sorted projection of a result. Rows are copies of source
/// rows; `source_rows[i]` is the index in the source of `rows[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    #[serde(skip)]
    pub source_rows: Vec<usize>,
    #[serde(skip)]
    pub sort: SortSpec,
}

impl DerivedView {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Direction to show next to `header`, only for the sorted column
    pub fn sort_indicator(&self, header: &str) -> Option<SortDirection> {
        match &self.sort.column {
            Some(column) if column == header => Some(self.sort.direction),
            _ => None,
        }
    }
}

/// A row-index view over a result that narrows and reorders rows without
/// touching the source
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    source: &'a QueryResult,
    visible_rows: Vec<usize>,
    empty_label: &'a str,
}

impl<'a> ResultView<'a> {
    pub fn new(source: &'a QueryResult) -> Self {
        Self {
            source,
            visible_rows: (0..source.rows.len()).collect(),
            empty_label: EMPTY_LABEL,
        }
    }

    /// Label null cells match against in exact-value filters
    pub fn with_empty_label(mut self, empty_label: &'a str) -> Self {
        self.empty_label = empty_label;
        self
    }

    /// Keep rows for which `predicate` holds
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool,
    {
        let source = self.source;
        self.visible_rows.retain(|&idx| predicate(&source.rows[idx]));
        self
    }

    /// Keep rows where any cell contains `search`, ignoring case
    pub fn global_search(self, search: &str) -> Self {
        if search.is_empty() {
            return self;
        }
        let needle = search.to_lowercase();
        self.filter(|row| {
            row.iter()
                .any(|cell| cell.search_text().to_lowercase().contains(&needle))
        })
    }

    /// Keep rows whose `header` cell contains `substring`, ignoring case
    pub fn column_contains(self, header: &str, substring: &str) -> Self {
        if substring.is_empty() {
            return self;
        }
        let column = self.source.column_index(header);
        let needle = substring.to_lowercase();
        self.filter(|row| {
            QueryResult::cell(row, column)
                .search_text()
                .to_lowercase()
                .contains(&needle)
        })
    }

    /// Keep rows whose `header` cell is exactly one of `allowed`
    pub fn column_in(self, header: &str, allowed: &BTreeSet<String>) -> Self {
        if allowed.is_empty() {
            return self;
        }
        let column = self.source.column_index(header);
        let empty_label = self.empty_label;
        self.filter(|row| {
            let value = QueryResult::cell(row, column).display_text(empty_label);
            allowed.contains(value.as_ref())
        })
    }

    /// Keep rows whose `header` cell is a number satisfying `filter`. A
    /// filter value that is not a number excludes nothing.
    pub fn numeric(self, header: &str, filter: &NumericFilter) -> Self {
        let Some(target) = parse_number(&filter.value) else {
            trace!(target: "result_view",
                "Numeric filter on '{}' has non-numeric value '{}'; ignoring",
                header,
                filter.value
            );
            return self;
        };
        let column = self.source.column_index(header);
        let operator = filter.operator;
        self.filter(|row| {
            QueryResult::cell(row, column)
                .as_number()
                .is_some_and(|n| operator.apply(n, target))
        })
    }

    /// Stable sort by one column; null cells always last
    pub fn sort_by(mut self, header: &str, direction: SortDirection) -> Self {
        let column = self.source.column_index(header);
        let source = self.source;

        let mut keyed: Vec<(SortKey, usize)> = self
            .visible_rows
            .iter()
            .map(|&idx| (SortKey::from_cell(QueryResult::cell(&source.rows[idx], column)), idx))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_sort_keys(a, b, direction));

        self.visible_rows = keyed.into_iter().map(|(_, idx)| idx).collect();
        self
    }

    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Materialize the visible rows
    pub fn into_derived(self, sort: SortSpec) -> DerivedView {
        let rows = self
            .visible_rows
            .iter()
            .map(|&idx| self.source.rows[idx].clone())
            .collect();
        DerivedView {
            headers: self.source.headers.clone(),
            rows,
            source_rows: self.visible_rows,
            sort,
        }
    }
}

/// Filter and sort `result` according to `spec`
pub fn compute_view(result: &QueryResult, spec: &FilterSpec) -> DerivedView {
    compute_view_with(result, spec, EMPTY_LABEL)
}

/// As [`compute_view`] with a custom label for null cells
pub fn compute_view_with(result: &QueryResult, spec: &FilterSpec, empty_label: &str) -> DerivedView {
    let mut view = ResultView::new(result)
        .with_empty_label(empty_label)
        .global_search(&spec.global_search);

    for (header, substring) in &spec.column_filters {
        view = view.column_contains(header, substring);
    }
    for (header, allowed) in &spec.excel_filters {
        view = view.column_in(header, allowed);
    }
    for (header, filter) in &spec.numeric_filters {
        view = view.numeric(header, filter);
    }
    if let Some(column) = &spec.sort.column {
        view = view.sort_by(column, spec.sort.direction);
    }

    debug!(target: "result_view",
        "Computed view: {} of {} rows ({} active filters)",
        view.row_count(),
        result.rows.len(),
        spec.active_filter_count()
    );
    view.into_derived(spec.sort.clone())
}

/// Remembers the last computed view and returns it again for the same
/// result and an equal spec
#[derive(Debug, Default)]
pub struct ViewMemo {
    last: Option<(Arc<QueryResult>, FilterSpec, Arc<DerivedView>)>,
    empty_label: Option<String>,
}

impl ViewMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_empty_label(empty_label: impl Into<String>) -> Self {
        Self {
            last: None,
            empty_label: Some(empty_label.into()),
        }
    }

    pub fn is_current(&self, result: &Arc<QueryResult>, spec: &FilterSpec) -> bool {
        matches!(&self.last, Some((r, s, _)) if Arc::ptr_eq(r, result) && s == spec)
    }

    pub fn view(&mut self, result: &Arc<QueryResult>, spec: &FilterSpec) -> Arc<DerivedView> {
        if let Some((r, s, view)) = &self.last {
            if Arc::ptr_eq(r, result) && s == spec {
                trace!(target: "result_view", "Reusing memoized view");
                return Arc::clone(view);
            }
        }

        let label = self.empty_label.as_deref().unwrap_or(EMPTY_LABEL);
        let view = Arc::new(compute_view_with(result, spec, label));
        self.last = Some((Arc::clone(result), spec.clone(), Arc::clone(&view)));
        view
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
