//! Workbench controller state
//!
//! Owns the query text, the catalog, the current result with its profile
//! cache and memoized view, and the filter spec. User actions go through
//! here to the pure functions in `sql` and `data`.

use anyhow::{anyhow, bail, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{QueryBackend, QueryGenerator};
use crate::catalog::ColumnCatalog;
use crate::config::Config;
use crate::data::column_profile::{ColumnProfile, ProfileSettings, ResultProfiles};
use crate::data::data_exporter::{DataExporter, ExportFormat};
use crate::data::filter_spec::{FilterSpec, NumericOperator, SortDirection};
use crate::data::query_result::QueryResult;
use crate::data::result_view::{DerivedView, ViewMemo};
use crate::sql::{resolve_membership, toggle_column};

pub struct Workbench {
    catalog: ColumnCatalog,
    query_text: String,
    result: Option<Arc<QueryResult>>,
    profiles: Option<ResultProfiles>,
    memo: ViewMemo,
    spec: FilterSpec,
    profile_settings: ProfileSettings,
}

impl Workbench {
    pub fn new(catalog: ColumnCatalog, profile_settings: ProfileSettings) -> Self {
        let memo = ViewMemo::with_empty_label(profile_settings.empty_label.clone());
        Self {
            catalog,
            query_text: String::new(),
            result: None,
            profiles: None,
            memo,
            spec: FilterSpec::default(),
            profile_settings,
        }
    }

    /// Workbench over the configured catalog (or the built-in CUR catalog)
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.catalog.path {
            Some(path) => {
                info!(target: "workbench", "Loading catalog from {}", path.display());
                ColumnCatalog::load_from_file(path)?
            }
            None => ColumnCatalog::cur_default(),
        };
        Ok(Self::new(catalog, config.profile.clone()))
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.query_text = text.into();
    }

    /// Catalog columns currently in the select list
    pub fn selected_columns(&self) -> BTreeSet<String> {
        resolve_membership(&self.query_text, &self.catalog)
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selected_columns().contains(column)
    }

    /// Click on a catalog column: add it to the select list or remove it.
    /// Returns whether the column is selected afterwards.
    pub fn toggle_column(&mut self, column: &str) -> Result<bool> {
        if !self.catalog.contains(column) {
            bail!("'{}' is not a catalog column", column);
        }

        let present = self.is_selected(column);
        let updated = toggle_column(&self.query_text, column, present);
        if updated == self.query_text {
            debug!(target: "workbench", "Toggling '{}' left the text unchanged", column);
        }
        self.query_text = updated;

        let selected = self.is_selected(column);
        info!(target: "workbench", "Column '{}' {}", column, if selected { "added" } else { "removed" });
        Ok(selected)
    }

    /// Replace the current result. Profiles and the memoized view are
    /// dropped; filters on headers the new result lacks are removed.
    pub fn set_result(&mut self, result: QueryResult) {
        let result = Arc::new(result);
        self.retain_filters_for(&result.headers);
        self.profiles = Some(ResultProfiles::new(
            Arc::clone(&result),
            self.profile_settings.clone(),
        ));
        self.memo.clear();
        info!(target: "workbench",
            "New result: {} columns, {} rows in {:.1} ms",
            result.column_count(),
            result.rows.len(),
            result.execution_time
        );
        self.result = Some(result);
    }

    fn retain_filters_for(&mut self, headers: &[String]) {
        let known = |h: &String| headers.contains(h);
        self.spec.column_filters.retain(|h, _| known(h));
        self.spec.excel_filters.retain(|h, _| known(h));
        self.spec.numeric_filters.retain(|h, _| known(h));
        if self.spec.sort.column.as_ref().is_some_and(|c| !known(c)) {
            self.spec.clear_sort();
        }
    }

    pub fn result(&self) -> Option<&Arc<QueryResult>> {
        self.result.as_ref()
    }

    /// Run the current query text through the backend
    pub fn execute(&mut self, backend: &dyn QueryBackend) -> Result<usize> {
        if self.query_text.trim().is_empty() {
            bail!("Query text is empty");
        }
        let result = backend.execute(&self.query_text)?;
        let rows = result.rows.len();
        self.set_result(result);
        Ok(rows)
    }

    /// Replace the query text with one generated from `prompt`
    pub fn generate(&mut self, generator: &dyn QueryGenerator, prompt: &str) -> Result<&str> {
        let sql = generator.generate(prompt)?;
        self.query_text = sql;
        Ok(&self.query_text)
    }

    pub fn load_result_file(&mut self, path: &Path) -> Result<usize> {
        let result = QueryResult::load_from_file(path)?;
        let rows = result.rows.len();
        self.set_result(result);
        Ok(rows)
    }

    pub fn filter_spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn set_global_search(&mut self, search: impl Into<String>) {
        self.spec.global_search = search.into();
    }

    pub fn set_column_filter(&mut self, header: &str, substring: &str) {
        self.spec.set_column_filter(header, substring);
    }

    pub fn toggle_excel_value(&mut self, header: &str, value: &str) {
        self.spec.toggle_excel_value(header, value);
    }

    pub fn set_numeric_filter(&mut self, header: &str, operator: NumericOperator, value: &str) {
        self.spec.set_numeric_filter(header, operator, value);
    }

    pub fn clear_numeric_filter(&mut self, header: &str) {
        self.spec.clear_numeric_filter(header);
    }

    /// Header click
    pub fn click_header(&mut self, header: &str) -> SortDirection {
        self.spec.cycle_sort(header);
        self.spec.sort.direction
    }

    pub fn sort_by(&mut self, header: &str, direction: SortDirection) {
        self.spec.sort_by(header, direction);
    }

    pub fn clear_sort(&mut self) {
        self.spec.clear_sort();
    }

    pub fn clear_filters(&mut self) {
        self.spec.clear_filters();
    }

    /// Current derived view, recomputed only when the result or spec changed
    pub fn view(&mut self) -> Option<Arc<DerivedView>> {
        let result = self.result.as_ref()?;
        Some(self.memo.view(result, &self.spec))
    }

    pub fn profile(&mut self, header: &str) -> Option<&ColumnProfile> {
        let profiles = self.profiles.as_mut()?;
        if !profiles.result().headers.iter().any(|h| h == header) {
            return None;
        }
        Some(profiles.get(header))
    }

    pub fn profiles(&mut self) -> Vec<ColumnProfile> {
        self.profiles
            .as_mut()
            .map(ResultProfiles::all)
            .unwrap_or_default()
    }

    /// Export the current view
    pub fn export(&mut self, format: ExportFormat, path: &Path) -> Result<String> {
        let view = self
            .view()
            .ok_or_else(|| anyhow!("No result loaded - run a query first"))?;
        DataExporter::export_to_path(&view, format, path)
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(ColumnCatalog::cur_default(), ProfileSettings::default())
    }
}
