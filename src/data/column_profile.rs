use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::data::query_result::{QueryResult, EMPTY_LABEL};

/// Tunables for column classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Number of leading rows inspected for the numeric heuristic
    pub sample_rows: usize,
    /// Fraction of non-empty sampled cells that must be numeric
    pub numeric_threshold: f64,
    /// Display value for null cells
    pub empty_label: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            sample_rows: 100,
            numeric_threshold: 0.7,
            empty_label: EMPTY_LABEL.to_string(),
        }
    }
}

/// Facts about one result column used to build its filter affordance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub header: String,
    /// Distinct display values, sorted ascending
    pub unique_values: Vec<String>,
    pub is_numeric: bool,
    pub non_empty_sampled: usize,
    pub numeric_sampled: usize,
}

impl ColumnProfile {
    fn empty(header: &str) -> Self {
        Self {
            header: header.to_string(),
            unique_values: Vec::new(),
            is_numeric: false,
            non_empty_sampled: 0,
            numeric_sampled: 0,
        }
    }

    /// Fraction of non-empty sampled cells that parsed as numbers
    pub fn numeric_ratio(&self) -> f64 {
        if self.non_empty_sampled == 0 {
            0.0
        } else {
            self.numeric_sampled as f64 / self.non_empty_sampled as f64
        }
    }
}

/// Profile a column with the default settings
pub fn profile(result: &QueryResult, header: &str) -> ColumnProfile {
    profile_with(result, header, &ProfileSettings::default())
}

/// Profile a column. A header that is not in the result profiles as an
/// empty column.
pub fn profile_with(result: &QueryResult, header: &str, settings: &ProfileSettings) -> ColumnProfile {
    let Some(column) = result.column_index(header) else {
        debug!(target: "profile", "Header '{}' not in result", header);
        return ColumnProfile::empty(header);
    };

    let unique_values: Vec<String> = result
        .rows
        .iter()
        .map(|row| {
            QueryResult::cell(row, Some(column))
                .display_text(&settings.empty_label)
                .into_owned()
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut non_empty_sampled = 0;
    let mut numeric_sampled = 0;
    for row in result.rows.iter().take(settings.sample_rows) {
        let cell = QueryResult::cell(row, Some(column));
        if cell.is_blank() {
            continue;
        }
        non_empty_sampled += 1;
        if cell.as_number().is_some() {
            numeric_sampled += 1;
        }
    }

    let is_numeric = non_empty_sampled > 0
        && (numeric_sampled as f64 / non_empty_sampled as f64) > settings.numeric_threshold;

    trace!(target: "profile",
        "'{}': {} distinct, {}/{} numeric -> is_numeric={}",
        header,
        unique_values.len(),
        numeric_sampled,
        non_empty_sampled,
        is_numeric
    );

    ColumnProfile {
        header: header.to_string(),
        unique_values,
        is_numeric,
        non_empty_sampled,
        numeric_sampled,
    }
}

/// Profiles for one result, computed on first request per header.
/// Replaced wholesale when a new result arrives.
#[derive(Debug, Clone)]
pub struct ResultProfiles {
    result: Arc<QueryResult>,
    settings: ProfileSettings,
    profiles: HashMap<String, ColumnProfile>,
}

impl ResultProfiles {
    pub fn new(result: Arc<QueryResult>, settings: ProfileSettings) -> Self {
        Self {
            result,
            settings,
            profiles: HashMap::new(),
        }
    }

    /// Whether these profiles belong to `result`
    pub fn is_for(&self, result: &Arc<QueryResult>) -> bool {
        Arc::ptr_eq(&self.result, result)
    }

    pub fn result(&self) -> &Arc<QueryResult> {
        &self.result
    }

    pub fn get(&mut self, header: &str) -> &ColumnProfile {
        if !self.profiles.contains_key(header) {
            let profile = profile_with(&self.result, header, &self.settings);
            self.profiles.insert(header.to_string(), profile);
        }
        &self.profiles[header]
    }

    /// Profile every header of the result, in header order
    pub fn all(&mut self) -> Vec<ColumnProfile> {
        let headers = self.result.headers.clone();
        headers.iter().map(|h| self.get(h).clone()).collect()
    }

    pub fn cached_count(&self) -> usize {
        self.profiles.len()
    }
}
