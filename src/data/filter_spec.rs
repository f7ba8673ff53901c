use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a numeric filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl NumericOperator {
    pub const ALL: [NumericOperator; 6] = [
        NumericOperator::GreaterThan,
        NumericOperator::GreaterThanOrEqual,
        NumericOperator::LessThan,
        NumericOperator::LessThanOrEqual,
        NumericOperator::Equal,
        NumericOperator::NotEqual,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            NumericOperator::GreaterThan => ">",
            NumericOperator::GreaterThanOrEqual => ">=",
            NumericOperator::LessThan => "<",
            NumericOperator::LessThanOrEqual => "<=",
            NumericOperator::Equal => "=",
            NumericOperator::NotEqual => "!=",
        }
    }

    pub fn apply(&self, cell: f64, target: f64) -> bool {
        match self {
            NumericOperator::GreaterThan => cell > target,
            NumericOperator::GreaterThanOrEqual => cell >= target,
            NumericOperator::LessThan => cell < target,
            NumericOperator::LessThanOrEqual => cell <= target,
            NumericOperator::Equal => cell == target,
            NumericOperator::NotEqual => cell != target,
        }
    }
}

impl fmt::Display for NumericOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for NumericOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .or(match s {
                "==" => Some(NumericOperator::Equal),
                "<>" => Some(NumericOperator::NotEqual),
                _ => None,
            })
            .ok_or_else(|| format!("Unknown numeric operator '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericFilter {
    pub operator: NumericOperator,
    /// Raw user input; a value that does not parse as a number leaves the
    /// filter inert
    pub value: String,
}

impl NumericFilter {
    pub fn new(operator: NumericOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("Unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub column: Option<String>,
    pub direction: SortDirection,
}

/// Everything the result grid filters and sorts by. Treated as an
/// immutable snapshot by the view computation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub global_search: String,
    pub column_filters: BTreeMap<String, String>,
    pub excel_filters: BTreeMap<String, BTreeSet<String>>,
    pub numeric_filters: BTreeMap<String, NumericFilter>,
    pub sort: SortSpec,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global_search(mut self, search: impl Into<String>) -> Self {
        self.global_search = search.into();
        self
    }

    pub fn with_column_filter(mut self, header: impl Into<String>, substring: impl Into<String>) -> Self {
        self.set_column_filter(header, substring);
        self
    }

    pub fn with_excel_filter<I, S>(mut self, header: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_excel_values(header, values);
        self
    }

    pub fn with_numeric_filter(
        mut self,
        header: impl Into<String>,
        operator: NumericOperator,
        value: impl Into<String>,
    ) -> Self {
        self.set_numeric_filter(header, operator, value);
        self
    }

    pub fn with_sort(mut self, header: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by(header, direction);
        self
    }

    /// An empty substring removes the filter
    pub fn set_column_filter(&mut self, header: impl Into<String>, substring: impl Into<String>) {
        let header = header.into();
        let substring = substring.into();
        if substring.is_empty() {
            self.column_filters.remove(&header);
        } else {
            self.column_filters.insert(header, substring);
        }
    }

    pub fn set_excel_values<I, S>(&mut self, header: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header = header.into();
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.excel_filters.remove(&header);
        } else {
            self.excel_filters.insert(header, values);
        }
    }

    /// Add or remove one allowed value; the header entry is dropped once
    /// no values remain
    pub fn toggle_excel_value(&mut self, header: &str, value: &str) {
        let allowed = self.excel_filters.entry(header.to_string()).or_default();
        if !allowed.remove(value) {
            allowed.insert(value.to_string());
        }
        if allowed.is_empty() {
            self.excel_filters.remove(header);
        }
    }

    pub fn set_numeric_filter(
        &mut self,
        header: impl Into<String>,
        operator: NumericOperator,
        value: impl Into<String>,
    ) {
        self.numeric_filters
            .insert(header.into(), NumericFilter::new(operator, value));
    }

    pub fn clear_numeric_filter(&mut self, header: &str) {
        self.numeric_filters.remove(header);
    }

    pub fn sort_by(&mut self, header: impl Into<String>, direction: SortDirection) {
        self.sort = SortSpec {
            column: Some(header.into()),
            direction,
        };
    }

    /// Header-click behaviour: a new header sorts ascending, the sorted
    /// header flips direction
    pub fn cycle_sort(&mut self, header: &str) {
        let direction = match &self.sort.column {
            Some(current) if current == header => self.sort.direction.flipped(),
            _ => SortDirection::Asc,
        };
        self.sort_by(header, direction);
    }

    pub fn clear_sort(&mut self) {
        self.sort = SortSpec::default();
    }

    /// Drop every filter, keeping the sort
    pub fn clear_filters(&mut self) {
        self.global_search.clear();
        self.column_filters.clear();
        self.excel_filters.clear();
        self.numeric_filters.clear();
    }

    /// Number of filter criteria that can exclude rows
    pub fn active_filter_count(&self) -> usize {
        let global = usize::from(!self.global_search.is_empty());
        let columns = self.column_filters.values().filter(|s| !s.is_empty()).count();
        let excel = self.excel_filters.values().filter(|s| !s.is_empty()).count();
        let numeric = self
            .numeric_filters
            .values()
            .filter(|f| !f.value.trim().is_empty())
            .count();
        global + columns + excel + numeric
    }

    pub fn is_filtering(&self) -> bool {
        self.active_filter_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parsing() {
        for op in NumericOperator::ALL {
            assert_eq!(op.symbol().parse::<NumericOperator>().unwrap(), op);
        }
        assert_eq!("==".parse::<NumericOperator>().unwrap(), NumericOperator::Equal);
        assert!("~".parse::<NumericOperator>().is_err());
    }

    #[test]
    fn test_operator_apply() {
        assert!(NumericOperator::GreaterThan.apply(30.0, 15.0));
        assert!(!NumericOperator::GreaterThan.apply(15.0, 15.0));
        assert!(NumericOperator::GreaterThanOrEqual.apply(15.0, 15.0));
        assert!(NumericOperator::NotEqual.apply(1.0, 2.0));
        assert!(NumericOperator::Equal.apply(2.0, 2.0));
    }

    #[test]
    fn test_cycle_sort() {
        let mut spec = FilterSpec::new();
        spec.cycle_sort("cost");
        assert_eq!(spec.sort.direction, SortDirection::Asc);
        spec.cycle_sort("cost");
        assert_eq!(spec.sort.direction, SortDirection::Desc);
        spec.cycle_sort("region");
        assert_eq!(spec.sort.column.as_deref(), Some("region"));
        assert_eq!(spec.sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_toggle_excel_value() {
        let mut spec = FilterSpec::new();
        spec.toggle_excel_value("region", "us-east-1");
        spec.toggle_excel_value("region", "us-west-2");
        assert_eq!(spec.excel_filters["region"].len(), 2);
        spec.toggle_excel_value("region", "us-east-1");
        spec.toggle_excel_value("region", "us-west-2");
        assert!(!spec.excel_filters.contains_key("region"));
    }

    #[test]
    fn test_active_filter_count() {
        let mut spec = FilterSpec::new()
            .with_global_search("ec2")
            .with_column_filter("service", "")
            .with_numeric_filter("cost", NumericOperator::GreaterThan, " ");
        assert_eq!(spec.active_filter_count(), 1);
        spec.set_column_filter("service", "s3");
        assert_eq!(spec.active_filter_count(), 2);
        spec.clear_filters();
        assert!(!spec.is_filtering());
    }

    #[test]
    fn test_deserialize_from_controller_json() {
        let json = r#"{
            "globalSearch": "ec2",
            "excelFilters": {"region": ["us-east-1"]},
            "numericFilters": {"cost": {"operator": ">=", "value": "15"}},
            "sort": {"column": "cost", "direction": "desc"}
        }"#;
        let spec: FilterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.global_search, "ec2");
        assert_eq!(
            spec.numeric_filters["cost"].operator,
            NumericOperator::GreaterThanOrEqual
        );
        assert_eq!(spec.sort.direction, SortDirection::Desc);
        assert!(spec.column_filters.is_empty());
    }
}
