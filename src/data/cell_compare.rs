use std::cmp::Ordering;

use crate::data::filter_spec::SortDirection;
use crate::data::query_result::CellValue;

/// Parse a string as a finite number, ignoring surrounding whitespace.
/// Empty strings, "inf" and "NaN" are not numbers.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Precomputed sort key for one cell
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    /// Lowercased string form
    Text(String),
    Null,
}

impl SortKey {
    pub fn from_cell(cell: &CellValue) -> Self {
        if cell.is_null() {
            return SortKey::Null;
        }
        match cell.as_number() {
            Some(n) => SortKey::Number(n),
            None => SortKey::Text(cell.search_text().to_lowercase()),
        }
    }
}

/// Compare two sort keys.
///
/// Numbers compare numerically and text case-insensitively. Numbers order
/// before text so that mixed columns still sort by a total order; a mixed
/// number/text pair is never compared by its string forms. Nulls go last
/// regardless of `direction`.
pub fn compare_sort_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (SortKey::Null, SortKey::Null) => return Ordering::Equal,
        (SortKey::Null, _) => return Ordering::Greater,
        (_, SortKey::Null) => return Ordering::Less,

        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Compare two cells for sorting
pub fn compare_cells(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    compare_sort_keys(&SortKey::from_cell(a), &SortKey::from_cell(b), direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number(" -3.5 "), Some(-3.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("12abc"), None);
    }

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(
            compare_cells(&CellValue::from("9"), &CellValue::from("10"), SortDirection::Asc),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(&CellValue::Integer(9), &CellValue::Float(10.5), SortDirection::Desc),
            Ordering::Greater
        );
    }

    #[test]
    fn test_text_comparison_ignores_case() {
        assert_eq!(
            compare_cells(&CellValue::from("apple"), &CellValue::from("Banana"), SortDirection::Asc),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(&CellValue::from("ABC"), &CellValue::from("abc"), SortDirection::Asc),
            Ordering::Equal
        );
    }

    #[test]
    fn test_nulls_last_in_both_directions() {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            assert_eq!(
                compare_cells(&CellValue::Null, &CellValue::Integer(1), direction),
                Ordering::Greater
            );
            assert_eq!(
                compare_cells(&CellValue::from("x"), &CellValue::Null, direction),
                Ordering::Less
            );
        }
    }

    #[test]
    fn test_mixed_values_have_a_total_order() {
        // 9 < 10 numerically, and both numbers come before text
        let cells = [
            CellValue::from("10"),
            CellValue::from("9"),
            CellValue::from("1a"),
        ];
        let mut keys: Vec<SortKey> = cells.iter().map(SortKey::from_cell).collect();
        keys.sort_by(|a, b| compare_sort_keys(a, b, SortDirection::Asc));
        assert_eq!(
            keys,
            vec![
                SortKey::Number(9.0),
                SortKey::Number(10.0),
                SortKey::Text("1a".to_string())
            ]
        );
    }
}
