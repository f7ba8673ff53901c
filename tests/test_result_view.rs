#[cfg(test)]
mod result_view_tests {
    use cur_workbench::data::filter_spec::{FilterSpec, NumericOperator, SortDirection};
    use cur_workbench::data::query_result::{CellValue, QueryResult, Row};
    use cur_workbench::data::result_view::compute_view;
    use serde_json::json;

    fn services() -> QueryResult {
        QueryResult::from_json(&json!({
            "headers": ["service", "region", "cost"],
            "rows": [
                ["AmazonEC2", "us-east-1", 120.5],
                ["AmazonS3", "eu-west-1", 3],
                ["EC2-Other", "us-west-2", null],
                ["AmazonRDS", "us-east-1", "40"],
                ["AmazonEC2", "eu-west-1", 15],
                ["AWSLambda", null, "n/a"]
            ]
        }))
        .unwrap()
    }

    fn column(rows: &[Row], idx: usize) -> Vec<String> {
        rows.iter().map(|r| r[idx].to_string()).collect()
    }

    #[test]
    fn test_numeric_filter_excludes_text_cells() {
        let result = QueryResult::from_json(&json!({
            "headers": ["name", "cost"],
            "rows": [["x", 10], ["y", "n/a"], ["z", 30]]
        }))
        .unwrap();
        let spec = FilterSpec::new().with_numeric_filter("cost", NumericOperator::GreaterThan, "15");
        let view = compute_view(&result, &spec);
        assert_eq!(view.rows, vec![vec![CellValue::from("z"), CellValue::Integer(30)]]);
    }

    #[test]
    fn test_excel_filter_matches_any_chosen_value() {
        let result = QueryResult::from_json(&json!({
            "headers": ["region"],
            "rows": [["us-east-1"], ["eu-west-1"], ["us-west-2"]]
        }))
        .unwrap();
        let spec = FilterSpec::new().with_excel_filter("region", ["us-east-1", "us-west-2"]);
        let view = compute_view(&result, &spec);
        assert_eq!(column(&view.rows, 0), vec!["us-east-1", "us-west-2"]);
    }

    #[test]
    fn test_global_search_then_sort_desc_nulls_last() {
        let spec = FilterSpec::new()
            .with_global_search("ec2")
            .with_sort("cost", SortDirection::Desc);
        let view = compute_view(&services(), &spec);
        assert_eq!(column(&view.rows, 0), vec!["AmazonEC2", "AmazonEC2", "EC2-Other"]);
        assert_eq!(column(&view.rows, 2), vec!["120.5", "15", ""]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let spec = FilterSpec::new()
            .with_column_filter("region", "us")
            .with_numeric_filter("cost", NumericOperator::GreaterThanOrEqual, "40");
        let view = compute_view(&services(), &spec);
        assert_eq!(column(&view.rows, 0), vec!["AmazonEC2", "AmazonRDS"]);
    }

    #[test]
    fn test_adding_a_criterion_never_grows_the_view() {
        let result = services();
        let mut spec = FilterSpec::new();
        let mut previous = compute_view(&result, &spec).row_count();

        spec.set_column_filter("service", "amazon");
        spec.set_excel_values("region", ["us-east-1", "eu-west-1"]);
        spec.set_numeric_filter("cost", NumericOperator::LessThan, "100");
        spec.global_search = "a".to_string();

        // Re-apply one criterion at a time
        let steps = [
            FilterSpec::new().with_column_filter("service", "amazon"),
            FilterSpec::new()
                .with_column_filter("service", "amazon")
                .with_excel_filter("region", ["us-east-1", "eu-west-1"]),
            FilterSpec::new()
                .with_column_filter("service", "amazon")
                .with_excel_filter("region", ["us-east-1", "eu-west-1"])
                .with_numeric_filter("cost", NumericOperator::LessThan, "100"),
            spec,
        ];
        for step in steps {
            let count = compute_view(&result, &step).row_count();
            assert!(count <= previous);
            previous = count;
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn test_view_rows_come_from_source() {
        let result = services();
        let spec = FilterSpec::new()
            .with_excel_filter("region", ["eu-west-1", "(empty)"])
            .with_sort("service", SortDirection::Asc);
        let view = compute_view(&result, &spec);
        assert_eq!(view.row_count(), 3);
        for (row, &source) in view.rows.iter().zip(&view.source_rows) {
            assert_eq!(row, &result.rows[source]);
        }
        assert_eq!(view.headers, result.headers);
    }

    #[test]
    fn test_desc_is_reverse_of_asc_for_non_null_cells() {
        let result = services();
        let asc = compute_view(&result, &FilterSpec::new().with_sort("cost", SortDirection::Asc));
        let desc = compute_view(&result, &FilterSpec::new().with_sort("cost", SortDirection::Desc));

        let numeric = |rows: &[Row]| -> Vec<String> {
            rows.iter()
                .filter(|r| r[2].as_number().is_some())
                .map(|r| r[2].to_string())
                .collect()
        };
        let mut reversed = numeric(&desc.rows);
        reversed.reverse();
        assert_eq!(numeric(&asc.rows), reversed);

        // Null last both ways
        assert!(asc.rows.last().unwrap()[2].is_null());
        assert!(desc.rows.last().unwrap()[2].is_null());
    }

    #[test]
    fn test_mixed_column_sort_is_total() {
        let view = compute_view(&services(), &FilterSpec::new().with_sort("cost", SortDirection::Asc));
        assert_eq!(column(&view.rows, 2), vec!["3", "15", "40", "120.5", "n/a", ""]);
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = QueryResult::empty();
        let spec = FilterSpec::new()
            .with_global_search("x")
            .with_sort("cost", SortDirection::Desc);
        assert!(compute_view(&empty, &spec).is_empty());

        let result = services();
        let spec = FilterSpec::new().with_numeric_filter("cost", NumericOperator::Equal, "");
        assert_eq!(compute_view(&result, &spec).row_count(), 6);

        let spec = FilterSpec::new().with_excel_filter("nonexistent", ["anything"]);
        assert!(compute_view(&result, &spec).is_empty());
    }
}
