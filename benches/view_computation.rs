use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cur_workbench::data::column_profile::profile;
use cur_workbench::data::filter_spec::{FilterSpec, NumericOperator, SortDirection};
use cur_workbench::data::query_result::{CellValue, QueryResult};
use cur_workbench::data::result_view::{compute_view, ViewMemo};
use std::sync::Arc;

fn create_test_result(rows: usize) -> QueryResult {
    let services = vec![
        "AmazonEC2",
        "AmazonS3",
        "AmazonRDS",
        "AWSLambda",
        "AmazonCloudFront",
        "AmazonDynamoDB",
        "AmazonVPC",
        "AWSDataTransfer",
    ];
    let regions = vec!["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-2"];

    let headers = vec![
        "line_item_product_code".to_string(),
        "product_region".to_string(),
        "line_item_unblended_cost".to_string(),
    ];
    let data = (0..rows)
        .map(|i| {
            // Every 17th cost is missing
            let cost = if i % 17 == 0 {
                CellValue::Null
            } else {
                CellValue::Float((i % 1000) as f64 * 0.37)
            };
            vec![
                CellValue::from(services[i % services.len()]),
                CellValue::from(regions[i % regions.len()]),
                cost,
            ]
        })
        .collect();

    QueryResult::new(headers, data)
}

fn benchmark_filters(c: &mut Criterion) {
    let result_10k = create_test_result(10_000);
    let result_100k = create_test_result(100_000);

    let spec = FilterSpec::new()
        .with_global_search("amazon")
        .with_excel_filter("product_region", ["us-east-1", "eu-west-1"])
        .with_numeric_filter("line_item_unblended_cost", NumericOperator::GreaterThan, "100");

    let mut group = c.benchmark_group("view_filters");

    group.bench_function("10k_rows", |b| {
        b.iter(|| compute_view(black_box(&result_10k), black_box(&spec)));
    });

    group.bench_function("100k_rows", |b| {
        b.iter(|| compute_view(black_box(&result_100k), black_box(&spec)));
    });

    group.finish();
}

fn benchmark_sort(c: &mut Criterion) {
    let result_10k = create_test_result(10_000);
    let result_100k = create_test_result(100_000);

    let by_cost = FilterSpec::new().with_sort("line_item_unblended_cost", SortDirection::Desc);
    let by_service = FilterSpec::new().with_sort("line_item_product_code", SortDirection::Asc);

    let mut group = c.benchmark_group("view_sort");

    group.bench_function("numeric_10k_rows", |b| {
        b.iter(|| compute_view(black_box(&result_10k), black_box(&by_cost)));
    });

    group.bench_function("numeric_100k_rows", |b| {
        b.iter(|| compute_view(black_box(&result_100k), black_box(&by_cost)));
    });

    group.bench_function("text_100k_rows", |b| {
        b.iter(|| compute_view(black_box(&result_100k), black_box(&by_service)));
    });

    group.finish();
}

fn benchmark_memoized_view(c: &mut Criterion) {
    let result = Arc::new(create_test_result(100_000));
    let spec = FilterSpec::new()
        .with_global_search("ec2")
        .with_sort("line_item_unblended_cost", SortDirection::Asc);

    c.bench_function("memoized_view_100k_rows", |b| {
        let mut memo = ViewMemo::new();
        b.iter(|| memo.view(black_box(&result), black_box(&spec)));
    });
}

fn benchmark_profile(c: &mut Criterion) {
    let result = create_test_result(100_000);

    c.bench_function("profile_100k_rows", |b| {
        b.iter(|| profile(black_box(&result), black_box("line_item_unblended_cost")));
    });
}

criterion_group!(
    benches,
    benchmark_filters,
    benchmark_sort,
    benchmark_memoized_view,
    benchmark_profile
);
criterion_main!(benches);
