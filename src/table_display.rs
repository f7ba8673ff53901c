use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::collections::BTreeSet;

use cur_workbench::catalog::{CatalogMatch, ColumnCatalog};
use cur_workbench::data::column_profile::ColumnProfile;
use cur_workbench::data::query_result::CellValue;
use cur_workbench::data::result_view::DerivedView;

/// Print the view, at most `max_rows` rows, with the sort arrow on the
/// sorted header
pub fn display_view(view: &DerivedView, total_rows: usize, max_rows: usize) {
    if view.headers.is_empty() {
        println!("{}", "Result has no columns.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = view
        .headers
        .iter()
        .map(|h| {
            let label = match view.sort_indicator(h) {
                Some(direction) => format!("{} {}", h, direction.arrow()),
                None => h.clone(),
            };
            Cell::new(label).add_attribute(Attribute::Bold)
        })
        .collect();
    table.set_header(headers);

    for row in view.rows.iter().take(max_rows) {
        let cells: Vec<Cell> = row
            .iter()
            .map(|cell| match cell {
                CellValue::Null => Cell::new("NULL").add_attribute(Attribute::Dim),
                CellValue::Integer(_) | CellValue::Float(_) => {
                    Cell::new(cell.to_string()).set_alignment(CellAlignment::Right)
                }
                CellValue::Text(s) => Cell::new(s),
            })
            .collect();
        table.add_row(cells);
    }

    println!("{table}");
    if view.row_count() > max_rows {
        println!(
            "{}",
            format!("... {} more rows not shown", view.row_count() - max_rows).dark_grey()
        );
    }
    println!(
        "\n{}",
        format!("{} of {} rows", view.row_count(), total_rows).green()
    );
}

pub fn display_profile(profile: &ColumnProfile, max_values: usize) {
    let kind = if profile.is_numeric {
        "numeric".cyan()
    } else {
        "categorical".magenta()
    };
    println!(
        "{} {} ({}/{} sampled cells numeric)",
        profile.header.clone().bold(),
        kind,
        profile.numeric_sampled,
        profile.non_empty_sampled
    );

    let shown: Vec<&str> = profile
        .unique_values
        .iter()
        .take(max_values)
        .map(String::as_str)
        .collect();
    println!("  {} distinct: {}", profile.unique_values.len(), shown.join(", "));
    if profile.unique_values.len() > max_values {
        println!("  {}", "...".dark_grey());
    }
}

pub fn display_profiles(profiles: &[ColumnProfile]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Distinct").add_attribute(Attribute::Bold),
    ]);
    for profile in profiles {
        table.add_row(vec![
            Cell::new(&profile.header),
            Cell::new(if profile.is_numeric { "numeric" } else { "categorical" }),
            Cell::new(profile.unique_values.len()).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

/// Catalog columns by group, selected ones marked
pub fn display_catalog(catalog: &ColumnCatalog, selected: &BTreeSet<String>, group: Option<&str>) {
    for column_group in catalog.groups() {
        if group.is_some_and(|g| !column_group.name.eq_ignore_ascii_case(g)) {
            continue;
        }
        println!("{}", column_group.name.clone().yellow().bold());
        for name in &column_group.columns {
            let column_type = catalog
                .get(name)
                .map(|c| c.column_type.to_string())
                .unwrap_or_default();
            if selected.contains(name) {
                println!("  {} {} {}", "[x]".green(), name, column_type.dark_grey());
            } else {
                println!("  [ ] {} {}", name, column_type.dark_grey());
            }
        }
    }
}

pub fn display_matches(matches: &[CatalogMatch], selected: &BTreeSet<String>, limit: usize) {
    if matches.is_empty() {
        println!("{}", "No matching columns.".yellow());
        return;
    }
    for m in matches.iter().take(limit) {
        let mark = if selected.contains(&m.column) { "[x]" } else { "[ ]" };
        println!("  {} {} {}", mark, m.column, format!("({})", m.group).dark_grey());
    }
}
