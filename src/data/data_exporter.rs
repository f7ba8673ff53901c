use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::data::result_view::DerivedView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("Unknown export format '{}' (use csv or json)", other)),
        }
    }
}

/// Writes derived views out as CSV or JSON
pub struct DataExporter;

impl DataExporter {
    /// Write the view as CSV. Fields containing commas, quotes or newlines
    /// are quoted; null cells are empty fields.
    pub fn write_csv<W: Write>(view: &DerivedView, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&view.headers)?;
        for row in &view.rows {
            let fields: Vec<String> = (0..view.headers.len())
                .map(|idx| row.get(idx).map(|cell| cell.to_string()).unwrap_or_default())
                .collect();
            csv_writer.write_record(&fields)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(view: &DerivedView) -> Result<String> {
        let mut buffer = Vec::new();
        Self::write_csv(view, &mut buffer)?;
        String::from_utf8(buffer).context("CSV output was not valid UTF-8")
    }

    /// The view as an array of objects keyed by header, in header order
    pub fn to_json_value(view: &DerivedView) -> Result<Value> {
        let mut rows = Vec::with_capacity(view.rows.len());
        for row in &view.rows {
            let mut obj = Map::new();
            for (idx, header) in view.headers.iter().enumerate() {
                let value = match row.get(idx) {
                    Some(cell) => serde_json::to_value(cell)?,
                    None => Value::Null,
                };
                obj.insert(header.clone(), value);
            }
            rows.push(Value::Object(obj));
        }
        Ok(Value::Array(rows))
    }

    pub fn write_json<W: Write>(view: &DerivedView, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &Self::to_json_value(view)?)?;
        Ok(())
    }

    /// `query_results_<timestamp>.<ext>`
    pub fn default_filename(format: ExportFormat) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        format!("query_results_{}.{}", timestamp, format.extension())
    }

    /// Export to `path`, returning a status message
    pub fn export_to_path(view: &DerivedView, format: ExportFormat, path: &Path) -> Result<String> {
        if view.is_empty() {
            bail!("No data to export");
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        match format {
            ExportFormat::Csv => Self::write_csv(view, &mut writer)?,
            ExportFormat::Json => Self::write_json(view, &mut writer)?,
        }
        writer.flush()?;

        info!(target: "export", "Exported {} rows to {}", view.row_count(), path.display());
        Ok(format!(
            "✓ Exported {} rows to {} file: {}",
            view.row_count(),
            format,
            path.display()
        ))
    }

    /// Export into `dir` under a timestamped filename
    pub fn export_to_dir(view: &DerivedView, format: ExportFormat, dir: &Path) -> Result<(PathBuf, String)> {
        let path = dir.join(Self::default_filename(format));
        let message = Self::export_to_path(view, format, &path)?;
        Ok((path, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter_spec::FilterSpec;
    use crate::data::query_result::{CellValue, QueryResult};
    use crate::data::result_view::compute_view;

    fn view() -> DerivedView {
        let result = QueryResult::new(
            vec!["name".to_string(), "note".to_string()],
            vec![
                vec!["x".into(), "a,b".into()],
                vec![CellValue::Null, "say \"hi\"".into()],
                vec![CellValue::Integer(3), CellValue::Float(1.5)],
            ],
        );
        compute_view(&result, &FilterSpec::new())
    }

    #[test]
    fn test_csv_escaping() {
        let csv = DataExporter::to_csv_string(&view()).unwrap();
        assert_eq!(csv, "name,note\nx,\"a,b\"\n,\"say \"\"hi\"\"\"\n3,1.5\n");
    }

    #[test]
    fn test_json_keeps_types_and_header_order() {
        let json = DataExporter::to_json_value(&view()).unwrap();
        assert_eq!(json[1]["name"], Value::Null);
        assert_eq!(json[2]["name"], serde_json::json!(3));
        let keys: Vec<&String> = json[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "note"]);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/report.json")),
            Some(ExportFormat::Json)
        );
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_default_filename() {
        let name = DataExporter::default_filename(ExportFormat::Csv);
        assert!(name.starts_with("query_results_"));
        assert!(name.ends_with(".csv"));
    }
}
