//! Column catalog
//!
//! A static, versioned registry of the column names known to the query's
//! data source, partitioned into named, non-overlapping groups. The catalog
//! is never mutated once built; the rest of the crate only looks things up.

pub mod cur_columns;

use anyhow::{anyhow, bail, Context, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Declared type of a catalog column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Varchar,
    Decimal,
    Timestamp,
    Json,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Json => "JSON",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A named group of catalog columns ("Bill", "Line Item", ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<String>,
}

/// On-disk layout shared by JSON and TOML catalog files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub version: String,
    pub groups: Vec<CatalogFileGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFileGroup {
    pub name: String,
    pub columns: Vec<CatalogColumn>,
}

/// A fuzzy search hit
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMatch {
    pub column: String,
    pub group: String,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct ColumnCatalog {
    version: String,
    columns: Vec<CatalogColumn>,
    groups: Vec<ColumnGroup>,
    /// column name -> (position in `columns`, position in `groups`)
    index: HashMap<String, (usize, usize)>,
}

static CUR_CATALOG: LazyLock<ColumnCatalog> = LazyLock::new(|| {
    let groups = cur_columns::cur_column_groups()
        .into_iter()
        .map(|(name, columns)| CatalogFileGroup {
            name: name.to_string(),
            columns: columns
                .into_iter()
                .map(|(column, ty)| CatalogColumn::new(column, ty))
                .collect(),
        })
        .collect();
    ColumnCatalog::from_groups(cur_columns::CUR_CATALOG_VERSION, groups)
        .expect("built-in CUR catalog is valid")
});

impl ColumnCatalog {
    /// Build a catalog, rejecting empty names, duplicate columns and
    /// columns listed under more than one group
    pub fn from_groups(version: impl Into<String>, groups: Vec<CatalogFileGroup>) -> Result<Self> {
        let version = version.into();
        let mut columns = Vec::new();
        let mut column_groups = Vec::with_capacity(groups.len());
        let mut index: HashMap<String, (usize, usize)> = HashMap::new();

        for (group_idx, group) in groups.into_iter().enumerate() {
            if group.name.trim().is_empty() {
                bail!("Catalog group #{} has an empty name", group_idx + 1);
            }
            if column_groups
                .iter()
                .any(|g: &ColumnGroup| g.name == group.name)
            {
                bail!("Catalog group '{}' is defined twice", group.name);
            }

            let mut names = Vec::with_capacity(group.columns.len());
            for column in group.columns {
                if column.name.trim().is_empty() {
                    bail!("Catalog group '{}' contains an empty column name", group.name);
                }
                if let Some(&(_, existing_group)) = index.get(&column.name) {
                    // The group being built is not in column_groups yet
                    if existing_group == group_idx {
                        bail!(
                            "Column '{}' is listed twice in group '{}'",
                            column.name,
                            group.name
                        );
                    }
                    bail!(
                        "Column '{}' appears in both '{}' and '{}'",
                        column.name,
                        column_groups[existing_group].name,
                        group.name
                    );
                }
                index.insert(column.name.clone(), (columns.len(), group_idx));
                names.push(column.name.clone());
                columns.push(column);
            }

            column_groups.push(ColumnGroup {
                name: group.name,
                columns: names,
            });
        }

        debug!(target: "catalog",
            "Built catalog {} with {} columns in {} groups",
            version,
            columns.len(),
            column_groups.len()
        );

        Ok(Self {
            version,
            columns,
            groups: column_groups,
            index,
        })
    }

    /// The built-in CUR catalog
    pub fn cur_default() -> Self {
        CUR_CATALOG.clone()
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(contents).context("Invalid JSON catalog file")?;
        Self::from_groups(file.version, file.groups)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents).context("Invalid TOML catalog file")?;
        Self::from_groups(file.version, file.groups)
    }

    /// Load a catalog file; the format is chosen by extension (.json or .toml)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&contents),
            Some("toml") => Self::from_toml_str(&contents),
            _ => Err(anyhow!(
                "Unsupported catalog file '{}': expected .json or .toml",
                path.display()
            )),
        }
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            version: self.version.clone(),
            groups: self
                .groups
                .iter()
                .map(|group| CatalogFileGroup {
                    name: group.name.clone(),
                    columns: group
                        .columns
                        .iter()
                        .filter_map(|name| self.get(name).cloned())
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn columns(&self) -> &[CatalogColumn] {
        &self.columns
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogColumn> {
        self.index.get(name).map(|&(col_idx, _)| &self.columns[col_idx])
    }

    pub fn group(&self, name: &str) -> Option<&ColumnGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_of(&self, column: &str) -> Option<&ColumnGroup> {
        self.index
            .get(column)
            .map(|&(_, group_idx)| &self.groups[group_idx])
    }

    /// Fuzzy-search column names, best match first
    pub fn search(&self, pattern: &str) -> Vec<CatalogMatch> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut matches: Vec<CatalogMatch> = self
            .columns
            .iter()
            .filter_map(|column| {
                let score = matcher.fuzzy_match(&column.name, pattern)?;
                let group = self.group_of(&column.name)?;
                Some(CatalogMatch {
                    column: column.name.clone(),
                    group: group.name.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps catalog order among equal scores
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, columns: &[(&str, ColumnType)]) -> CatalogFileGroup {
        CatalogFileGroup {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(n, t)| CatalogColumn::new(*n, *t))
                .collect(),
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = ColumnCatalog::cur_default();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.version(), cur_columns::CUR_CATALOG_VERSION);
        assert!(catalog.contains("line_item_unblended_cost"));
        assert_eq!(
            catalog.get("line_item_unblended_cost").unwrap().column_type,
            ColumnType::Decimal
        );
        assert_eq!(
            catalog.group_of("bill_payer_account_id").unwrap().name,
            "Bill"
        );
    }

    #[test]
    fn test_groups_partition_columns() {
        let catalog = ColumnCatalog::cur_default();
        let grouped: usize = catalog.groups().iter().map(|g| g.columns.len()).sum();
        assert_eq!(grouped, catalog.len());
    }

    #[test]
    fn test_rejects_column_in_two_groups() {
        let result = ColumnCatalog::from_groups(
            "v1",
            vec![
                group("A", &[("cost", ColumnType::Decimal)]),
                group("B", &[("cost", ColumnType::Decimal)]),
            ],
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("appears in both"), "{}", err);
    }

    #[test]
    fn test_rejects_duplicate_within_group() {
        let result = ColumnCatalog::from_groups(
            "v1",
            vec![group(
                "A",
                &[("cost", ColumnType::Decimal), ("cost", ColumnType::Varchar)],
            )],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_names() {
        assert!(ColumnCatalog::from_groups("v1", vec![group(" ", &[])]).is_err());
        assert!(
            ColumnCatalog::from_groups("v1", vec![group("A", &[("", ColumnType::Json)])]).is_err()
        );
    }

    #[test]
    fn test_json_round_trip_through_file_layout() {
        let catalog = ColumnCatalog::cur_default();
        let json = serde_json::to_string(&catalog.to_file()).unwrap();
        let loaded = ColumnCatalog::from_json_str(&json).unwrap();
        assert_eq!(loaded.len(), catalog.len());
        assert_eq!(loaded.groups(), catalog.groups());
    }

    #[test]
    fn test_toml_catalog() {
        let toml = r#"
version = "custom-1"

[[groups]]
name = "Costs"
columns = [
    { name = "cost", type = "DECIMAL" },
    { name = "usage_date", type = "TIMESTAMP" },
]
"#;
        let catalog = ColumnCatalog::from_toml_str(toml).unwrap();
        assert_eq!(catalog.version(), "custom-1");
        assert_eq!(
            catalog.get("usage_date").unwrap().column_type,
            ColumnType::Timestamp
        );
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let json_path = dir.path().join("catalog.json");
        std::fs::write(
            &json_path,
            serde_json::to_string(&ColumnCatalog::cur_default().to_file()).unwrap(),
        )
        .unwrap();
        let loaded = ColumnCatalog::load_from_file(&json_path).unwrap();
        assert!(loaded.contains("product_region"));

        let yaml_path = dir.path().join("catalog.yaml");
        std::fs::write(&yaml_path, "groups: []").unwrap();
        assert!(ColumnCatalog::load_from_file(&yaml_path).is_err());
        assert!(ColumnCatalog::load_from_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_fuzzy_search_ranks_matches() {
        let catalog = ColumnCatalog::cur_default();
        let matches = catalog.search("unblendedcost");
        assert!(!matches.is_empty());
        assert_eq!(matches[0].column, "line_item_unblended_cost");
        assert_eq!(matches[0].group, "Line Item");
        assert!(catalog.search("   ").is_empty());
    }
}
