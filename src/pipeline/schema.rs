//! Declarative column schema
//!
//! The schema YAML lists every expected column with its kind, the required
//! numerical and categorical columns, the four preprocessing groups, the drop
//! list and derived age columns. [`Schema::from_yaml_str`] checks the group
//! invariants once at load time so later stages can rely on them:
//!
//! - the four groups are mutually exclusive and disjoint from the drop list
//! - groups plus drop list plus target cover every expected and derived column

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TARGET_COLUMN: &str = "case_status";

/// Declared kind of a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Category,
    Int,
    Float,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

/// Preprocessing group a feature column is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnGroup {
    OneHot,
    Ordinal,
    PowerTransform,
    StandardScale,
}

impl ColumnGroup {
    pub const ALL: [ColumnGroup; 4] = [
        ColumnGroup::OneHot,
        ColumnGroup::Ordinal,
        ColumnGroup::PowerTransform,
        ColumnGroup::StandardScale,
    ];

    /// Key used for this group in the schema file.
    pub fn schema_key(self) -> &'static str {
        match self {
            ColumnGroup::OneHot => "oh_columns",
            ColumnGroup::Ordinal => "or_columns",
            ColumnGroup::PowerTransform => "transform_columns",
            ColumnGroup::StandardScale => "num_features",
        }
    }
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_key())
    }
}

/// A feature computed as `reference_year - <age_of>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAge {
    pub name: String,
    pub age_of: String,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema YAML")]
    Parse(#[from] serde_yaml::Error),

    #[error("schema declares no columns")]
    NoColumns,

    #[error("schema column entry must have exactly one name, found {0}")]
    MalformedColumnEntry(usize),

    #[error("column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("target column '{0}' is not a declared column")]
    MissingTarget(String),

    #[error("{list} references unknown column '{column}'")]
    UnknownColumn { list: String, column: String },

    #[error("derived column '{name}' must be computed from a numeric column, '{age_of}' is not")]
    NonNumericDerivation { name: String, age_of: String },

    #[error("derived column '{0}' clashes with a declared column")]
    DerivedClash(String),

    #[error("target column '{column}' cannot be listed in {list}")]
    TargetInGroup { column: String, list: String },

    #[error("column '{column}' is listed in both {first} and {second}")]
    OverlappingGroups {
        column: String,
        first: String,
        second: String,
    },

    #[error("column '{0}' is not covered by any column group or the drop list")]
    UncoveredColumn(String),
}

/// Raw shape of the schema file.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    columns: Vec<BTreeMap<String, ColumnKind>>,
    #[serde(default)]
    numerical_columns: Vec<String>,
    #[serde(default)]
    categorical_columns: Vec<String>,
    #[serde(default = "default_target_column")]
    target_column: String,
    #[serde(default)]
    drop_columns: Vec<String>,
    #[serde(default)]
    derived_columns: Vec<DerivedAge>,
    #[serde(default)]
    oh_columns: Vec<String>,
    #[serde(default)]
    or_columns: Vec<String>,
    #[serde(default)]
    transform_columns: Vec<String>,
    #[serde(default)]
    num_features: Vec<String>,
}

fn default_target_column() -> String {
    DEFAULT_TARGET_COLUMN.to_string()
}

/// Validated, immutable column schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<(String, ColumnKind)>,
    numerical_columns: Vec<String>,
    categorical_columns: Vec<String>,
    target_column: String,
    drop_columns: Vec<String>,
    derived_columns: Vec<DerivedAge>,
    groups: Vec<(ColumnGroup, Vec<String>)>,
}

impl Schema {
    /// Load and validate a schema file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_yaml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            columns = schema.expected_column_count(),
            "loaded schema"
        );
        Ok(schema)
    }

    /// Parse and validate a schema document.
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let raw: SchemaFile = serde_yaml::from_str(content)?;

        let mut columns = Vec::with_capacity(raw.columns.len());
        for entry in raw.columns {
            if entry.len() != 1 {
                return Err(SchemaError::MalformedColumnEntry(entry.len()));
            }
            columns.extend(entry);
        }

        let schema = Schema {
            columns,
            numerical_columns: raw.numerical_columns,
            categorical_columns: raw.categorical_columns,
            target_column: raw.target_column,
            drop_columns: raw.drop_columns,
            derived_columns: raw.derived_columns,
            groups: vec![
                (ColumnGroup::OneHot, raw.oh_columns),
                (ColumnGroup::Ordinal, raw.or_columns),
                (ColumnGroup::PowerTransform, raw.transform_columns),
                (ColumnGroup::StandardScale, raw.num_features),
            ],
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }

        let mut kinds: HashMap<&str, ColumnKind> = HashMap::new();
        for (name, kind) in &self.columns {
            if kinds.insert(name.as_str(), *kind).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }

        if !kinds.contains_key(self.target_column.as_str()) {
            return Err(SchemaError::MissingTarget(self.target_column.clone()));
        }

        for (list, names) in [
            ("numerical_columns", &self.numerical_columns),
            ("categorical_columns", &self.categorical_columns),
        ] {
            if let Some(column) = names.iter().find(|c| !kinds.contains_key(c.as_str())) {
                return Err(SchemaError::UnknownColumn {
                    list: list.to_string(),
                    column: column.clone(),
                });
            }
        }

        for derived in &self.derived_columns {
            if kinds.contains_key(derived.name.as_str()) {
                return Err(SchemaError::DerivedClash(derived.name.clone()));
            }
            match kinds.get(derived.age_of.as_str()) {
                Some(kind) if kind.is_numeric() => {}
                Some(_) => {
                    return Err(SchemaError::NonNumericDerivation {
                        name: derived.name.clone(),
                        age_of: derived.age_of.clone(),
                    })
                }
                None => {
                    return Err(SchemaError::UnknownColumn {
                        list: "derived_columns".to_string(),
                        column: derived.age_of.clone(),
                    })
                }
            }
        }

        // Every feature column must land in exactly one group or the drop list.
        let universe: HashSet<&str> = self
            .columns
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(self.derived_columns.iter().map(|d| d.name.as_str()))
            .collect();

        let mut owner: HashMap<&str, String> = HashMap::new();
        let lists = self
            .groups
            .iter()
            .map(|(group, names)| (group.schema_key(), names))
            .chain(std::iter::once(("drop_columns", &self.drop_columns)));

        for (list, names) in lists {
            for column in names {
                if !universe.contains(column.as_str()) {
                    return Err(SchemaError::UnknownColumn {
                        list: list.to_string(),
                        column: column.clone(),
                    });
                }
                if *column == self.target_column {
                    return Err(SchemaError::TargetInGroup {
                        column: column.clone(),
                        list: list.to_string(),
                    });
                }
                if let Some(first) = owner.insert(column.as_str(), list.to_string()) {
                    return Err(SchemaError::OverlappingGroups {
                        column: column.clone(),
                        first,
                        second: list.to_string(),
                    });
                }
            }
        }

        let uncovered = self
            .columns
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(self.derived_columns.iter().map(|d| d.name.as_str()))
            .find(|name| *name != self.target_column && !owner.contains_key(name));
        if let Some(column) = uncovered {
            return Err(SchemaError::UncoveredColumn(column.to_string()));
        }

        Ok(())
    }

    /// Expected raw columns with their declared kinds, in file order.
    pub fn columns(&self) -> &[(String, ColumnKind)] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn expected_column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn numerical_columns(&self) -> &[String] {
        &self.numerical_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    pub fn derived_columns(&self) -> &[DerivedAge] {
        &self.derived_columns
    }

    /// Columns routed to `group`, in schema order.
    pub fn group(&self, group: ColumnGroup) -> &[String] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, names)| names.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
columns:
  - id: category
  - colour: category
  - size: int
  - founded: int
  - label: category
target_column: label
numerical_columns: [size, founded]
categorical_columns: [colour]
drop_columns: [id, founded]
derived_columns:
  - name: age
    age_of: founded
oh_columns: [colour]
transform_columns: [age]
num_features: [size]
"#;

    #[test]
    fn test_minimal_schema_loads() {
        let schema = Schema::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(schema.expected_column_count(), 5);
        assert_eq!(schema.target_column(), "label");
        assert_eq!(schema.group(ColumnGroup::OneHot), ["colour".to_string()]);
        assert!(schema.group(ColumnGroup::Ordinal).is_empty());
        assert_eq!(schema.derived_columns()[0].age_of, "founded");
    }

    #[test]
    fn test_overlapping_groups_rejected() {
        let yaml = MINIMAL.replace("num_features: [size]", "num_features: [size, age]");
        let err = Schema::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, SchemaError::OverlappingGroups { ref column, .. } if column == "age"));
    }

    #[test]
    fn test_uncovered_column_rejected() {
        let yaml = MINIMAL.replace("oh_columns: [colour]", "oh_columns: []");
        let err = Schema::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, SchemaError::UncoveredColumn(ref c) if c == "colour"));
    }

    #[test]
    fn test_derived_from_category_rejected() {
        let yaml = MINIMAL.replace("age_of: founded", "age_of: colour");
        let err = Schema::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, SchemaError::NonNumericDerivation { .. }));
    }
}
