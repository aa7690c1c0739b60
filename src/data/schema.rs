//! Typed view of the two source schemas.
//!
//! Only the identifying and categorical columns are fixed; every other column
//! is a measure whose name is only known once the header has been read.

use serde::{Deserialize, Serialize};

use super::Table;
use crate::error::SelectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Social care and EHCP metrics per local authority.
    Merged,
    /// Oflog metrics per local authority and financial year.
    Oflog,
}

/// Reserved (non-measure) columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LocalAuthority,
    Region,
    FinancialYear,
}

const MERGED_FIELDS: &[Field] = &[Field::LocalAuthority, Field::Region];
const OFLOG_FIELDS: &[Field] = &[Field::LocalAuthority, Field::Region, Field::FinancialYear];

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Merged, DatasetKind::Oflog];

    pub fn slug(self) -> &'static str {
        match self {
            DatasetKind::Merged => "merged",
            DatasetKind::Oflog => "oflog",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == s)
    }

    pub fn title(self) -> &'static str {
        match self {
            DatasetKind::Merged => "Social Care and EHCP Data",
            DatasetKind::Oflog => "Oflog Yearly Data",
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            DatasetKind::Merged => MERGED_FIELDS,
            DatasetKind::Oflog => OFLOG_FIELDS,
        }
    }

    /// Header name of `field` in this dataset, if the dataset has it.
    pub fn column(self, field: Field) -> Option<&'static str> {
        match (self, field) {
            (DatasetKind::Merged, Field::LocalAuthority) => Some("local_authority_name"),
            (DatasetKind::Merged, Field::Region) => Some("region"),
            (DatasetKind::Merged, Field::FinancialYear) => None,
            (DatasetKind::Oflog, Field::LocalAuthority) => Some("Local authority name"),
            (DatasetKind::Oflog, Field::Region) => Some("Region"),
            (DatasetKind::Oflog, Field::FinancialYear) => Some("Financial year"),
        }
    }

    pub fn entity_column(self) -> &'static str {
        match self {
            DatasetKind::Merged => "local_authority_name",
            DatasetKind::Oflog => "Local authority name",
        }
    }

    pub fn is_reserved(self, column: &str) -> bool {
        self.fields()
            .iter()
            .filter_map(|f| self.column(*f))
            .any(|c| c == column)
    }

    /// Position of the column the measure dropdowns start on.
    pub fn default_measure_index(self) -> usize {
        match self {
            DatasetKind::Merged => 2,
            DatasetKind::Oflog => 3,
        }
    }

    /// Non-reserved columns in header order.
    pub fn measure_columns(self, table: &Table) -> Vec<String> {
        table
            .column_names()
            .filter(|name| !self.is_reserved(name))
            .map(str::to_string)
            .collect()
    }

    /// The column at [`Self::default_measure_index`] when it is a measure,
    /// otherwise the first measure column.
    pub fn default_measure(self, table: &Table) -> Option<String> {
        table
            .columns()
            .get(self.default_measure_index())
            .map(|c| c.name.as_str())
            .filter(|name| !self.is_reserved(name))
            .map(str::to_string)
            .or_else(|| self.measure_columns(table).into_iter().next())
    }
}

/// A measure column name checked against a dataset's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure(String);

impl Measure {
    pub fn resolve(table: &Table, kind: DatasetKind, name: &str) -> Result<Measure, SelectionError> {
        if name.is_empty() {
            return Err(SelectionError::Incomplete);
        }
        if kind.is_reserved(name) {
            return Err(SelectionError::ReservedColumn(name.to_string()));
        }
        if table.column_index(name).is_none() {
            return Err(SelectionError::UnknownMeasure(name.to_string()));
        }
        Ok(Measure(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, Column, ColumnKind};

    fn oflog_table() -> Table {
        let columns = ["Local authority name", "Region", "Financial year", "Spend", "Reserves"]
            .iter()
            .map(|n| Column::new(*n, ColumnKind::Text))
            .collect();
        Table::new(columns, vec![vec![Cell::Missing; 5]])
    }

    #[test]
    fn test_reserved_columns_per_kind() {
        assert!(DatasetKind::Oflog.is_reserved("Financial year"));
        assert!(!DatasetKind::Merged.is_reserved("Financial year"));
        assert!(DatasetKind::Merged.is_reserved("region"));
        assert!(!DatasetKind::Merged.is_reserved("Region"));
    }

    #[test]
    fn test_measure_columns_skip_reserved() {
        let t = oflog_table();
        assert_eq!(DatasetKind::Oflog.measure_columns(&t), vec!["Spend", "Reserves"]);
        assert_eq!(DatasetKind::Oflog.default_measure(&t).as_deref(), Some("Spend"));
    }

    #[test]
    fn test_default_measure_skips_reserved_position() {
        let columns = ["Region", "Financial year", "Local authority name", "Spend"]
            .iter()
            .map(|n| Column::new(*n, ColumnKind::Text))
            .collect();
        let t = Table::new(columns, Vec::new());
        assert_eq!(DatasetKind::Oflog.default_measure(&t).as_deref(), Some("Spend"));
    }

    #[test]
    fn test_measure_resolution() {
        let t = oflog_table();
        assert_eq!(Measure::resolve(&t, DatasetKind::Oflog, "Spend").unwrap().name(), "Spend");
        assert_eq!(
            Measure::resolve(&t, DatasetKind::Oflog, ""),
            Err(SelectionError::Incomplete)
        );
        assert_eq!(
            Measure::resolve(&t, DatasetKind::Oflog, "Region"),
            Err(SelectionError::ReservedColumn("Region".into()))
        );
        assert_eq!(
            Measure::resolve(&t, DatasetKind::Oflog, "Debt"),
            Err(SelectionError::UnknownMeasure("Debt".into()))
        );
    }

    #[test]
    fn test_slug_roundtrip() {
        for kind in DatasetKind::ALL {
            assert_eq!(DatasetKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(DatasetKind::from_slug("census"), None);
    }
}
