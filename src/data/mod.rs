//! In-memory tables and the CSV loader.
//!
//! A [`Dataset`] is loaded once at startup and never mutated afterwards.
//! Derived tables produced by the pipeline reuse [`Table`].

pub mod schema;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::logging::{log_dataset_loaded, ts_now, ProfileScope};
pub use schema::{DatasetKind, Field, Measure};

/// Tokens read as missing, matching the usual dataframe defaults.
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Text that a missing identifier becomes once the column is forced to text.
pub const MISSING_TEXT: &str = "nan";

// =============================================================================
// Cells and columns
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// Numeric reading of the cell; anything unparsable becomes missing.
    pub fn to_numeric(&self) -> Cell {
        match self {
            Cell::Number(n) if !n.is_nan() => Cell::Number(*n),
            Cell::Text(s) => parse_number(s).map(Cell::Number).unwrap_or(Cell::Missing),
            _ => Cell::Missing,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Missing => Value::Null,
        }
    }
}

/// Label form used for filtering, grouping keys and chart axes.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Missing => f.write_str(MISSING_TEXT),
        }
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Number,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Row-major table with named, ordered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Same columns, no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `name` in row order; empty when the column does not exist.
    pub fn values<'a>(&'a self, name: &str) -> Vec<&'a Cell> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().map(|r| &r[idx]).collect(),
            None => Vec::new(),
        }
    }

    /// One JSON object per row keyed by column name.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| (col.name.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }
}

// =============================================================================
// Dataset + manifest
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetManifest {
    pub dataset: DatasetKind,
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub columns: Vec<ColumnSummary>,
    pub loaded_at: String,
}

/// A loaded source table; read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    table: Table,
    manifest: DatasetManifest,
}

impl Dataset {
    pub fn load(kind: DatasetKind, path: &Path) -> Result<Self, LoadError> {
        let _scope = ProfileScope::new("dataset_load");
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_csv_bytes(kind, path, &bytes)?;
        log_dataset_loaded(
            kind.slug(),
            &path.display().to_string(),
            dataset.table.len(),
            dataset.table.columns().len(),
        );
        Ok(dataset)
    }

    /// Parse CSV text already in memory; `source` is only used for reporting.
    pub fn from_csv_bytes(kind: DatasetKind, source: &Path, bytes: &[u8]) -> Result<Self, LoadError> {
        let mut table = parse_csv(source, bytes)?;
        for field in kind.fields() {
            if let Some(column) = kind.column(*field) {
                if table.column_index(column).is_none() {
                    return Err(LoadError::MissingColumn {
                        path: source.to_path_buf(),
                        column: column.to_string(),
                    });
                }
            }
        }
        force_text(&mut table, kind.entity_column());

        let manifest = DatasetManifest {
            dataset: kind,
            path: source.display().to_string(),
            hash_sha256: hex::encode(Sha256::digest(bytes)),
            row_count: table.len() as u64,
            columns: summarize(&table),
            loaded_at: ts_now(),
        };
        Ok(Self {
            kind,
            table,
            manifest,
        })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn manifest(&self) -> &DatasetManifest {
        &self.manifest
    }

    /// Identifiers in file order, first occurrence only.
    pub fn entities_in_order(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.table
            .values(self.kind.entity_column())
            .into_iter()
            .map(|c| c.to_string())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    /// Distinct identifiers, sorted.
    pub fn entities_sorted(&self) -> Vec<String> {
        self.table
            .values(self.kind.entity_column())
            .into_iter()
            .map(|c| c.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn is_na(raw: &str) -> bool {
    NA_TOKENS.contains(&raw)
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return LoadError::Malformed {
            path: path.to_path_buf(),
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
            reason: format!("expected {} fields, found {}", expected_len, len),
        };
    }
    LoadError::Csv {
        path: path.to_path_buf(),
        source: err,
    }
}

/// Parse delimited text with a header row, inferring a kind per column.
pub fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if header.is_empty() || header.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Malformed {
            path: path.to_path_buf(),
            line: 1,
            reason: "missing header row".to_string(),
        });
    }
    let header = normalize_headers(header);

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..header.len())
        .map(|j| {
            let numeric = raw
                .iter()
                .map(|r| r[j].as_str())
                .filter(|s| !is_na(s))
                .all(|s| parse_number(s).is_some());
            if numeric {
                ColumnKind::Number
            } else {
                ColumnKind::Text
            }
        })
        .collect();

    let rows = raw
        .into_iter()
        .map(|r| {
            r.into_iter()
                .zip(&kinds)
                .map(|(s, kind)| {
                    if is_na(&s) {
                        Cell::Missing
                    } else if *kind == ColumnKind::Number {
                        parse_number(&s).map(Cell::Number).unwrap_or(Cell::Missing)
                    } else {
                        Cell::Text(s)
                    }
                })
                .collect()
        })
        .collect();

    let columns = header
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| Column::new(name, kind))
        .collect();
    Ok(Table::new(columns, rows))
}

/// Blank names become `Unnamed: {i}`; repeats get `.1`, `.2`, ... suffixes,
/// skipping any suffixed name already taken.
fn normalize_headers(names: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let mut name = if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            };
            let mut seen = counts.get(&name).copied().unwrap_or(0);
            while seen > 0 {
                counts.insert(name.clone(), seen + 1);
                name = format!("{}.{}", name, seen);
                seen = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), seen + 1);
            name
        })
        .collect()
}

/// Force a column to text. Missing cells become the literal `"nan"`;
/// a numeric column with gaps renders its numbers as floats (`"3.0"`).
fn force_text(table: &mut Table, column: &str) {
    let Some(idx) = table.column_index(column) else {
        return;
    };
    let float_style = table.rows.iter().any(|r| match &r[idx] {
        Cell::Missing => true,
        Cell::Number(n) => n.fract() != 0.0,
        Cell::Text(_) => false,
    });
    for row in table.rows.iter_mut() {
        let text = match &row[idx] {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if float_style => format!("{:?}", n),
            Cell::Number(n) => format_number(*n),
            Cell::Missing => MISSING_TEXT.to_string(),
        };
        row[idx] = Cell::Text(text);
    }
    table.columns[idx].kind = ColumnKind::Text;
}

fn summarize(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| ColumnSummary {
            name: col.name.clone(),
            kind: col.kind,
            missing: table.rows().iter().filter(|r| r[idx].is_missing()).count() as u64,
        })
        .collect()
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}
