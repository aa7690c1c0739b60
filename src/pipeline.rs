//! Selection-to-table transforms.
//!
//! Every step takes a table by reference and returns a new one, so the loaded
//! datasets are never touched. A step naming a column the table does not have
//! returns an empty table (or, for coercion, an unchanged copy).

use std::collections::{BTreeSet, HashMap};

use crate::data::{Cell, Column, ColumnKind, Table};

/// Rows whose `entity_column` value is in `selected`, in original order.
pub fn filter_by_entities(table: &Table, entity_column: &str, selected: &BTreeSet<String>) -> Table {
    let Some(idx) = table.column_index(entity_column) else {
        return table.empty_like();
    };
    if selected.is_empty() {
        return table.empty_like();
    }
    let rows = table
        .rows()
        .iter()
        .filter(|row| selected.contains(&row[idx].to_string()))
        .cloned()
        .collect();
    Table::new(table.columns().to_vec(), rows)
}

/// Parse every cell of `column` as a number; failures become missing.
pub fn coerce_numeric(table: &Table, column: &str) -> Table {
    let Some(idx) = table.column_index(column) else {
        return table.clone();
    };
    let mut columns = table.columns().to_vec();
    columns[idx].kind = ColumnKind::Number;
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row[idx] = row[idx].to_numeric();
            row
        })
        .collect();
    Table::new(columns, rows)
}

/// Remove rows where `column` holds no number.
pub fn drop_missing(table: &Table, column: &str) -> Table {
    let Some(idx) = table.column_index(column) else {
        return table.empty_like();
    };
    let rows = table
        .rows()
        .iter()
        .filter(|row| row[idx].as_number().is_some())
        .cloned()
        .collect();
    Table::new(table.columns().to_vec(), rows)
}

/// Mean of `measure` per distinct combination of `group_columns`.
///
/// Output columns are the group columns followed by the measure; groups
/// appear in first-encountered order. Rows with a missing group key are
/// left out. Non-numeric measure cells do not count toward the mean; a group
/// with no numeric values gets a missing mean.
pub fn group_and_average(table: &Table, group_columns: &[&str], measure: &str) -> Table {
    let key_idx: Option<Vec<usize>> = group_columns.iter().map(|c| table.column_index(c)).collect();
    let (Some(key_idx), Some(m_idx)) = (key_idx, table.column_index(measure)) else {
        return Table::new(output_columns(table, group_columns, measure), Vec::new());
    };

    struct Group {
        key: Vec<Cell>,
        sum: f64,
        count: usize,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    for row in table.rows() {
        if key_idx.iter().any(|&i| row[i].is_missing()) {
            continue;
        }
        let label: Vec<String> = key_idx.iter().map(|&i| row[i].to_string()).collect();
        let slot = *index.entry(label).or_insert_with(|| {
            groups.push(Group {
                key: key_idx.iter().map(|&i| row[i].clone()).collect(),
                sum: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        if let Some(v) = row[m_idx].as_number() {
            groups[slot].sum += v;
            groups[slot].count += 1;
        }
    }

    let rows = groups
        .into_iter()
        .map(|g| {
            let mean = if g.count == 0 {
                Cell::Missing
            } else {
                Cell::Number(g.sum / g.count as f64)
            };
            let mut row = g.key;
            row.push(mean);
            row
        })
        .collect();
    Table::new(output_columns(table, group_columns, measure), rows)
}

fn output_columns(table: &Table, group_columns: &[&str], measure: &str) -> Vec<Column> {
    let mut columns: Vec<Column> = group_columns
        .iter()
        .map(|name| {
            let kind = table
                .column_index(name)
                .map(|i| table.columns()[i].kind)
                .unwrap_or(ColumnKind::Text);
            Column::new(*name, kind)
        })
        .collect();
    columns.push(Column::new(measure, ColumnKind::Number));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn authorities() -> Table {
        let columns = vec![
            Column::new("la", ColumnKind::Text),
            Column::new("region", ColumnKind::Text),
            Column::new("m", ColumnKind::Text),
        ];
        let rows = vec![
            vec![text("A"), text("North"), text("10")],
            vec![text("B"), text("North"), text("20")],
            vec![text("C"), text("South"), text("N/A")],
            vec![text("A"), Cell::Missing, text("7")],
        ];
        Table::new(columns, rows)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_keeps_order_and_membership() {
        let out = filter_by_entities(&authorities(), "la", &set(&["C", "A"]));
        let las: Vec<String> = out.values("la").iter().map(|c| c.to_string()).collect();
        assert_eq!(las, vec!["A", "C", "A"]);
    }

    #[test]
    fn test_filter_empty_selection_is_empty() {
        let out = filter_by_entities(&authorities(), "la", &BTreeSet::new());
        assert!(out.is_empty());
        assert_eq!(out.columns().len(), 3);
    }

    #[test]
    fn test_filter_unknown_column_is_empty() {
        assert!(filter_by_entities(&authorities(), "nope", &set(&["A"])).is_empty());
    }

    #[test]
    fn test_coerce_does_not_touch_source() {
        let source = authorities();
        let coerced = coerce_numeric(&source, "m");
        assert_eq!(source.values("m")[0], &text("10"));
        assert_eq!(coerced.values("m")[0], &Cell::Number(10.0));
        assert_eq!(coerced.values("m")[2], &Cell::Missing);
        assert_eq!(coerced.columns()[2].kind, ColumnKind::Number);
    }

    #[test]
    fn test_drop_missing_after_coerce() {
        let out = drop_missing(&coerce_numeric(&authorities(), "m"), "m");
        assert_eq!(out.len(), 3);
        assert!(out.values("m").iter().all(|c| c.as_number().is_some()));
    }

    #[test]
    fn test_drop_missing_without_coerce_drops_text() {
        assert!(drop_missing(&authorities(), "m").is_empty());
    }

    #[test]
    fn test_group_skips_missing_keys() {
        let coerced = coerce_numeric(&authorities(), "m");
        let out = group_and_average(&coerced, &["region"], "m");
        assert_eq!(
            out.rows(),
            &[
                vec![text("North"), Cell::Number(15.0)],
                vec![text("South"), Cell::Missing],
            ]
        );
    }

    #[test]
    fn test_group_by_two_columns_first_encountered() {
        let columns = vec![
            Column::new("Region", ColumnKind::Text),
            Column::new("Financial year", ColumnKind::Text),
            Column::new("v", ColumnKind::Number),
        ];
        let rows = vec![
            vec![text("North"), text("2021-22"), Cell::Number(1.0)],
            vec![text("South"), text("2020-21"), Cell::Number(4.0)],
            vec![text("North"), text("2021-22"), Cell::Number(3.0)],
            vec![text("North"), text("2020-21"), Cell::Number(5.0)],
        ];
        let out = group_and_average(&Table::new(columns, rows), &["Region", "Financial year"], "v");
        assert_eq!(
            out.rows(),
            &[
                vec![text("North"), text("2021-22"), Cell::Number(2.0)],
                vec![text("South"), text("2020-21"), Cell::Number(4.0)],
                vec![text("North"), text("2020-21"), Cell::Number(5.0)],
            ]
        );
        let names: Vec<&str> = out.column_names().collect();
        assert_eq!(names, vec!["Region", "Financial year", "v"]);
    }

    #[test]
    fn test_group_unknown_measure_is_empty() {
        let out = group_and_average(&authorities(), &["region"], "missing");
        assert!(out.is_empty());
    }
}
