//! Chart descriptions built straight from a derived table.
//!
//! No smoothing, scaling or overlays: one point per row that has a numeric
//! y value, split into series by the optional color column.

use serde::Serialize;

use crate::data::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
    pub series: Option<String>,
}

/// Points of one legend entry, in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: Option<String>,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color_label: Option<String>,
    pub points: Vec<ChartPoint>,
    pub series: Vec<Series>,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn render_bar(table: &Table, x: &str, y: &str, color: Option<&str>, title: &str) -> ChartSpec {
    render(ChartKind::Bar, table, x, y, color, title)
}

pub fn render_line(table: &Table, x: &str, y: &str, color: Option<&str>, title: &str) -> ChartSpec {
    render(ChartKind::Line, table, x, y, color, title)
}

fn render(kind: ChartKind, table: &Table, x: &str, y: &str, color: Option<&str>, title: &str) -> ChartSpec {
    let x_idx = table.column_index(x);
    let y_idx = table.column_index(y);
    let color_idx = color.and_then(|c| table.column_index(c));

    let points: Vec<ChartPoint> = match (x_idx, y_idx) {
        (Some(xi), Some(yi)) => table
            .rows()
            .iter()
            .filter_map(|row| {
                let value = row[yi].as_number()?;
                Some(ChartPoint {
                    x: row[xi].to_string(),
                    y: value,
                    series: color_idx.map(|ci| row[ci].to_string()),
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    ChartSpec {
        kind,
        title: title.to_string(),
        x_label: x.to_string(),
        y_label: y.to_string(),
        color_label: color.map(str::to_string),
        series: split_series(&points),
        points,
    }
}

fn split_series(points: &[ChartPoint]) -> Vec<Series> {
    let mut out: Vec<Series> = Vec::new();
    for p in points {
        let slot = match out.iter().position(|s| s.name == p.series) {
            Some(i) => i,
            None => {
                out.push(Series {
                    name: p.series.clone(),
                    x: Vec::new(),
                    y: Vec::new(),
                });
                out.len() - 1
            }
        };
        out[slot].x.push(p.x.clone());
        out[slot].y.push(p.y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, Column, ColumnKind};

    fn yearly() -> Table {
        let columns = vec![
            Column::new("Local authority name", ColumnKind::Text),
            Column::new("Financial year", ColumnKind::Text),
            Column::new("Spend", ColumnKind::Number),
        ];
        let row = |la: &str, fy: &str, v: Cell| vec![Cell::Text(la.into()), Cell::Text(fy.into()), v];
        Table::new(
            columns,
            vec![
                row("Leeds", "2020-21", Cell::Number(1.0)),
                row("York", "2020-21", Cell::Number(2.0)),
                row("Leeds", "2021-22", Cell::Number(3.0)),
                row("York", "2021-22", Cell::Missing),
            ],
        )
    }

    #[test]
    fn test_line_splits_series_by_color() {
        let spec = render_line(
            &yearly(),
            "Financial year",
            "Spend",
            Some("Local authority name"),
            "Comparison of Spend Over Time",
        );
        assert_eq!(spec.kind, ChartKind::Line);
        assert_eq!(spec.points.len(), 3);
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].name.as_deref(), Some("Leeds"));
        assert_eq!(spec.series[0].x, vec!["2020-21", "2021-22"]);
        assert_eq!(spec.series[0].y, vec![1.0, 3.0]);
        assert_eq!(spec.series[1].y, vec![2.0]);
        assert_eq!(spec.y_label, "Spend");
        assert_eq!(spec.x_label, "Financial year");
    }

    #[test]
    fn test_bar_without_color_is_one_series() {
        let spec = render_bar(&yearly(), "Financial year", "Spend", None, "t");
        assert_eq!(spec.series.len(), 1);
        assert_eq!(spec.series[0].name, None);
        assert!(spec.points.iter().all(|p| p.series.is_none()));
    }

    #[test]
    fn test_empty_table_renders_empty_chart() {
        let spec = render_bar(&yearly().empty_like(), "Financial year", "Spend", None, "t");
        assert!(spec.is_empty());
        assert!(spec.series.is_empty());
        assert_eq!(spec.title, "t");
    }
}
