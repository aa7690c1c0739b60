//! Binds selections to charts.
//!
//! `on_selection_changed` is the whole reactive cycle for one chart: validate
//! the selection, run the pipeline on a working copy, render. A selection that
//! cannot drive the pipeline yields `None` ("no update"), never an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::chart::{render_bar, render_line, ChartKind, ChartSpec};
use crate::data::{Dataset, DatasetKind, Field, Table};
use crate::error::SelectionError;
use crate::logging::{log_recompute, log_selection_skipped, v_str, ProfileScope};
use crate::pipeline::{coerce_numeric, drop_missing, filter_by_entities, group_and_average};
use crate::router::ControlId;
use crate::selection::{SelectionInput, SelectionState, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    ComparisonMerged,
    ComparisonOflog,
    RegionalMerged,
    RegionalOflog,
}

impl ChartId {
    pub const ALL: [ChartId; 4] = [
        ChartId::ComparisonMerged,
        ChartId::ComparisonOflog,
        ChartId::RegionalMerged,
        ChartId::RegionalOflog,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ChartId::ComparisonMerged => "comparison-merged",
            ChartId::ComparisonOflog => "comparison-oflog",
            ChartId::RegionalMerged => "regional-merged",
            ChartId::RegionalOflog => "regional-oflog",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == s)
    }

    pub fn dataset(self) -> DatasetKind {
        match self {
            ChartId::ComparisonMerged | ChartId::RegionalMerged => DatasetKind::Merged,
            ChartId::ComparisonOflog | ChartId::RegionalOflog => DatasetKind::Oflog,
        }
    }

    pub fn entity_control(self) -> Option<ControlId> {
        match self {
            ChartId::ComparisonMerged | ChartId::ComparisonOflog => Some(ControlId::CompareAuthorities),
            ChartId::RegionalMerged | ChartId::RegionalOflog => None,
        }
    }

    pub fn measure_control(self) -> ControlId {
        match self {
            ChartId::ComparisonMerged => ControlId::CompareMergedMeasure,
            ChartId::ComparisonOflog => ControlId::CompareOflogMeasure,
            ChartId::RegionalMerged => ControlId::RegionalMergedMeasure,
            ChartId::RegionalOflog => ControlId::RegionalOflogMeasure,
        }
    }

    pub fn group_by(self) -> &'static [Field] {
        match self {
            ChartId::ComparisonMerged | ChartId::ComparisonOflog => &[],
            ChartId::RegionalMerged => &[Field::Region],
            ChartId::RegionalOflog => &[Field::Region, Field::FinancialYear],
        }
    }

    pub fn kind(self) -> ChartKind {
        match self {
            ChartId::ComparisonMerged | ChartId::RegionalMerged => ChartKind::Bar,
            ChartId::ComparisonOflog | ChartId::RegionalOflog => ChartKind::Line,
        }
    }

    fn x_field(self) -> Field {
        match self {
            ChartId::ComparisonMerged => Field::LocalAuthority,
            ChartId::RegionalMerged => Field::Region,
            ChartId::ComparisonOflog | ChartId::RegionalOflog => Field::FinancialYear,
        }
    }

    fn color_field(self) -> Option<Field> {
        match self {
            ChartId::ComparisonMerged | ChartId::ComparisonOflog => Some(Field::LocalAuthority),
            ChartId::RegionalMerged => None,
            ChartId::RegionalOflog => Some(Field::Region),
        }
    }

    pub fn title(self, measure: &str) -> String {
        match self {
            ChartId::ComparisonMerged => format!("Comparison of {} Across Local Authorities", measure),
            ChartId::ComparisonOflog => format!("Comparison of {} Over Time", measure),
            ChartId::RegionalMerged => format!("Average {} by Region", measure),
            ChartId::RegionalOflog => format!("{} Over Time by Region", measure),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartUpdate {
    pub chart: ChartId,
    pub spec: ChartSpec,
}

/// The two source datasets, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Dashboard {
    merged: Arc<Dataset>,
    oflog: Arc<Dataset>,
}

impl Dashboard {
    pub fn new(merged: Dataset, oflog: Dataset) -> Self {
        Self {
            merged: Arc::new(merged),
            oflog: Arc::new(oflog),
        }
    }

    pub fn dataset(&self, kind: DatasetKind) -> &Dataset {
        match kind {
            DatasetKind::Merged => &self.merged,
            DatasetKind::Oflog => &self.oflog,
        }
    }

    /// Local authorities offered by the comparison dropdown.
    pub fn entity_options(&self) -> Vec<String> {
        self.merged.entities_sorted()
    }

    pub fn default_entities(&self) -> Vec<String> {
        self.merged.entities_in_order().into_iter().take(1).collect()
    }

    pub fn measure_options(&self, kind: DatasetKind) -> Vec<String> {
        kind.measure_columns(self.dataset(kind).table())
    }

    pub fn default_measure(&self, kind: DatasetKind) -> Option<String> {
        kind.default_measure(self.dataset(kind).table())
    }

    pub fn options_for(&self, control: ControlId) -> Vec<String> {
        match control.measure_dataset() {
            Some(kind) => self.measure_options(kind),
            None => self.entity_options(),
        }
    }

    /// Recompute one chart. `None` means leave whatever is shown in place.
    pub fn on_selection_changed(&self, chart: ChartId, input: &SelectionInput) -> Option<ChartSpec> {
        match self.recompute(chart, input) {
            Ok(spec) => Some(spec),
            Err(err) => {
                log_selection_skipped(chart.slug(), &err.to_string());
                None
            }
        }
    }

    pub fn recompute(&self, chart: ChartId, input: &SelectionInput) -> Result<ChartSpec, SelectionError> {
        let dataset = self.dataset(chart.dataset());
        let kind = dataset.kind();
        let selection = input.resolve(dataset, chart.group_by(), chart.entity_control().is_some())?;
        let measure = selection.measure.name();
        let _scope = ProfileScope::with_context("recompute", &[("chart", v_str(chart.slug()))]);

        let source = dataset.table();
        let filtered: Table;
        let working = match &selection.entities {
            Some(entities) => {
                filtered = filter_by_entities(source, kind.entity_column(), entities);
                &filtered
            }
            None => source,
        };
        let cleaned = drop_missing(&coerce_numeric(working, measure), measure);
        let derived = if selection.group_by.is_empty() {
            cleaned
        } else {
            let keys: Vec<&str> = selection
                .group_by
                .iter()
                .filter_map(|f| kind.column(*f))
                .collect();
            group_and_average(&cleaned, &keys, measure)
        };

        let x = kind.column(chart.x_field()).unwrap_or_default();
        let color = chart.color_field().and_then(|f| kind.column(f));
        let title = chart.title(measure);
        let spec = match chart.kind() {
            ChartKind::Bar => render_bar(&derived, x, measure, color, &title),
            ChartKind::Line => render_line(&derived, x, measure, color, &title),
        };
        log_recompute(chart.slug(), measure, working.len(), derived.len(), spec.series.len());
        Ok(spec)
    }

    /// Apply a UI event to a session's state and recompute what it touches.
    /// Charts whose selection is incomplete are left out of the result.
    pub fn dispatch(&self, state: &mut SelectionState, event: &UiEvent) -> Vec<ChartUpdate> {
        let defaults = SelectionState::initial(self);
        state
            .apply(event, &defaults)
            .into_iter()
            .filter_map(|chart| {
                self.on_selection_changed(chart, &state.input_for(chart))
                    .map(|spec| ChartUpdate { chart, spec })
            })
            .collect()
    }
}
