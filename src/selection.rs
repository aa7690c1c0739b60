//! What the user has picked.
//!
//! [`SelectionState`] mirrors the controls of one session and is re-derived
//! from UI events; nothing here outlives the session or is shared between
//! sessions. [`SelectionInput`] is the raw control state feeding one chart and
//! [`Selection`] its validated form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dashboard::{ChartId, Dashboard};
use crate::data::{Dataset, DatasetKind, Field, Measure};
use crate::error::SelectionError;
use crate::router::{route, ControlId, Page};

/// Control values feeding one chart, as the UI sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionInput {
    pub entities: Vec<String>,
    pub measure: Option<String>,
}

impl SelectionInput {
    /// Read `entity` (repeatable) and `measure` from a URL query string.
    pub fn from_query(query: &str) -> Self {
        let mut input = SelectionInput::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "entity" => input.entities.push(value.into_owned()),
                "measure" if input.measure.is_none() => input.measure = Some(value.into_owned()),
                _ => {}
            }
        }
        input
    }

    pub fn resolve(
        &self,
        dataset: &Dataset,
        group_by: &[Field],
        needs_entities: bool,
    ) -> Result<Selection, SelectionError> {
        let entities = if needs_entities {
            let set: BTreeSet<String> = self.entities.iter().cloned().collect();
            if set.is_empty() {
                return Err(SelectionError::Incomplete);
            }
            Some(set)
        } else {
            None
        };
        let measure = self.measure.as_deref().ok_or(SelectionError::Incomplete)?;
        let measure = Measure::resolve(dataset.table(), dataset.kind(), measure)?;
        Ok(Selection {
            entities,
            measure,
            group_by: group_by.to_vec(),
        })
    }
}

/// A selection that can drive the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// `None` when the chart is not filtered by local authority.
    pub entities: Option<BTreeSet<String>>,
    pub measure: Measure,
    /// Empty means no aggregation.
    pub group_by: Vec<Field>,
}

// =============================================================================
// Session state
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Navigate { path: String },
    Change { control: ControlId, value: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub page: Page,
    pub compare_authorities: Vec<String>,
    pub compare_merged_measure: Option<String>,
    pub compare_oflog_measure: Option<String>,
    pub regional_merged_measure: Option<String>,
    pub regional_oflog_measure: Option<String>,
}

impl SelectionState {
    /// Control defaults: the first local authority in file order and each
    /// dataset's default measure.
    pub fn initial(dashboard: &Dashboard) -> Self {
        let merged = dashboard.default_measure(DatasetKind::Merged);
        let oflog = dashboard.default_measure(DatasetKind::Oflog);
        Self {
            page: Page::Home,
            compare_authorities: dashboard.default_entities(),
            compare_merged_measure: merged.clone(),
            compare_oflog_measure: oflog.clone(),
            regional_merged_measure: merged,
            regional_oflog_measure: oflog,
        }
    }

    pub fn control_value(&self, control: ControlId) -> Vec<String> {
        match control {
            ControlId::CompareAuthorities => self.compare_authorities.clone(),
            other => self.measure(other).cloned().into_iter().collect(),
        }
    }

    fn measure(&self, control: ControlId) -> Option<&String> {
        match control {
            ControlId::CompareAuthorities => None,
            ControlId::CompareMergedMeasure => self.compare_merged_measure.as_ref(),
            ControlId::CompareOflogMeasure => self.compare_oflog_measure.as_ref(),
            ControlId::RegionalMergedMeasure => self.regional_merged_measure.as_ref(),
            ControlId::RegionalOflogMeasure => self.regional_oflog_measure.as_ref(),
        }
    }

    fn set_control(&mut self, control: ControlId, value: Vec<String>) {
        let first = value.first().filter(|v| !v.is_empty()).cloned();
        match control {
            ControlId::CompareAuthorities => self.compare_authorities = value,
            ControlId::CompareMergedMeasure => self.compare_merged_measure = first,
            ControlId::CompareOflogMeasure => self.compare_oflog_measure = first,
            ControlId::RegionalMergedMeasure => self.regional_merged_measure = first,
            ControlId::RegionalOflogMeasure => self.regional_oflog_measure = first,
        }
    }

    /// What `chart` currently reads from the controls.
    pub fn input_for(&self, chart: ChartId) -> SelectionInput {
        SelectionInput {
            entities: chart
                .entity_control()
                .map(|c| self.control_value(c))
                .unwrap_or_default(),
            measure: self.measure(chart.measure_control()).cloned(),
        }
    }

    /// Apply one event and return the charts that must recompute.
    ///
    /// Navigation rebuilds the target page with its controls back at their
    /// defaults, so every chart on it recomputes.
    pub fn apply(&mut self, event: &UiEvent, defaults: &SelectionState) -> Vec<ChartId> {
        match event {
            UiEvent::Navigate { path } => {
                let page = route(path);
                self.page = page;
                for control in page.controls() {
                    self.set_control(*control, defaults.control_value(*control));
                }
                page.charts().to_vec()
            }
            UiEvent::Change { control, value } => {
                self.set_control(*control, value.clone());
                ChartId::ALL
                    .into_iter()
                    .filter(|c| c.measure_control() == *control || c.entity_control() == Some(*control))
                    .collect()
            }
        }
    }
}
