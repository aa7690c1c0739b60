//! Navigation paths and the page descriptors behind them.

use serde::{Deserialize, Serialize};

use crate::dashboard::{ChartId, Dashboard};
use crate::data::DatasetKind;
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    ExploreMerged,
    ExploreOflog,
    CompareLocalAuthorities,
    RegionalAnalysis,
}

impl Page {
    /// Navigation order.
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::ExploreMerged,
        Page::ExploreOflog,
        Page::CompareLocalAuthorities,
        Page::RegionalAnalysis,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::ExploreMerged => "/explore-merged",
            Page::ExploreOflog => "/explore-oflog",
            Page::CompareLocalAuthorities => "/compare-local-authorities",
            Page::RegionalAnalysis => "/regional-analysis",
        }
    }

    pub fn nav_title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::ExploreMerged => DatasetKind::Merged.title(),
            Page::ExploreOflog => DatasetKind::Oflog.title(),
            Page::CompareLocalAuthorities => "Compare Local Authorities",
            Page::RegionalAnalysis => "Regional Analysis",
        }
    }

    /// Charts rendered on this page, top to bottom.
    pub fn charts(self) -> &'static [ChartId] {
        match self {
            Page::CompareLocalAuthorities => &[ChartId::ComparisonMerged, ChartId::ComparisonOflog],
            Page::RegionalAnalysis => &[ChartId::RegionalMerged, ChartId::RegionalOflog],
            _ => &[],
        }
    }

    pub fn controls(self) -> &'static [ControlId] {
        match self {
            Page::CompareLocalAuthorities => &[
                ControlId::CompareAuthorities,
                ControlId::CompareMergedMeasure,
                ControlId::CompareOflogMeasure,
            ],
            Page::RegionalAnalysis => &[ControlId::RegionalMergedMeasure, ControlId::RegionalOflogMeasure],
            _ => &[],
        }
    }

    /// Build the descriptor the UI renders; control defaults come from `state`.
    pub fn layout(self, dashboard: &Dashboard, state: &SelectionState) -> PageLayout {
        let (heading, paragraphs, image) = match self {
            Page::Home => (
                "Welcome to the Agilisys Data Explorer Page",
                vec![
                    "Use the links above to navigate to different pages.",
                    "Benchmark Local Authorities Performance Across Multiple Metrics",
                    "Dive into the datasets and uncover insights through interactive visualizations and comparisons.",
                    "Click on the links above to get started.",
                ],
                Some("/assets/transform_logo.png"),
            ),
            Page::ExploreMerged => ("Explore Social Care and EHCP Data", Vec::new(), None),
            Page::ExploreOflog => ("Explore Oflog Data", Vec::new(), None),
            Page::CompareLocalAuthorities => ("Compare Local Authorities", Vec::new(), None),
            Page::RegionalAnalysis => ("Regional Analysis", Vec::new(), None),
        };
        let tables = match self {
            Page::ExploreMerged => vec![DatasetKind::Merged],
            Page::ExploreOflog => vec![DatasetKind::Oflog],
            _ => Vec::new(),
        };

        PageLayout {
            page: self,
            path: self.path(),
            nav: Page::ALL
                .iter()
                .map(|p| NavLink {
                    title: p.nav_title(),
                    href: p.path(),
                })
                .collect(),
            heading,
            paragraphs,
            image,
            controls: self
                .controls()
                .iter()
                .map(|id| Control {
                    id: *id,
                    label: id.label(),
                    options: dashboard.options_for(*id),
                    value: state.control_value(*id),
                    multi: id.is_multi(),
                })
                .collect(),
            charts: self
                .charts()
                .iter()
                .map(|chart| ChartPanel {
                    chart: *chart,
                    entity_control: chart.entity_control(),
                    measure_control: chart.measure_control(),
                })
                .collect(),
            tables,
        }
    }
}

/// Page for a navigation path. Anything unrecognised is the home page.
pub fn route(path: &str) -> Page {
    Page::ALL
        .into_iter()
        .find(|p| p.path() == path)
        .unwrap_or(Page::Home)
}

// =============================================================================
// Descriptors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlId {
    CompareAuthorities,
    CompareMergedMeasure,
    CompareOflogMeasure,
    RegionalMergedMeasure,
    RegionalOflogMeasure,
}

impl ControlId {
    pub const ALL: [ControlId; 5] = [
        ControlId::CompareAuthorities,
        ControlId::CompareMergedMeasure,
        ControlId::CompareOflogMeasure,
        ControlId::RegionalMergedMeasure,
        ControlId::RegionalOflogMeasure,
    ];

    /// Element id of the control; equal to its serialized form.
    pub fn dom_id(self) -> &'static str {
        match self {
            ControlId::CompareAuthorities => "compare-authorities",
            ControlId::CompareMergedMeasure => "compare-merged-measure",
            ControlId::CompareOflogMeasure => "compare-oflog-measure",
            ControlId::RegionalMergedMeasure => "regional-merged-measure",
            ControlId::RegionalOflogMeasure => "regional-oflog-measure",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlId::CompareAuthorities => "Local authorities",
            ControlId::CompareMergedMeasure | ControlId::RegionalMergedMeasure => {
                "Social care and EHCP measure"
            }
            ControlId::CompareOflogMeasure | ControlId::RegionalOflogMeasure => "Oflog measure",
        }
    }

    pub fn is_multi(self) -> bool {
        self == ControlId::CompareAuthorities
    }

    /// Dataset whose measure columns populate the dropdown, if a measure control.
    pub fn measure_dataset(self) -> Option<DatasetKind> {
        match self {
            ControlId::CompareAuthorities => None,
            ControlId::CompareMergedMeasure | ControlId::RegionalMergedMeasure => Some(DatasetKind::Merged),
            ControlId::CompareOflogMeasure | ControlId::RegionalOflogMeasure => Some(DatasetKind::Oflog),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Control {
    pub id: ControlId,
    pub label: &'static str,
    pub options: Vec<String>,
    pub value: Vec<String>,
    pub multi: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPanel {
    pub chart: ChartId,
    pub entity_control: Option<ControlId>,
    pub measure_control: ControlId,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLayout {
    pub page: Page,
    pub path: &'static str,
    pub nav: Vec<NavLink>,
    pub heading: &'static str,
    pub paragraphs: Vec<&'static str>,
    pub image: Option<&'static str>,
    pub controls: Vec<Control>,
    pub charts: Vec<ChartPanel>,
    pub tables: Vec<DatasetKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_id_matches_serialized_control_id() {
        for control in ControlId::ALL {
            assert_eq!(serde_json::to_value(control).unwrap(), control.dom_id());
            let parsed: ControlId = serde_json::from_value(serde_json::json!(control.dom_id())).unwrap();
            assert_eq!(parsed, control);
        }
    }

    #[test]
    fn test_every_known_path_routes_to_itself() {
        for page in Page::ALL {
            assert_eq!(route(page.path()), page);
        }
    }

    #[test]
    fn test_unknown_paths_fall_back_home() {
        assert_eq!(route("/unknown"), Page::Home);
        assert_eq!(route(""), Page::Home);
        assert_eq!(route("/explore-oflog/"), Page::Home);
    }

    #[test]
    fn test_only_comparison_controls_are_multi() {
        let multi: Vec<_> = Page::CompareLocalAuthorities
            .controls()
            .iter()
            .filter(|c| c.is_multi())
            .collect();
        assert_eq!(multi, vec![&ControlId::CompareAuthorities]);
    }

    #[test]
    fn test_charts_read_controls_on_their_page() {
        for page in Page::ALL {
            for chart in page.charts() {
                assert!(page.controls().contains(&chart.measure_control()));
                if let Some(entity) = chart.entity_control() {
                    assert!(page.controls().contains(&entity));
                }
            }
        }
    }
}
