//! HTTP surface: server-rendered page shells plus a small JSON API the
//! shells call back into.

use axum::extract::{Path, Query, RawQuery, Request, State};
use axum::http::{StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path as FsPath;
use tower_http::services::ServeDir;

use crate::dashboard::{ChartId, ChartUpdate, Dashboard};
use crate::data::{Column, DatasetKind, DatasetManifest};
use crate::error::AppError;
use crate::logging::log_request;
use crate::router::{route, PageLayout};
use crate::selection::{SelectionInput, SelectionState, UiEvent};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

pub fn router(dashboard: Dashboard, assets_dir: &FsPath) -> Router {
    let state = AppState { dashboard };
    Router::new()
        .route("/health", get(health))
        .route("/api/layout", get(layout_handler))
        .route("/api/chart/:chart", get(chart_handler))
        .route("/api/table/:dataset", get(table_handler))
        .route("/api/datasets", get(datasets_handler))
        .route("/api/event", post(event_handler))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .fallback(page_handler)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let resp = next.run(req).await;
    log_request(&method, &path, resp.status().as_u16());
    resp
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct LayoutQuery {
    #[serde(default)]
    pub path: String,
}

/// Unknown paths fall back to home; only a non-absolute path is rejected.
pub async fn layout_handler(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<Json<PageLayout>, AppError> {
    if !query.path.starts_with('/') {
        return Err(AppError::BadRequest(format!("path {:?} is not absolute", query.path)));
    }
    Ok(Json(layout_for(&state.dashboard, &query.path)))
}

/// `204 No Content` when the selection cannot drive a recomputation.
pub async fn chart_handler(
    State(state): State<AppState>,
    Path(chart): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let chart = ChartId::from_slug(&chart).ok_or_else(|| AppError::NotFound(format!("chart {}", chart)))?;
    let input = SelectionInput::from_query(query.as_deref().unwrap_or(""));
    Ok(match state.dashboard.on_selection_changed(chart, &input) {
        Some(spec) => Json(spec).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[derive(Debug, Serialize)]
pub struct TablePayload {
    pub columns: Vec<Column>,
    pub records: Vec<Map<String, Value>>,
}

pub async fn table_handler(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
) -> Result<Json<TablePayload>, AppError> {
    let kind = DatasetKind::from_slug(&dataset).ok_or_else(|| AppError::NotFound(format!("dataset {}", dataset)))?;
    let table = state.dashboard.dataset(kind).table();
    Ok(Json(TablePayload {
        columns: table.columns().to_vec(),
        records: table.records(),
    }))
}

pub async fn datasets_handler(State(state): State<AppState>) -> Json<Vec<DatasetManifest>> {
    Json(
        DatasetKind::ALL
            .iter()
            .map(|k| state.dashboard.dataset(*k).manifest().clone())
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    /// Absent on the first event of a session.
    pub state: Option<SelectionState>,
    pub event: UiEvent,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub state: SelectionState,
    pub updates: Vec<ChartUpdate>,
}

pub async fn event_handler(State(state): State<AppState>, Json(req): Json<EventRequest>) -> Json<EventResponse> {
    let mut session = req
        .state
        .unwrap_or_else(|| SelectionState::initial(&state.dashboard));
    let updates = state.dashboard.dispatch(&mut session, &req.event);
    Json(EventResponse {
        state: session,
        updates,
    })
}

pub async fn page_handler(State(state): State<AppState>, uri: Uri) -> Html<String> {
    Html(render_page(&layout_for(&state.dashboard, uri.path())))
}

fn layout_for(dashboard: &Dashboard, path: &str) -> PageLayout {
    let session = SelectionState::initial(dashboard);
    route(path).layout(dashboard, &session)
}

// =============================================================================
// HTML shell
// =============================================================================

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_page(layout: &PageLayout) -> String {
    let mut body = String::new();

    body.push_str("<div class=\"header\"><h1>Data Explorer</h1>");
    body.push_str("<p>Navigate to different pages using the links below:</p><nav>");
    for link in &layout.nav {
        body.push_str(&format!(
            "<div class=\"nav-box\"><a class=\"nav-link\" href=\"{}\">{}</a></div>",
            escape_html(link.href),
            escape_html(link.title)
        ));
    }
    body.push_str("</nav></div><div class=\"content\">");

    body.push_str(&format!("<h2>{}</h2>", escape_html(layout.heading)));
    if let Some(src) = layout.image {
        body.push_str(&format!("<img class=\"hero\" src=\"{}\" alt=\"\">", escape_html(src)));
    }
    for p in &layout.paragraphs {
        body.push_str(&format!("<p>{}</p>", escape_html(p)));
    }

    for control in &layout.controls {
        let id = control.id.dom_id();
        body.push_str(&format!(
            "<label for=\"{id}\">{}</label><select id=\"{id}\"{}>",
            escape_html(control.label),
            if control.multi { " multiple" } else { "" },
        ));
        if !control.multi {
            body.push_str("<option value=\"\"></option>");
        }
        for option in &control.options {
            let selected = if control.value.contains(option) { " selected" } else { "" };
            body.push_str(&format!(
                "<option value=\"{0}\"{1}>{0}</option>",
                escape_html(option),
                selected
            ));
        }
        body.push_str("</select>");
    }

    for panel in &layout.charts {
        body.push_str(&format!("<div class=\"chart\" id=\"chart-{}\"></div>", panel.chart.slug()));
    }
    for table in &layout.tables {
        body.push_str(&format!("<div class=\"table\" data-dataset=\"{}\"></div>", table.slug()));
    }
    body.push_str("</div>");

    let layout_json = serde_json::to_string(layout)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <link rel=\"stylesheet\" href=\"/assets/styles.css\">\
         <script src=\"https://cdn.plot.ly/plotly-2.35.2.min.js\"></script></head>\
         <body>{body}<script id=\"layout\" type=\"application/json\">{layout_json}</script>\
         <script>{script}</script></body></html>",
        title = escape_html(layout.heading),
        body = body,
        layout_json = layout_json,
        script = PAGE_SCRIPT,
    )
}

/// Client glue: re-requests a chart when one of its controls changes and
/// keeps the previous figure on `204`.
const PAGE_SCRIPT: &str = r#"
const layout = JSON.parse(document.getElementById('layout').textContent);
function values(control) {
  const el = document.getElementById(control);
  return el ? Array.from(el.selectedOptions).map(o => o.value).filter(v => v !== '') : [];
}
async function refresh(panel) {
  const q = new URLSearchParams();
  if (panel.entity_control) values(panel.entity_control).forEach(v => q.append('entity', v));
  values(panel.measure_control).forEach(v => q.append('measure', v));
  const resp = await fetch(`/api/chart/${panel.chart}?${q}`);
  if (resp.status !== 200) return;
  const spec = await resp.json();
  const traces = spec.series.map(s => ({
    type: spec.kind === 'bar' ? 'bar' : 'scatter',
    mode: spec.kind === 'line' ? 'lines' : undefined,
    x: s.x, y: s.y, name: s.name ?? undefined, showlegend: s.name !== null,
  }));
  Plotly.react(`chart-${panel.chart}`, traces, {
    title: spec.title,
    xaxis: { title: spec.x_label },
    yaxis: { title: spec.y_label },
    legend: { title: { text: spec.color_label ?? '' } },
  });
}
async function fillTable(el) {
  const resp = await fetch(`/api/table/${el.dataset.dataset}`);
  if (resp.status !== 200) return;
  const data = await resp.json();
  const table = document.createElement('table');
  const head = table.insertRow();
  data.columns.forEach(c => { const th = document.createElement('th'); th.textContent = c.name; head.appendChild(th); });
  data.records.forEach(r => {
    const row = table.insertRow();
    data.columns.forEach(c => { row.insertCell().textContent = r[c.name] ?? ''; });
  });
  el.appendChild(table);
}
layout.controls.forEach(control => {
  const el = document.getElementById(control.id);
  if (!el) return;
  el.addEventListener('change', () => layout.charts
    .filter(p => p.measure_control === control.id || p.entity_control === control.id)
    .forEach(refresh));
});
layout.charts.forEach(refresh);
document.querySelectorAll('.table[data-dataset]').forEach(fillTable);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
