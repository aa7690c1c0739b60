//! Error taxonomy.
//!
//! Only [`LoadError`] is fatal. Selection problems degrade to "no update" and
//! numeric coercion failures are not errors at all (the cell becomes missing).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use thiserror::Error;

use crate::logging::{log, obj, v_str, Domain, Level};

/// A source table could not be read at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed {path} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("{path} has no column named {column:?}")]
    MissingColumn { path: PathBuf, column: String },
}

/// Why a selection could not drive a recomputation.
///
/// None of these reach the end user; callers treat every variant as
/// "leave the previous chart in place".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("selection incomplete")]
    Incomplete,
    #[error("unknown measure column {0:?}")]
    UnknownMeasure(String),
    #[error("column {0:?} is reserved and cannot be used as a measure")]
    ReservedColumn(String),
}

/// Errors answered by the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };
        log(
            Level::Warn,
            Domain::Http,
            "request_error",
            obj(&[("status", v_str(status.as_str())), ("msg", v_str(&message))]),
        );
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let resp = AppError::NotFound("chart nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_load_error_names_the_file() {
        let err = LoadError::MissingColumn {
            path: PathBuf::from("Oflog.csv"),
            column: "Region".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Oflog.csv"));
        assert!(msg.contains("Region"));
    }
}
