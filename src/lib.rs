pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod router;
pub mod selection;
pub mod server;
