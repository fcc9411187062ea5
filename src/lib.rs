//! Exoplanet archive gateway: catalog query building, upstream retrieval with
//! result normalization, and a small proxy server for browser clients.
pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod services;
pub mod utils;

pub use domain::{AnalysisResult, Mission, TargetQuery};
pub use errors::{GatewayError, GatewayErrorKind};
pub use services::{ArchiveGateway, ExoplanetSource};
