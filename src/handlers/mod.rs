/// HTTP request handlers
use crate::domain::{AnalysisResult, Health, Mission, MissionInfo, TargetQuery};
use crate::errors::GatewayError;
use crate::services::ExoplanetSource;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ExoplanetSource>,
}

impl AppState {
    pub fn new(source: Arc<dyn ExoplanetSource>) -> Self {
        Self { source }
    }
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Query-string form of a target lookup
#[derive(Debug, Deserialize)]
pub struct TargetParams {
    pub mission: Option<String>,
    pub target: Option<String>,
    pub quarter: Option<i64>,
    pub sector: Option<i64>,
}

/// JSON body accepted by the classify endpoint
#[derive(Debug, Deserialize)]
pub struct ClassifyParams {
    pub star_id: String,
    pub mission: String,
    #[serde(default)]
    pub quarter: Option<i64>,
    #[serde(default)]
    pub sector: Option<i64>,
}

fn target_query(
    mission: Option<&str>,
    target: Option<&str>,
    quarter: Option<i64>,
    sector: Option<i64>,
) -> Result<TargetQuery, GatewayError> {
    let mission: Mission = mission
        .ok_or_else(|| GatewayError::validation("Missing mission parameter"))?
        .parse()?;

    let mut query = TargetQuery::new(mission, target.unwrap_or_default());
    let range = match mission {
        Mission::Kepler => quarter,
        Mission::Tess => sector,
    };
    if let Some(range) = range {
        query = query.with_quarter_or_sector(range);
    }
    Ok(query)
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Forward a raw catalog query to the archive
pub async fn proxy_exoplanet(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<Value>, GatewayError> {
    let raw = params
        .get("query")
        .ok_or_else(|| GatewayError::validation("Missing query parameter"))?;

    let data = state.source.proxy_query(raw).await?;
    Ok(Json(data))
}

/// Look a target up in its mission catalog
pub async fn analyze(
    params: Result<Query<TargetParams>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<AnalysisResult>>, GatewayError> {
    let Query(params) = params?;
    let query = target_query(
        params.mission.as_deref(),
        params.target.as_deref(),
        params.quarter,
        params.sector,
    )?;

    let result = state.source.fetch_analysis(&query).await?;
    info!(
        "Analysis for '{}' complete (planet: {})",
        query.target_identifier.trim(),
        result.is_planet()
    );
    Ok(Json(SuccessResponse::new(result)))
}

/// List every catalog match for a target
pub async fn known_planets(
    params: Result<Query<TargetParams>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<Json<Value>, GatewayError> {
    let Query(params) = params?;
    let query = target_query(
        params.mission.as_deref(),
        params.target.as_deref(),
        params.quarter,
        params.sector,
    )?;

    let planets = state.source.search_catalog(&query).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "count": planets.len(),
            "planets": planets
        })
    ))))
}

/// Run the remote classifier for a star
pub async fn classify(
    State(state): State<AppState>,
    params: Result<Json<ClassifyParams>, JsonRejection>,
) -> Result<Json<SuccessResponse<AnalysisResult>>, GatewayError> {
    let Json(params) = params?;
    let query = target_query(
        Some(&params.mission),
        Some(&params.star_id),
        params.quarter,
        params.sector,
    )?;

    let result = state.source.classify(&query).await?;
    Ok(Json(SuccessResponse::new(result)))
}

/// Supported missions
pub async fn missions() -> Json<Value> {
    let missions: Vec<MissionInfo> = Mission::ALL.into_iter().map(MissionInfo::from).collect();
    Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "missions": missions
        })
    )))
}

/// Example targets for a mission
pub async fn examples(Path(mission): Path<String>) -> Result<Json<Value>, GatewayError> {
    let mission: Mission = mission.parse()?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "mission": mission,
            "examples": mission.example_targets()
        })
    ))))
}
