//! Canned exoplanet source for exercising the HTTP layer without an upstream.

use super::ExoplanetSource;
use crate::domain::{AnalysisResult, CatalogMatch, PlanetDetails, TargetQuery};
use crate::errors::{GatewayError, GatewayResult};
use crate::query::validate_target;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

pub const DEMO_CONFIDENCE: f64 = 97.5;

#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Planet,
    FalsePositive,
    Fail(GatewayError),
}

/// Answers every call with the same demo outcome
pub struct FakeGateway {
    outcome: FakeOutcome,
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn planet() -> Self {
        Self::new(FakeOutcome::Planet)
    }

    pub fn false_positive() -> Self {
        Self::new(FakeOutcome::FalsePositive)
    }

    pub fn failing(err: GatewayError) -> Self {
        Self::new(FakeOutcome::Fail(err))
    }

    /// Calls that got past input validation
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn demo_match() -> CatalogMatch {
        CatalogMatch {
            planet_name: "Kepler-186f (Demo)".to_string(),
            star_name: "Kepler-186".to_string(),
            disposition: Some("CONFIRMED".to_string()),
            radius_earth: Some(1.17),
            period_days: Some(129.9),
            star_teff_k: Some(3755.0),
            insolation_earth: Some(0.29),
            star_count: Some(1),
            planet_count: Some(5),
        }
    }

    fn respond(&self, query: &TargetQuery, cancel: &CancellationToken) -> GatewayResult<AnalysisResult> {
        let identifier = validate_target(query)?;
        if cancel.is_cancelled() {
            return Err(GatewayError::cancelled());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            FakeOutcome::Planet => Ok(AnalysisResult::planet(
                PlanetDetails {
                    star_name: "Kepler-186".to_string(),
                    planet_name: "Kepler-186f (Demo)".to_string(),
                    star_type: "K-type".to_string(),
                    planet_type: "Earth-sized".to_string(),
                    habitable_zone_status: "Within habitable zone".to_string(),
                },
                Some(DEMO_CONFIDENCE),
            )),
            FakeOutcome::FalsePositive => Ok(AnalysisResult::not_planet(
                format!("Signal XJ-771 (Demo) for {identifier} is a false positive."),
                Some(DEMO_CONFIDENCE),
            )),
            FakeOutcome::Fail(err) => Err(err.clone()),
        }
    }
}

#[async_trait]
impl ExoplanetSource for FakeGateway {
    async fn fetch_analysis_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<AnalysisResult> {
        self.respond(query, cancel)
    }

    async fn search_catalog_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<CatalogMatch>> {
        let result = self.respond(query, cancel)?;
        Ok(if result.is_planet() {
            vec![Self::demo_match()]
        } else {
            Vec::new()
        })
    }

    async fn classify_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<AnalysisResult> {
        self.respond(query, cancel)
    }

    async fn proxy_query(&self, raw_query: &str) -> GatewayResult<Value> {
        if raw_query.trim().is_empty() {
            return Err(GatewayError::validation("Missing query parameter"));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            FakeOutcome::Fail(err) => Err(err.clone()),
            _ => Ok(json!([{ "query": raw_query }])),
        }
    }
}
