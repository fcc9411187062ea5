/// Archive gateway: executes catalog and classifier calls and normalizes the results
use crate::clients::{HttpTransport, Transport, TransportRequest, TransportResponse};
use crate::config::GatewayConfig;
use crate::domain::{
    AnalysisResult, ArchiveRequest, CatalogMatch, Mission, PlanetDetails, ResponseFormat,
    TargetQuery, TransitSignal,
};
use crate::errors::{GatewayError, GatewayResult};
use crate::query::{build_query, strip_toi_prefix, validate_target, TAP_SYNC_PATH};
use crate::utils::{
    c_pick, habitable_zone_status, n_pick, planet_type_for_radius, s_pick, snippet,
    star_type_for_teff,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(test)]
pub mod fake;

/// TESS follow-up dispositions that rule a signal out
const REJECTED_DISPOSITIONS: &[&str] = &["FP", "FA"];
/// Dispositions treated as settled planets
const CONFIRMED_DISPOSITIONS: &[&str] = &["CONFIRMED", "CP", "KP"];

/// Everything the HTTP surface needs from an exoplanet data source
#[async_trait]
pub trait ExoplanetSource: Send + Sync {
    async fn fetch_analysis_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<AnalysisResult>;

    async fn search_catalog_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<CatalogMatch>>;

    async fn classify_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<AnalysisResult>;

    /// Forward raw ADQL to the archive and return its JSON untouched
    async fn proxy_query(&self, raw_query: &str) -> GatewayResult<Value>;

    async fn fetch_analysis(&self, query: &TargetQuery) -> GatewayResult<AnalysisResult> {
        self.fetch_analysis_with_cancel(query, &CancellationToken::new())
            .await
    }

    async fn search_catalog(&self, query: &TargetQuery) -> GatewayResult<Vec<CatalogMatch>> {
        self.search_catalog_with_cancel(query, &CancellationToken::new())
            .await
    }

    async fn classify(&self, query: &TargetQuery) -> GatewayResult<AnalysisResult> {
        self.classify_with_cancel(query, &CancellationToken::new())
            .await
    }
}

/// Body posted to the classification backend
#[derive(Debug, Serialize, PartialEq)]
pub struct ClassifyPayload {
    pub star_id: String,
    pub mission: Mission,
    pub quarter: i64,
    pub sector: i64,
}

impl ClassifyPayload {
    fn from_query(query: &TargetQuery, star_id: &str) -> Self {
        let range = query.quarter_or_sector.unwrap_or(0);
        let (quarter, sector) = match query.mission {
            Mission::Kepler => (range, 0),
            Mission::Tess => (0, range),
        };
        Self {
            star_id: star_id.to_string(),
            mission: query.mission,
            quarter,
            sector,
        }
    }
}

/// `data` member of a successful classifier response
#[derive(Debug, Deserialize)]
struct ClassificationData {
    classification: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    period: Option<f64>,
    #[serde(default)]
    depth_ppm: Option<f64>,
    #[serde(default)]
    significance: Option<f64>,
    #[serde(default)]
    estimated_planet_radius: Option<f64>,
    #[serde(default)]
    odd_even_test_status: Option<String>,
    #[serde(default)]
    secondary_eclipse_status: Option<String>,
}

/// Stateless gateway to the exoplanet archive and the classification backend.
///
/// Each call owns its request end to end; the gateway can be shared freely
/// across tasks.
pub struct ArchiveGateway {
    transport: Arc<dyn Transport>,
    archive_base_url: Url,
    classifier_base_url: Url,
    timeout: Duration,
}

impl ArchiveGateway {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let transport = HttpTransport::new(config.request_timeout, &config.user_agent)
            .map_err(|e| GatewayError::network(e.to_string()))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            archive_base_url: config.archive_base_url.clone(),
            classifier_base_url: config.classifier_base_url.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Transport URL for a rendered catalog request
    pub fn catalog_url(&self, request: &ArchiveRequest) -> GatewayResult<Url> {
        self.tap_url(request.endpoint, &request.query, request.format)
    }

    fn tap_url(&self, endpoint: &str, query: &str, format: ResponseFormat) -> GatewayResult<Url> {
        let mut url = self
            .archive_base_url
            .join(endpoint)
            .map_err(|e| GatewayError::validation(format!("invalid archive endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("format", format.as_str());
        Ok(url)
    }

    fn classify_url(&self) -> GatewayResult<Url> {
        self.classifier_base_url
            .join("api/classify")
            .map_err(|e| GatewayError::validation(format!("invalid classifier endpoint: {e}")))
    }

    /// Send one request, bounded by the timeout and the caller's token
    async fn execute(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<TransportResponse> {
        let host = request.url.host_str().unwrap_or_default().to_string();
        let send = tokio::time::timeout(self.timeout, self.transport.send(request));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Request to {} cancelled by caller", host);
                return Err(GatewayError::cancelled());
            }
            outcome = send => outcome,
        };

        match outcome {
            Err(_) => {
                error!("Request to {} timed out after {:?}", host, self.timeout);
                Err(GatewayError::network(format!(
                    "upstream did not respond within {:?}",
                    self.timeout
                )))
            }
            Ok(Err(e)) => {
                error!("Request to {} failed: {}", host, e);
                Err(GatewayError::network(e.to_string()))
            }
            Ok(Ok(resp)) => {
                debug!("{} answered {}", host, resp.status);
                Ok(resp)
            }
        }
    }

    /// Issue a catalog query and return the normalized rows
    async fn catalog_rows(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<CatalogMatch>> {
        let request = build_query(query)?;
        let url = self.catalog_url(&request)?;
        info!(
            "Querying {} catalog for '{}'",
            request.mission,
            query.target_identifier.trim()
        );

        let resp = self.execute(TransportRequest::get(url), cancel).await?;
        ensure_success(&resp)?;
        let payload = decode_body(&resp)?;
        normalize_rows(request.mission, payload)
    }
}

#[async_trait]
impl ExoplanetSource for ArchiveGateway {
    async fn fetch_analysis_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<AnalysisResult> {
        let matches = self.catalog_rows(query, cancel).await?;
        Ok(analysis_from_matches(query, &matches))
    }

    async fn search_catalog_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<CatalogMatch>> {
        self.catalog_rows(query, cancel).await
    }

    async fn classify_with_cancel(
        &self,
        query: &TargetQuery,
        cancel: &CancellationToken,
    ) -> GatewayResult<AnalysisResult> {
        let star_id = validate_target(query)?;
        let payload = ClassifyPayload::from_query(query, star_id);
        let body = serde_json::to_value(&payload)
            .map_err(|e| GatewayError::validation(format!("unencodable request: {e}")))?;
        info!("Classifying {} star '{}'", query.mission, star_id);

        let url = self.classify_url()?;
        let resp = self
            .execute(TransportRequest::post_json(url, body), cancel)
            .await?;
        ensure_success(&resp)?;
        let envelope = decode_body(&resp)?;
        let data = unwrap_envelope(envelope)?;
        Ok(analysis_from_classification(query.mission, star_id, data))
    }

    async fn proxy_query(&self, raw_query: &str) -> GatewayResult<Value> {
        let raw_query = raw_query.trim();
        if raw_query.is_empty() {
            return Err(GatewayError::validation("Missing query parameter"));
        }

        let url = self.tap_url(TAP_SYNC_PATH, raw_query, ResponseFormat::Json)?;
        let resp = self
            .execute(TransportRequest::get(url), &CancellationToken::new())
            .await?;
        ensure_success(&resp)?;
        decode_body(&resp)
    }
}

/// Turn a non-2xx response into an upstream error, keeping any message the body offers
pub fn ensure_success(resp: &TransportResponse) -> GatewayResult<()> {
    if resp.is_success() {
        return Ok(());
    }

    let message = serde_json::from_slice::<Value>(&resp.body)
        .ok()
        .and_then(|body| s_pick(&body, &["error", "message", "detail"]))
        .unwrap_or_else(|| resp.status_text());
    warn!("Upstream returned {}: {}", resp.status, message);
    Err(GatewayError::upstream(Some(resp.status), message))
}

/// Two-step body decoding.
///
/// A declared JSON body is parsed directly. Anything else, or a declared body
/// that fails, is read as text and parsed again with any BOM and surrounding
/// whitespace removed.
pub fn decode_body(resp: &TransportResponse) -> GatewayResult<Value> {
    if resp.declares_json() {
        if let Ok(value) = serde_json::from_slice::<Value>(&resp.body) {
            return Ok(value);
        }
    }

    let text = String::from_utf8_lossy(&resp.body);
    let cleaned = text.trim_start_matches('\u{feff}').trim();
    serde_json::from_str::<Value>(cleaned).map_err(|e| {
        let excerpt = snippet(cleaned);
        warn!("Undecodable upstream body ({}): {}", e, excerpt);
        GatewayError::parse(format!("Invalid response format: {excerpt}"), Some(excerpt))
    })
}

fn normalize_rows(mission: Mission, payload: Value) -> GatewayResult<Vec<CatalogMatch>> {
    // TAP answers with a bare array; some deployments wrap it
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => ["data", "rows", "results"]
            .iter()
            .find_map(|k| match obj.remove(*k) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .ok_or_else(|| GatewayError::parse("expected a JSON array of catalog rows", None))?,
        other => {
            return Err(GatewayError::parse(
                "expected a JSON array of catalog rows",
                Some(snippet(&other.to_string())),
            ))
        }
    };

    let total = rows.len();
    let matches: Vec<CatalogMatch> = rows
        .iter()
        .filter_map(|row| catalog_match(mission, row))
        .collect();

    if total > 0 && matches.is_empty() {
        return Err(GatewayError::parse(
            format!("none of {total} catalog rows had the expected {mission} columns"),
            None,
        ));
    }
    if matches.len() < total {
        debug!("Skipped {} malformed catalog rows", total - matches.len());
    }

    Ok(matches)
}

fn catalog_match(mission: Mission, row: &Value) -> Option<CatalogMatch> {
    if !row.is_object() {
        return None;
    }

    match mission {
        Mission::Kepler => Some(CatalogMatch {
            planet_name: s_pick(row, &["pl_name"])?,
            star_name: s_pick(row, &["hostname"]).unwrap_or_else(|| "Unknown host".to_string()),
            disposition: Some("CONFIRMED".to_string()),
            radius_earth: n_pick(row, &["pl_rade"]),
            period_days: n_pick(row, &["pl_orbper"]),
            star_teff_k: n_pick(row, &["st_teff"]),
            insolation_earth: n_pick(row, &["pl_insol"]),
            star_count: c_pick(row, &["sy_snum"]),
            planet_count: c_pick(row, &["sy_pnum"]),
        }),
        Mission::Tess => {
            let toi = s_pick(row, &["toi"])?;
            Some(CatalogMatch {
                planet_name: format!("TOI-{toi}"),
                star_name: s_pick(row, &["tid"])
                    .map(|tid| format!("TIC {tid}"))
                    .unwrap_or_else(|| "Unknown host".to_string()),
                disposition: s_pick(row, &["tfopwg_disp"]).map(|d| d.to_ascii_uppercase()),
                radius_earth: n_pick(row, &["pl_rade"]),
                period_days: n_pick(row, &["pl_orbper"]),
                star_teff_k: n_pick(row, &["st_teff"]),
                insolation_earth: n_pick(row, &["pl_insol"]),
                star_count: None,
                planet_count: None,
            })
        }
    }
}

fn disposition_in(candidate: &CatalogMatch, set: &[&str]) -> bool {
    candidate
        .disposition
        .as_deref()
        .map(|d| set.contains(&d))
        .unwrap_or(false)
}

/// Whether a row names the caller's target itself rather than a substring hit
fn is_exact_match(mission: Mission, identifier: &str, candidate: &CatalogMatch) -> bool {
    if candidate.planet_name.eq_ignore_ascii_case(identifier)
        || candidate.star_name.eq_ignore_ascii_case(identifier)
    {
        return true;
    }

    match mission {
        Mission::Kepler => false,
        Mission::Tess => {
            let toi = format!("TOI-{}", strip_toi_prefix(identifier)).to_ascii_uppercase();
            let name = candidate.planet_name.to_ascii_uppercase();
            name == toi || name.strip_prefix(&toi).is_some_and(|rest| rest.starts_with('.'))
        }
    }
}

/// No rows means no planet; a TESS target whose every row is FP/FA is not one either.
///
/// Rows naming the target exactly win over substring hits, so a lookup for
/// "TOI-700" is never answered with TOI-1700.
pub fn analysis_from_matches(query: &TargetQuery, matches: &[CatalogMatch]) -> AnalysisResult {
    let identifier = query.target_identifier.trim();
    if matches.is_empty() {
        return AnalysisResult::not_planet(
            format!("No significant transit signals detected for target ID: {identifier}."),
            None,
        );
    }

    let exact: Vec<&CatalogMatch> = matches
        .iter()
        .filter(|m| is_exact_match(query.mission, identifier, m))
        .collect();
    let candidates = if exact.is_empty() {
        matches.iter().collect()
    } else {
        exact
    };

    let Some(best) = candidates
        .iter()
        .copied()
        .find(|m| !disposition_in(m, REJECTED_DISPOSITIONS))
    else {
        return AnalysisResult::not_planet(
            format!(
                "All {} catalog signals for target ID: {identifier} are flagged as false positives.",
                candidates.len()
            ),
            None,
        );
    };

    let confidence = disposition_in(best, CONFIRMED_DISPOSITIONS).then_some(100.0);
    let details = PlanetDetails {
        star_name: best.star_name.clone(),
        planet_name: best.planet_name.clone(),
        star_type: star_type_for_teff(best.star_teff_k).to_string(),
        planet_type: planet_type_for_radius(best.radius_earth).to_string(),
        habitable_zone_status: habitable_zone_status(best.insolation_earth).to_string(),
    };
    AnalysisResult::planet(details, confidence)
}

/// Check the classifier's `{success, data, error}` wrapper
fn unwrap_envelope(envelope: Value) -> GatewayResult<ClassificationData> {
    if envelope.get("success").and_then(Value::as_bool) != Some(true) {
        let message =
            s_pick(&envelope, &["error"]).unwrap_or_else(|| "Classification failed".to_string());
        warn!("Classifier reported failure: {}", message);
        return Err(GatewayError::upstream(None, message));
    }

    let data = envelope
        .get("data")
        .cloned()
        .ok_or_else(|| GatewayError::parse("classifier response has no data", None))?;
    serde_json::from_value(data)
        .map_err(|e| GatewayError::parse(format!("unexpected classifier data: {e}"), None))
}

fn classification_is_planet(label: &str) -> bool {
    let label = label.to_ascii_uppercase();
    label.contains("PLANET")
        && !label.contains("FALSE")
        && !label.contains("NOT")
        && !label.contains("NON")
}

/// Classifier confidence arrives as a 0..1 fraction; larger values are already percentages
fn confidence_percent(raw: f64) -> f64 {
    if raw <= 1.0 {
        raw * 100.0
    } else {
        raw
    }
}

fn star_label(mission: Mission, star_id: &str) -> String {
    if star_id.chars().all(|c| c.is_ascii_digit()) {
        format!("{} {}", mission.star_id_label(), star_id)
    } else {
        star_id.to_string()
    }
}

fn analysis_from_classification(
    mission: Mission,
    star_id: &str,
    data: ClassificationData,
) -> AnalysisResult {
    let star = star_label(mission, star_id);
    let confidence = data.confidence.map(confidence_percent);
    let transit = TransitSignal {
        classification: data.classification.clone(),
        period_days: data.period,
        depth_ppm: data.depth_ppm,
        significance_sigma: data.significance,
        estimated_radius_earth: data.estimated_planet_radius,
        odd_even_test: data.odd_even_test_status,
        secondary_eclipse: data.secondary_eclipse_status,
    };

    let result = if classification_is_planet(&data.classification) {
        AnalysisResult::planet(
            PlanetDetails {
                planet_name: format!("{star} candidate"),
                star_name: star,
                star_type: star_type_for_teff(None).to_string(),
                planet_type: planet_type_for_radius(data.estimated_planet_radius).to_string(),
                habitable_zone_status: habitable_zone_status(None).to_string(),
            },
            confidence,
        )
    } else {
        AnalysisResult::not_planet(
            format!("Signal for {star} classified as {}.", data.classification),
            confidence,
        )
    };
    result.with_transit(transit)
}
