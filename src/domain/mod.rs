/// Domain models for the application
use crate::errors::GatewayError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Survey whose catalog a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mission {
    #[serde(alias = "kepler", alias = "KEPLER")]
    Kepler,
    #[serde(rename = "TESS", alias = "Tess", alias = "tess")]
    Tess,
}

impl Mission {
    pub const ALL: [Mission; 2] = [Mission::Kepler, Mission::Tess];

    pub fn name(self) -> &'static str {
        match self {
            Mission::Kepler => "Kepler",
            Mission::Tess => "TESS",
        }
    }

    /// Prefix used for the mission's star catalog ids (KIC / TIC)
    pub fn star_id_label(self) -> &'static str {
        match self {
            Mission::Kepler => "KIC",
            Mission::Tess => "TIC",
        }
    }

    /// What `quarter_or_sector` means for this mission
    pub fn range_label(self) -> &'static str {
        match self {
            Mission::Kepler => "quarter",
            Mission::Tess => "sector",
        }
    }

    pub fn example_targets(self) -> &'static [&'static str] {
        match self {
            Mission::Kepler => &["Kepler-186 f", "Kepler-22 b", "Kepler-452 b", "Kepler-10"],
            Mission::Tess => &["TOI-700", "TOI-270", "TOI-1338", "TOI-175"],
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mission {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kepler" => Ok(Mission::Kepler),
            "tess" => Ok(Mission::Tess),
            other => Err(GatewayError::validation(format!(
                "unknown mission '{other}', expected Kepler or TESS"
            ))),
        }
    }
}

/// Caller-supplied lookup parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetQuery {
    pub mission: Mission,
    pub target_identifier: String,
    /// 0 means every quarter/sector
    pub quarter_or_sector: Option<i64>,
}

impl TargetQuery {
    pub fn new(mission: Mission, target_identifier: impl Into<String>) -> Self {
        Self {
            mission,
            target_identifier: target_identifier.into(),
            quarter_or_sector: None,
        }
    }

    pub fn with_quarter_or_sector(mut self, value: i64) -> Self {
        self.quarter_or_sector = Some(value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
}

impl ResponseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
        }
    }
}

/// Rendered catalog query, ready for the gateway to transmit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub mission: Mission,
    /// Raw ADQL text, not yet percent-encoded
    pub query: String,
    /// Path relative to the archive base URL
    pub endpoint: &'static str,
    pub format: ResponseFormat,
}

/// One catalog row, normalized across missions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogMatch {
    pub planet_name: String,
    pub star_name: String,
    pub disposition: Option<String>,
    pub radius_earth: Option<f64>,
    pub period_days: Option<f64>,
    pub star_teff_k: Option<f64>,
    pub insolation_earth: Option<f64>,
    pub star_count: Option<u32>,
    pub planet_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetDetails {
    pub star_name: String,
    pub planet_name: String,
    pub star_type: String,
    pub planet_type: String,
    pub habitable_zone_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDetails {
    Planet(PlanetDetails),
    Message(String),
}

/// Transit fit summary reported by the classification backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitSignal {
    pub classification: String,
    pub period_days: Option<f64>,
    pub depth_ppm: Option<f64>,
    pub significance_sigma: Option<f64>,
    pub estimated_radius_earth: Option<f64>,
    pub odd_even_test: Option<String>,
    pub secondary_eclipse: Option<String>,
}

/// Unified analysis outcome handed to the presentation layer.
///
/// Planet details are present exactly when `is_planet` is true; otherwise the
/// result carries a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    is_planet: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    details: AnalysisDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    transit: Option<TransitSignal>,
}

impl AnalysisResult {
    pub fn planet(details: PlanetDetails, confidence: Option<f64>) -> Self {
        Self {
            is_planet: true,
            confidence: confidence.map(clamp_percent),
            details: AnalysisDetails::Planet(details),
            transit: None,
        }
    }

    pub fn not_planet(message: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            is_planet: false,
            confidence: confidence.map(clamp_percent),
            details: AnalysisDetails::Message(message.into()),
            transit: None,
        }
    }

    pub fn with_transit(mut self, transit: TransitSignal) -> Self {
        self.transit = Some(transit);
        self
    }

    pub fn is_planet(&self) -> bool {
        self.is_planet
    }

    /// Percentage in 0..=100
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn details(&self) -> &AnalysisDetails {
        &self.details
    }

    pub fn planet_details(&self) -> Option<&PlanetDetails> {
        match &self.details {
            AnalysisDetails::Planet(details) => Some(details),
            AnalysisDetails::Message(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.details {
            AnalysisDetails::Planet(_) => None,
            AnalysisDetails::Message(message) => Some(message),
        }
    }

    pub fn transit(&self) -> Option<&TransitSignal> {
        self.transit.as_ref()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Camera framing requested by the 3D view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    System,
    Planet,
}

impl ViewMode {
    /// A planet close-up only makes sense when there is a planet to look at
    pub fn effective_for(self, result: Option<&AnalysisResult>) -> ViewMode {
        match (self, result) {
            (ViewMode::Planet, Some(result)) if result.is_planet() => ViewMode::Planet,
            _ => ViewMode::System,
        }
    }
}

/// Mission listing entry
#[derive(Debug, Serialize)]
pub struct MissionInfo {
    pub id: Mission,
    pub name: &'static str,
    pub star_id_label: &'static str,
    pub range_label: &'static str,
}

impl From<Mission> for MissionInfo {
    fn from(mission: Mission) -> Self {
        Self {
            id: mission,
            name: mission.name(),
            star_id_label: mission.star_id_label(),
            range_label: mission.range_label(),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
