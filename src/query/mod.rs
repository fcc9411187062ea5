/// Catalog query builder
///
/// Turns a [`TargetQuery`] into raw ADQL for the archive's TAP service. The
/// text is returned unencoded; transport encoding belongs to the gateway.
use crate::domain::{ArchiveRequest, Mission, ResponseFormat, TargetQuery};
use crate::errors::{GatewayError, GatewayResult};

/// Synchronous TAP endpoint, relative to the archive base URL
pub const TAP_SYNC_PATH: &str = "TAP/sync";

pub const KEPLER_TABLE: &str = "pscomppars";
pub const KEPLER_COLUMNS: &[&str] = &[
    "pl_name", "hostname", "sy_snum", "sy_pnum", "pl_rade", "pl_orbper", "st_teff", "pl_insol",
];

pub const TESS_TABLE: &str = "toi";
pub const TESS_COLUMNS: &[&str] = &[
    "toi", "tid", "tfopwg_disp", "pl_rade", "pl_orbper", "st_teff", "pl_insol",
];

/// Check the caller's input, returning the trimmed identifier
pub fn validate_target(query: &TargetQuery) -> GatewayResult<&str> {
    let identifier = query.target_identifier.trim();
    if identifier.is_empty() {
        return Err(GatewayError::validation("target identifier must not be empty"));
    }

    if let Some(value) = query.quarter_or_sector {
        if value < 0 {
            return Err(GatewayError::validation(format!(
                "{} must be non-negative, got {}",
                query.mission.range_label(),
                value
            )));
        }
    }

    Ok(identifier)
}

/// Render the archive request for a target lookup
pub fn build_query(query: &TargetQuery) -> GatewayResult<ArchiveRequest> {
    let identifier = validate_target(query)?;

    let text = match query.mission {
        Mission::Kepler => {
            let pattern = like_pattern(identifier);
            format!(
                "SELECT {} FROM {} WHERE UPPER(pl_name) LIKE '{}' OR UPPER(hostname) LIKE '{}'",
                KEPLER_COLUMNS.join(", "),
                KEPLER_TABLE,
                pattern,
                pattern
            )
        }
        Mission::Tess => {
            let pattern = like_pattern(strip_toi_prefix(identifier));
            format!(
                "SELECT {} FROM {} WHERE UPPER(toi) LIKE '{}'",
                TESS_COLUMNS.join(", "),
                TESS_TABLE,
                pattern
            )
        }
    };

    Ok(ArchiveRequest {
        mission: query.mission,
        query: text,
        endpoint: TAP_SYNC_PATH,
        format: ResponseFormat::Json,
    })
}

/// Upper-cased substring pattern with quotes doubled for ADQL literals.
///
/// `%` and `_` typed by the caller stay wildcards; ADQL has no portable
/// ESCAPE clause, and exact rows are ranked first by the gateway anyway.
fn like_pattern(identifier: &str) -> String {
    format!("%{}%", identifier.to_uppercase().replace('\'', "''"))
}

/// The TOI column is numeric, so "TOI-700" has to be matched as "700"
pub fn strip_toi_prefix(identifier: &str) -> &str {
    let bytes = identifier.as_bytes();
    if bytes.len() > 3 && bytes[..3].eq_ignore_ascii_case(b"TOI") {
        let rest = identifier[3..].trim_start_matches(['-', ' ', '_']);
        if !rest.is_empty() {
            return rest;
        }
    }
    identifier
}
