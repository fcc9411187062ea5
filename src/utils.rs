/// Utility functions
use serde_json::Value;

/// Longest body excerpt carried in a parse failure
pub const SNIPPET_CHARS: usize = 100;

/// Extract number from JSON value
pub fn num(v: &Value) -> Option<f64> {
    if let Some(x) = v.as_f64() {
        return Some(x);
    }
    if let Some(s) = v.as_str() {
        return s.trim().parse::<f64>().ok();
    }
    None
}

/// Pick the first numeric value found under any of the keys
pub fn n_pick(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| v.get(*k).and_then(num))
}

/// Pick a non-negative count from JSON by trying multiple keys
pub fn c_pick(v: &Value, keys: &[&str]) -> Option<u32> {
    n_pick(v, keys)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

/// Pick string value from JSON by trying multiple keys
pub fn s_pick(v: &Value, keys: &[&str]) -> Option<String> {
    for k in keys {
        if let Some(x) = v.get(*k) {
            if let Some(s) = x.as_str() {
                if !s.trim().is_empty() {
                    return Some(s.trim().to_string());
                }
            } else if x.is_number() {
                return Some(x.to_string());
            }
        }
    }
    None
}

/// First `SNIPPET_CHARS` characters of a body, on a char boundary
pub fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// Size class from radius in Earth radii
pub fn planet_type_for_radius(radius_earth: Option<f64>) -> &'static str {
    match radius_earth {
        Some(r) if r < 1.25 => "Earth-sized",
        Some(r) if r < 2.0 => "Super-Earth",
        Some(r) if r < 6.0 => "Neptune-like",
        Some(_) => "Gas giant",
        None => "Unknown",
    }
}

/// Spectral class from stellar effective temperature in kelvin
pub fn star_type_for_teff(teff_k: Option<f64>) -> &'static str {
    match teff_k {
        Some(t) if t >= 30_000.0 => "O-type",
        Some(t) if t >= 10_000.0 => "B-type",
        Some(t) if t >= 7_500.0 => "A-type",
        Some(t) if t >= 6_000.0 => "F-type",
        Some(t) if t >= 5_200.0 => "G-type",
        Some(t) if t >= 3_700.0 => "K-type",
        Some(t) if t > 0.0 => "M-type",
        _ => "Unknown",
    }
}

/// Habitable-zone placement from insolation flux relative to Earth
pub fn habitable_zone_status(insolation_earth: Option<f64>) -> &'static str {
    match insolation_earth {
        Some(s) if s > 1.75 => "Too hot (inside inner edge)",
        Some(s) if s >= 0.35 => "Within habitable zone",
        Some(s) if s >= 0.0 => "Too cold (beyond outer edge)",
        _ => "Unknown",
    }
}
