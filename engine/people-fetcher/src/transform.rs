//! Field derivations applied to TMDb person details

use chrono::{Datelike, NaiveDate};

/// Extract the year from a `YYYY-MM-DD` date string.
///
/// Anything that is not exactly four digits, two digits and two digits
/// separated by hyphens, or that is not a real calendar date, yields `None`.
pub fn extract_year(date: Option<&str>) -> Option<i32> {
    let date = date?;
    if !is_iso_date_shape(date) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|d| d.year()).filter(|year| *year >= 1)
}

fn is_iso_date_shape(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Guess a nationality label from a free-text place of birth.
///
/// Takes the last comma-separated segment, trimmed
/// ("London, England, UK" -> "UK"). This is a naive heuristic: no
/// normalization, geocoding, or validation against a country list.
pub fn extract_nationality(place_of_birth: Option<&str>) -> Option<String> {
    let place = place_of_birth.filter(|p| !p.is_empty())?;
    place.rsplit(',').next().map(|segment| segment.trim().to_string())
}

/// Join the image base URL with a profile path, if there is one
pub fn profile_photo_url(image_base_url: &str, profile_path: Option<&str>) -> Option<String> {
    profile_path.filter(|p| !p.is_empty()).map(|path| format!("{image_base_url}{path}"))
}
