//! Typed value comparison used by the matcher.
//!
//! Every function returns `None` for input it cannot interpret; callers
//! treat that as "does not match".

use crate::model::ontology::{AttributeType, OntologyAttribute};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Orders two raw values according to an attribute's type.
///
/// Unknown attributes compare as numbers.
pub fn compare_values(
    attribute: Option<&OntologyAttribute>,
    left: &str,
    right: &str,
) -> Option<Ordering> {
    let (left, right) = (left.trim(), right.trim());
    let Some(attribute) = attribute else {
        return compare_numbers(left, right);
    };
    match attribute.kind {
        AttributeType::Number => compare_numbers(left, right),
        AttributeType::Date => Some(parse_date(left)?.cmp(&parse_date(right)?)),
        AttributeType::Datetime => Some(parse_datetime(left)?.cmp(&parse_datetime(right)?)),
        AttributeType::Enum => match &attribute.options {
            Some(options) => {
                let rank = |value: &str| options.iter().position(|option| option == value);
                Some(rank(left)?.cmp(&rank(right)?))
            }
            None => Some(left.cmp(right)),
        },
        AttributeType::String => Some(left.cmp(right)),
        AttributeType::Geo => None,
    }
}

fn compare_numbers(left: &str, right: &str) -> Option<Ordering> {
    let left: f64 = left.parse().ok()?;
    let right: f64 = right.parse().ok()?;
    left.partial_cmp(&right)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` local form, or a bare date at midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| parse_date(value)?.and_hms_opt(0, 0, 0))
}

/// `lat,lng` in degrees.
pub fn parse_geo(value: &str) -> Option<(f64, f64)> {
    let (lat, lng) = value.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some((lat, lng))
}

/// Great-circle distance in kilometres.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let a = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lng2 - lng1) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
