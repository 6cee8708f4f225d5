//! Submission validation
//!
//! A submission is the business idea and location a user wants scored.
//! Every field is checked so that all problems are reported at once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Submission exactly as received from a form or JSON body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub business: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
}

/// A validated submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub business: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Submission {
    /// Validate a raw submission, collecting every field error
    pub fn validate(raw: &RawSubmission) -> Result<Self> {
        let mut errors = Vec::new();

        let business = required_text("business", raw.business.as_deref(), &mut errors);
        let location = required_text("location", raw.location.as_deref(), &mut errors);
        let latitude = coordinate("lat", raw.lat.as_deref(), 90.0, &mut errors);
        let longitude = coordinate("lon", raw.lon.as_deref(), 180.0, &mut errors);

        match (business, location, latitude, longitude) {
            (Some(business), Some(location), Some(latitude), Some(longitude))
                if errors.is_empty() =>
            {
                Ok(Self {
                    business,
                    location,
                    latitude,
                    longitude,
                })
            }
            _ => Err(Error::Validation(errors)),
        }
    }

    /// Coordinates formatted the way prompts embed them
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}

/// `lat,lon` pair as it appears inside an Overpass `around` filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

fn required_text(field: &str, value: Option<&str>, errors: &mut Vec<String>) -> Option<String> {
    match value {
        None => {
            errors.push(format!("\"{}\" is required", field));
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.push(format!("\"{}\" is not allowed to be empty", field));
            None
        }
        Some(v) => Some(v.trim().to_string()),
    }
}

fn coordinate(field: &str, value: Option<&str>, limit: f64, errors: &mut Vec<String>) -> Option<f64> {
    let text = required_text(field, value, errors)?;
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && (-limit..=limit).contains(&v) => Some(v),
        _ => {
            errors.push(format!(
                "\"{}\" must be a number between -{} and {}",
                field, limit, limit
            ));
            None
        }
    }
}
