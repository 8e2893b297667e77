//! Row models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One (date, precipitation) row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrecipitationRecord {
    pub date: String,
    /// Missing readings are stored as NULL
    pub prcp: Option<f64>,
}

/// One (station id, name) row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StationRecord {
    pub station: String,
    pub name: String,
}

/// One (date, temperature observation) row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TobsRecord {
    pub date: String,
    pub tobs: Option<f64>,
}

/// Temperature aggregates for a single date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailyTemperatureStats {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}

/// Inclusive date filter, compared as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

impl DateRange {
    /// Open-ended range starting at `start`
    pub fn starting(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }

    /// Closed range `[start, end]`
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    /// True if `date` falls inside the range
    pub fn contains(&self, date: &str) -> bool {
        date >= self.start.as_str() && self.end.as_deref().map_or(true, |end| date <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_field_names() {
        let stats = DailyTemperatureStats {
            date: "2017-08-23".to_string(),
            tmin: Some(76.0),
            tavg: Some(76.0),
            tmax: Some(76.0),
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"Date":"2017-08-23","TMIN":76.0,"TAVG":76.0,"TMAX":76.0}"#
        );
    }

    #[test]
    fn test_range_contains() {
        let open = DateRange::starting("2017-01-01");
        assert!(open.contains("2017-01-01"));
        assert!(open.contains("2018-05-05"));
        assert!(!open.contains("2016-12-31"));

        let closed = DateRange::between("2017-01-01", "2017-01-31");
        assert!(closed.contains("2017-01-31"));
        assert!(!closed.contains("2017-02-01"));

        let inverted = DateRange::between("2017-02-01", "2017-01-01");
        assert!(!inverted.contains("2017-01-15"));
    }
}
