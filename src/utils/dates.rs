use crate::utils::error::AppError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use mongodb::bson::Bson;

/// Accepts either an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
/// (dates resolve to midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Validation(format!("Invalid date: {}", raw)))
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 string, the same shape serde writes for `DateTime<Utc>` fields.
/// Used for `$set` documents built by hand.
pub fn to_bson(at: DateTime<Utc>) -> Bson {
    Bson::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn now_bson() -> Bson {
    to_bson(now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_date() {
        assert_eq!(parse_timestamp("2024-01-15").unwrap().timestamp(), 1_705_276_800);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp("2024-01-15T05:30:00+05:30").unwrap().timestamp(),
            1_705_276_800
        );
    }

    #[test]
    fn test_garbage_is_validation_error() {
        assert!(matches!(
            parse_timestamp("next tuesday"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_bson_value_reads_back_as_the_same_instant() {
        let at = parse_timestamp("2025-06-14T09:15:00Z").unwrap();
        let stored = to_bson(at);
        assert_eq!(stored.as_str(), Some("2025-06-14T09:15:00Z"));

        let back: DateTime<Utc> = mongodb::bson::from_bson(stored).unwrap();
        assert_eq!(back, at);
    }
}
