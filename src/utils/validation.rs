use crate::utils::error::AppError;
use mongodb::bson::oid::ObjectId;

/// Returns the trimmed value, or a validation error when it is absent or blank.
pub fn required(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

/// Treats blank strings as absent.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(None, "City").is_err());
        assert!(required(Some("   "), "City").is_err());
        assert_eq!(required(Some(" Pune "), "City").unwrap(), "Pune");
    }

    #[test]
    fn test_required_error_names_field() {
        let err = required(None, "Blood group").unwrap_err();
        assert_eq!(err.message(), "Blood group is required");
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("not-an-id", "campaign ID").is_err());
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "campaign ID").unwrap(), id);
    }
}
