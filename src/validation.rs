use crate::error::ApiError;
use crate::models::{ClassLevel, FilterState};
use crate::profile::ProfileError;

pub const MAX_NAME_LEN: usize = 50;

/// Returns the trimmed name.
pub fn validate_name(value: &str) -> Result<String, ProfileError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ProfileError::NameTooLong(MAX_NAME_LEN));
    }
    Ok(trimmed.to_string())
}

pub fn validate_failure_rate(value: f64) -> Result<f64, String> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("booking_failure_rate must be between 0 and 1, got {value}"))
    }
}

/// Builds a filter from `levels=Beginner,Advanced` and `instructor=...`.
pub fn parse_filter(levels: Option<&str>, instructor: Option<&str>) -> Result<FilterState, ApiError> {
    let levels = levels
        .unwrap_or("")
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.parse::<ClassLevel>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let mut filter = FilterState::with_levels(levels);
    filter.selected_instructor = instructor
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Asha Patel ").unwrap(), "Asha Patel");
        assert!(matches!(validate_name("   "), Err(ProfileError::EmptyName)));
        assert!(matches!(validate_name(""), Err(ProfileError::EmptyName)));
        assert!(validate_name(&"a".repeat(50)).is_ok());
        assert!(matches!(
            validate_name(&"a".repeat(51)),
            Err(ProfileError::NameTooLong(50))
        ));
    }

    #[test]
    fn test_validate_failure_rate() {
        assert!(validate_failure_rate(0.0).is_ok());
        assert!(validate_failure_rate(0.15).is_ok());
        assert!(validate_failure_rate(1.0).is_ok());
        assert!(validate_failure_rate(-0.1).is_err());
        assert!(validate_failure_rate(1.5).is_err());
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter(Some("beginner, Advanced,Beginner"), Some(" Ravi Kumar ")).unwrap();
        assert_eq!(
            filter.selected_levels,
            [ClassLevel::Beginner, ClassLevel::Advanced]
        );
        assert_eq!(filter.selected_instructor.as_deref(), Some("Ravi Kumar"));

        let empty = parse_filter(None, Some("")).unwrap();
        assert_eq!(empty, FilterState::default());

        assert!(matches!(
            parse_filter(Some("Expert"), None),
            Err(ApiError::BadRequest(_))
        ));
    }
}
