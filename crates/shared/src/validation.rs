//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// ISO 3166-1 alpha-2 country code, either case.
    static ref COUNTRY_CODE_REGEX: regex::Regex = regex::Regex::new(r"^[A-Za-z]{2}$").unwrap();
    /// Ad slot names: lowercase words joined by `_` or `-`.
    static ref SLOT_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(?:[_-][a-z0-9]+)*$").unwrap();
    /// 24-hour time of day, `H:MM` or `HH:MM`, optional `:SS`.
    static ref TIME_OF_DAY_REGEX: regex::Regex =
        regex::Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)(?::[0-5]\d)?$").unwrap();
}

/// Maximum length of an ad slot name.
const MAX_SLOT_NAME_LENGTH: usize = 64;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a two-letter ISO country code.
pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    if COUNTRY_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("country_code");
        err.message = Some("Country must be a two-letter ISO code".into());
        Err(err)
    }
}

/// Validates an ad slot name such as `home_banner` or `search-carousel`.
pub fn validate_slot_name(name: &str) -> Result<(), ValidationError> {
    if name.len() <= MAX_SLOT_NAME_LENGTH && SLOT_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slot_name");
        err.message = Some("Slot name must be lowercase letters, digits, '_' or '-'".into());
        Err(err)
    }
}

/// Returns true when `value` is a 24-hour `HH:MM` time of day.
pub fn is_time_of_day(value: &str) -> bool {
    TIME_OF_DAY_REGEX.is_match(value.trim())
}

/// Validates a 24-hour `HH:MM` time of day.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    if is_time_of_day(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("time_of_day");
        err.message = Some("Time must use the 24-hour HH:MM format".into());
        Err(err)
    }
}
