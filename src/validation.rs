use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 120;
const MAX_PHONE_LEN: usize = 32;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

/// Trimmed and lower-cased; every store lookup and write goes through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if email.len() > 254 || !EMAIL_RE.is_match(&email) {
        return Err(AppError::Validation("email is not a valid address".to_string()));
    }
    Ok(email)
}

pub fn name(field: &str, raw: &str) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

pub fn password(raw: &str) -> Result<(), AppError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Blank phones are stored as absent.
pub fn phone(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.len() > MAX_PHONE_LEN
        || !value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(AppError::Validation("phone is not a valid number".to_string()));
    }
    Ok(Some(value.to_string()))
}

pub fn description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// For update bodies: an absent key stays `None`, an explicit `null`
/// becomes `Some(None)`. Use with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(email("  Ana.Perez@Tours.Test ").unwrap(), "ana.perez@tours.test");
    }

    #[test]
    fn email_rejects_bad_shapes() {
        for bad in ["", "   ", "ana", "ana@", "@tours.test", "ana@tours", "a b@tours.test"] {
            assert!(email(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn name_is_trimmed_and_required() {
        assert_eq!(name("name", "  Ana ").unwrap(), "Ana");
        assert!(name("name", "   ").is_err());
        assert!(name("name", &"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn password_length() {
        assert!(password("1234567").is_err());
        assert!(password("12345678").is_ok());
    }

    #[test]
    fn phone_rules() {
        assert_eq!(phone(None).unwrap(), None);
        assert_eq!(phone(Some("  ")).unwrap(), None);
        assert_eq!(
            phone(Some("+57 (300) 123-4567")).unwrap().as_deref(),
            Some("+57 (300) 123-4567")
        );
        assert!(phone(Some("call me")).is_err());
    }

    #[test]
    fn nullable_distinguishes_absent_from_null() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, deserialize_with = "nullable")]
            phone: Option<Option<String>>,
        }

        let absent: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        let set: Body = serde_json::from_str(r#"{"phone":"123"}"#).unwrap();

        assert_eq!(absent.phone, None);
        assert_eq!(null.phone, Some(None));
        assert_eq!(set.phone, Some(Some("123".to_string())));
    }
}
