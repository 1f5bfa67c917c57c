//! Local input checks run before any network call.
//!
//! Phone numbers are `0` followed by nine ASCII digits. Login only needs the
//! phone shape and a password of at least eight characters; registration
//! also checks the full name and password composition.

use crate::net::ApiError;

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;
pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 100;

const COMMON_PASSWORDS: [&str; 4] = ["password", "12345678", "qwerty", "abc123"];

/// Validated registration fields, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub referral_code: Option<String>,
}

/// Strip everything but digits, undoing `0XXX-XXX-XXX` style formatting.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.starts_with('0') && phone.bytes().all(|b| b.is_ascii_digit())
}

/// # Errors
///
/// Returns [`ApiError::Validation`] when `phone` is empty or not `0` + 9 digits.
pub fn validate_phone(phone: &str) -> Result<(), ApiError> {
    if phone.is_empty() {
        return Err(invalid("Please enter your phone number"));
    }
    if !is_valid_phone(phone) {
        return Err(invalid("Please enter a valid phone number (10 digits starting with 0)"));
    }
    Ok(())
}

/// Length-only check used at login.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when `password` is empty or too short.
pub fn validate_password_length(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(invalid("Please enter a password"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(invalid("Password must be at least 8 characters long"));
    }
    Ok(())
}

/// Full composition check used at registration.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] naming the first rule `password` breaks,
/// checked in order: length, letter, digit, common list.
pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    validate_password_length(password)?;
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(invalid("Password is too long (maximum 128 characters)"));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("Password must contain at least one letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("Password must contain at least one number"));
    }
    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(invalid("This password is too common. Please choose a stronger password"));
    }
    Ok(())
}

/// Returns the trimmed name.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for short, long, or non-letter names.
pub fn validate_full_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars < MIN_NAME_CHARS {
        return Err(invalid("Please enter your full name (at least 2 characters)"));
    }
    if chars > MAX_NAME_CHARS {
        return Err(invalid("Name is too long (maximum 100 characters)"));
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '\'' || c == '-') {
        return Err(invalid("Name can only contain letters, spaces, hyphens and apostrophes"));
    }
    Ok(name.to_owned())
}

/// Check and normalize every registration field.
///
/// # Errors
///
/// Returns the first [`ApiError::Validation`] in form order: name, phone,
/// password.
pub fn validate_registration(
    full_name: &str,
    phone: &str,
    password: &str,
    referral_code: Option<&str>,
) -> Result<Registration, ApiError> {
    let full_name = validate_full_name(full_name)?;
    let phone = normalize_phone(phone);
    validate_phone(&phone)?;
    validate_new_password(password)?;
    let referral_code = referral_code.map(str::trim).filter(|c| !c.is_empty()).map(str::to_owned);
    Ok(Registration { full_name, phone, password: password.to_owned(), referral_code })
}

/// Referral code from a registration link query (`?ref=` or `?referral=`).
#[must_use]
pub fn referral_from_query(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pick = |key: &str| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_owned())
    };
    pick("ref").or_else(|| pick("referral"))
}

/// `0244***` style rendering for logs.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let prefix: String = phone.chars().take(4).collect();
    format!("{prefix}***")
}

fn invalid(message: &str) -> ApiError {
    ApiError::Validation(message.to_owned())
}

// =============================================================================
// STRENGTH METER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    Weak,
    Medium,
    Good,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0..=100.
    pub score: u8,
    /// `None` for an empty password.
    pub label: Option<StrengthLabel>,
    pub feedback: Vec<&'static str>,
}

#[must_use]
pub fn password_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength { score: 0, label: None, feedback: Vec::new() };
    }

    let mut score: u32 = 0;
    let mut feedback = Vec::new();
    let mut award = |met: bool, points: u32, hint: Option<&'static str>| {
        if met {
            score += points;
        } else if let Some(hint) = hint {
            feedback.push(hint);
        }
    };

    let chars = password.chars().count();
    award(chars >= MIN_PASSWORD_CHARS, 20, Some("Use at least 8 characters"));
    award(chars >= 12, 10, None);
    award(password.chars().any(|c| c.is_ascii_uppercase()), 20, Some("Add uppercase letters"));
    award(password.chars().any(|c| c.is_ascii_lowercase()), 20, Some("Add lowercase letters"));
    award(password.chars().any(|c| c.is_ascii_digit()), 20, Some("Add numbers"));
    award(
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
        20,
        Some("Add special characters (!@#$%^&*)"),
    );
    let unique = password.chars().collect::<std::collections::HashSet<_>>().len();
    award(unique > 8, 10, None);

    let score = u8::try_from(score.min(100)).unwrap_or(100);
    let label = match score {
        0..=39 => StrengthLabel::Weak,
        40..=69 => StrengthLabel::Medium,
        70..=89 => StrengthLabel::Good,
        _ => StrengthLabel::Strong,
    };
    PasswordStrength { score, label: Some(label), feedback }
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
