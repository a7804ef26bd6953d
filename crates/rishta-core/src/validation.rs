//! Field-level form rules.
//!
//! Each `check_*` function returns the message to show next to the field,
//! or `None` when the value is acceptable. Errors are keyed by the field's
//! wire name so a form can place them inline.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use chrono::{Duration, NaiveDate};
use regex::Regex;

/// Indian mobile numbers: ten digits, leading 6–9.
static PHONE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("static regex"));

static OTP_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\d{6}$").expect("static regex"));

static EMAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

pub const OTP_LENGTH: usize = 6;
pub const MIN_AGE_YEARS: i64 = 18;

// ─── Error collection ────────────────────────────────────────────────────────

/// Per-field messages. Only the first message recorded for a field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
  fields: BTreeMap<&'static str, String>,
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, msg) in &self.fields {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{field}: {msg}")?;
      first = false;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    self.fields.entry(field).or_insert_with(|| message.into());
  }

  /// Record `message` for `field` if a check produced one.
  pub fn check(&mut self, field: &'static str, message: Option<&str>) {
    if let Some(m) = message {
      self.add(field, m);
    }
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.fields.get(field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }

  pub fn len(&self) -> usize { self.fields.len() }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
    self.fields.iter().map(|(k, v)| (*k, v.as_str()))
  }

  /// `Ok(())` when nothing was recorded.
  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

// ─── Field checks ────────────────────────────────────────────────────────────

pub fn check_phone_number(value: &str) -> Option<&'static str> {
  let value = value.trim();
  if value.is_empty() {
    Some("Phone number is required")
  } else if !PHONE_RE.is_match(value) {
    Some("Please enter a valid Indian phone number")
  } else {
    None
  }
}

pub fn check_otp(value: &str) -> Option<&'static str> {
  if value.is_empty() {
    Some("OTP is required")
  } else if value.chars().count() != OTP_LENGTH {
    Some("OTP must be 6 digits")
  } else if !OTP_RE.is_match(value) {
    Some("OTP must contain only numbers")
  } else {
    None
  }
}

pub fn check_first_name(value: &str) -> Option<&'static str> {
  match value.trim().chars().count() {
    0 => Some("First name is required"),
    1 => Some("First name must be at least 2 characters"),
    _ => None,
  }
}

pub fn check_last_name(value: &str) -> Option<&'static str> {
  match value.trim().chars().count() {
    0 => Some("Last name is required"),
    1 => Some("Last name must be at least 2 characters"),
    _ => None,
  }
}

/// Email is optional; an empty value passes.
pub fn check_email(value: Option<&str>) -> Option<&'static str> {
  match value.map(str::trim) {
    Some(v) if !v.is_empty() && !EMAIL_RE.is_match(v) => {
      Some("Please enter a valid email")
    }
    _ => None,
  }
}

/// The user must have been born at least 18 × 365 days before `today`.
pub fn check_date_of_birth(
  value: Option<NaiveDate>,
  today: NaiveDate,
) -> Option<&'static str> {
  let Some(dob) = value else {
    return Some("Date of birth is required");
  };
  let latest = today - Duration::days(MIN_AGE_YEARS * 365);
  (dob > latest).then_some("You must be at least 18 years old")
}

pub fn check_required(value: &str, message: &'static str) -> Option<&'static str> {
  value.trim().is_empty().then_some(message)
}

// ─── Form validators ─────────────────────────────────────────────────────────

pub fn validate_phone_number(value: &str) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();
  errors.check("phoneNumber", check_phone_number(value));
  errors.into_result()
}

pub fn validate_otp(value: &str) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();
  errors.check("otp", check_otp(value));
  errors.into_result()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phone_numbers() {
    assert_eq!(check_phone_number("9876543210"), None);
    assert_eq!(check_phone_number(" 6000000000 "), None);
    assert_eq!(check_phone_number(""), Some("Phone number is required"));
    assert_eq!(
      check_phone_number("5876543210"),
      Some("Please enter a valid Indian phone number")
    );
    assert!(check_phone_number("987654321").is_some());
    assert!(check_phone_number("+919876543210").is_some());
  }

  #[test]
  fn otps() {
    assert_eq!(check_otp("123456"), None);
    assert_eq!(check_otp(""), Some("OTP is required"));
    assert_eq!(check_otp("12345"), Some("OTP must be 6 digits"));
    assert_eq!(check_otp("12a456"), Some("OTP must contain only numbers"));
  }

  #[test]
  fn names_need_two_characters() {
    assert!(check_first_name("A").is_some());
    assert!(check_first_name("  ").is_some());
    assert_eq!(check_last_name("Oz"), None);
  }

  #[test]
  fn email_is_optional_but_checked() {
    assert_eq!(check_email(None), None);
    assert_eq!(check_email(Some("")), None);
    assert_eq!(check_email(Some("asha@example.com")), None);
    assert!(check_email(Some("asha@")).is_some());
  }

  #[test]
  fn date_of_birth_enforces_minimum_age() {
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let old_enough = today - Duration::days(18 * 365);
    let too_young = old_enough + Duration::days(1);
    assert_eq!(check_date_of_birth(Some(old_enough), today), None);
    assert!(check_date_of_birth(Some(too_young), today).is_some());
    assert_eq!(check_date_of_birth(None, today), Some("Date of birth is required"));
  }

  #[test]
  fn errors_keep_first_message_per_field() {
    let mut errors = ValidationErrors::default();
    errors.add("otp", "first");
    errors.add("otp", "second");
    assert_eq!(errors.get("otp"), Some("first"));
    assert_eq!(errors.len(), 1);
    assert!(validate_otp("12").is_err());
    assert!(validate_phone_number("9876543210").is_ok());
  }
}
