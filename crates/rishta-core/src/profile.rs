//! User profiles, partner preferences and privacy settings.
//!
//! Field names on the wire are camelCase. A freshly verified account has
//! almost nothing filled in, so every field tolerates being absent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "male",
      Self::Female => "female",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "male" => Some(Self::Male),
      "female" => Some(Self::Female),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
  NeverMarried,
  Divorced,
  Widowed,
}

impl MaritalStatus {
  pub const ALL: [Self; 3] = [Self::NeverMarried, Self::Divorced, Self::Widowed];

  /// The wire discriminant.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NeverMarried => "never_married",
      Self::Divorced => "divorced",
      Self::Widowed => "widowed",
    }
  }

  /// Human-readable label used in pickers.
  pub fn label(self) -> &'static str {
    match self {
      Self::NeverMarried => "Never Married",
      Self::Divorced => "Divorced",
      Self::Widowed => "Widowed",
    }
  }

  /// Accepts either the wire discriminant or the display label.
  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::ALL
      .into_iter()
      .find(|m| m.as_str() == s || m.label().eq_ignore_ascii_case(s))
  }
}

// ─── Preferences ─────────────────────────────────────────────────────────────

/// An inclusive `[min, max]` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds<T> {
  pub min: T,
  pub max: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationPreference {
  pub cities: Vec<String>,
  pub states: Vec<String>,
  /// Search radius in kilometres.
  pub radius: u32,
}

/// What a user is looking for in a partner. Also used as the filter shape
/// for candidate queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
  pub age_range:        Bounds<u32>,
  pub height_range:     Bounds<String>,
  pub religions:        Vec<String>,
  pub castes:           Vec<String>,
  pub educations:       Vec<String>,
  pub professions:      Vec<String>,
  pub income_range:     Option<Bounds<String>>,
  pub marital_statuses: Vec<String>,
  pub locations:        LocationPreference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacySettings {
  pub show_photos:       bool,
  pub show_contact_info: bool,
  pub show_last_active:  bool,
  pub blocked_users:     Vec<UserId>,
}

impl Default for PrivacySettings {
  fn default() -> Self {
    Self {
      show_photos:       true,
      show_contact_info: false,
      show_last_active:  true,
      blocked_users:     Vec::new(),
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A user profile as returned by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
  pub id:              UserId,
  pub phone_number:    String,
  pub first_name:      String,
  pub last_name:       String,
  pub email:           Option<String>,
  #[serde(deserialize_with = "lenient_date::deserialize")]
  pub date_of_birth:   Option<NaiveDate>,
  pub gender:          Option<Gender>,
  pub religion:        String,
  pub caste:           String,
  pub sub_caste:       Option<String>,
  pub education:       String,
  pub profession:      String,
  pub income:          Option<String>,
  /// Free-form height label, e.g. `5'7"`.
  pub height:          String,
  pub marital_status:  Option<MaritalStatus>,
  pub city:            String,
  pub state:           String,
  pub country:         String,
  pub photos:          Vec<String>,
  pub profile_picture: Option<String>,
  pub bio:             Option<String>,
  pub interests:       Vec<String>,
  pub verified:        bool,
  pub premium:         bool,
  pub created_at:      Option<DateTime<Utc>>,
  pub updated_at:      Option<DateTime<Utc>>,
  pub last_active:     Option<DateTime<Utc>>,
  pub preferences:     UserPreferences,
  pub privacy:         PrivacySettings,
}

impl User {
  /// "First Last", trimmed; falls back to the phone number for accounts that
  /// have not completed onboarding.
  pub fn display_name(&self) -> String {
    let full = format!("{} {}", self.first_name, self.last_name);
    let full = full.trim();
    if full.is_empty() {
      self.phone_number.clone()
    } else {
      full.to_owned()
    }
  }

  /// Age in whole years on `today`, if a date of birth is known.
  pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
    self.date_of_birth.and_then(|dob| today.years_since(dob))
  }

  /// An account is onboarded once the profile form has been submitted; the
  /// first name is the marker the service relies on.
  pub fn is_onboarded(&self) -> bool { !self.first_name.trim().is_empty() }
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// Body of a profile update. Absent fields are left untouched by the
/// service and are not serialised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_of_birth:   Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender:          Option<Gender>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub religion:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub caste:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sub_caste:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub education:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub profession:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub income:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub height:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub marital_status:  Option<MaritalStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:            Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub photos:          Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub profile_picture: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bio:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interests:       Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub preferences:     Option<UserPreferences>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub privacy:         Option<PrivacySettings>,
}

// ─── Date handling ───────────────────────────────────────────────────────────

/// Dates of birth arrive either as `YYYY-MM-DD` or as a full RFC 3339
/// timestamp, depending on which form wrote them.
mod lenient_date {
  use chrono::{DateTime, NaiveDate};
  use serde::{Deserialize, Deserializer, de::Error as _};

  pub fn deserialize<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let Some(raw) = Option::<String>::deserialize(de)? else {
      return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
      return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
      return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
      .map(|dt| Some(dt.date_naive()))
      .map_err(|e| D::Error::custom(format!("invalid date {raw:?}: {e}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sparse_profile_deserialises() {
    let user: User =
      serde_json::from_str(r#"{"id":"u1","phoneNumber":"9876543210"}"#).unwrap();
    assert_eq!(user.id.as_str(), "u1");
    assert!(!user.is_onboarded());
    assert_eq!(user.display_name(), "9876543210");
    assert!(user.privacy.show_photos);
  }

  #[test]
  fn date_of_birth_accepts_date_and_timestamp() {
    let a: User = serde_json::from_str(r#"{"dateOfBirth":"1995-04-12"}"#).unwrap();
    let b: User =
      serde_json::from_str(r#"{"dateOfBirth":"1995-04-12T00:00:00.000Z"}"#).unwrap();
    let expected = NaiveDate::from_ymd_opt(1995, 4, 12);
    assert_eq!(a.date_of_birth, expected);
    assert_eq!(b.date_of_birth, expected);
  }

  #[test]
  fn age_counts_completed_years() {
    let user = User {
      date_of_birth: NaiveDate::from_ymd_opt(1995, 4, 12),
      ..User::default()
    };
    let before = NaiveDate::from_ymd_opt(2025, 4, 11).unwrap();
    let on = NaiveDate::from_ymd_opt(2025, 4, 12).unwrap();
    assert_eq!(user.age_on(before), Some(29));
    assert_eq!(user.age_on(on), Some(30));
  }

  #[test]
  fn marital_status_parses_label_or_discriminant() {
    assert_eq!(MaritalStatus::parse("never_married"), Some(MaritalStatus::NeverMarried));
    assert_eq!(MaritalStatus::parse("Widowed"), Some(MaritalStatus::Widowed));
    assert_eq!(MaritalStatus::parse("single"), None);
  }

  #[test]
  fn profile_update_omits_absent_fields() {
    let update = ProfileUpdate {
      first_name: Some("Asha".into()),
      marital_status: Some(MaritalStatus::NeverMarried),
      ..ProfileUpdate::default()
    };
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "firstName": "Asha", "maritalStatus": "never_married" })
    );
  }
}
