//! Filters for the profile search screen.
//!
//! Age bounds are typed in as text, so they are only parsed when the
//! filters are turned into a query.

use crate::{
  catalog::height_rank,
  profile::{Bounds, LocationPreference, UserPreferences},
  validation::ValidationErrors,
};

pub const DEFAULT_AGE_MIN: &str = "18";
pub const DEFAULT_AGE_MAX: &str = "35";
pub const DEFAULT_HEIGHT_MIN: &str = "5'0\"";
pub const DEFAULT_HEIGHT_MAX: &str = "6'0\"";
/// Kilometres around the chosen cities and states.
pub const DEFAULT_RADIUS: u32 = 100;

/// The multi-select filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  Religions,
  Educations,
  Professions,
  MaritalStatuses,
  Cities,
  States,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
  pub age_min:          String,
  pub age_max:          String,
  pub height_min:       String,
  pub height_max:       String,
  pub religions:        Vec<String>,
  pub educations:       Vec<String>,
  pub professions:      Vec<String>,
  pub marital_statuses: Vec<String>,
  pub cities:           Vec<String>,
  pub states:           Vec<String>,
  pub radius:           u32,
}

impl Default for SearchFilters {
  fn default() -> Self {
    Self {
      age_min:          DEFAULT_AGE_MIN.to_owned(),
      age_max:          DEFAULT_AGE_MAX.to_owned(),
      height_min:       DEFAULT_HEIGHT_MIN.to_owned(),
      height_max:       DEFAULT_HEIGHT_MAX.to_owned(),
      religions:        Vec::new(),
      educations:       Vec::new(),
      professions:      Vec::new(),
      marital_statuses: Vec::new(),
      cities:           Vec::new(),
      states:           Vec::new(),
      radius:           DEFAULT_RADIUS,
    }
  }
}

impl SearchFilters {
  fn list_mut(&mut self, field: FilterField) -> &mut Vec<String> {
    match field {
      FilterField::Religions => &mut self.religions,
      FilterField::Educations => &mut self.educations,
      FilterField::Professions => &mut self.professions,
      FilterField::MaritalStatuses => &mut self.marital_statuses,
      FilterField::Cities => &mut self.cities,
      FilterField::States => &mut self.states,
    }
  }

  /// Select `value` in `field` if it was not selected, deselect it otherwise.
  pub fn toggle(&mut self, field: FilterField, value: &str) {
    let list = self.list_mut(field);
    if let Some(pos) = list.iter().position(|v| v == value) {
      list.remove(pos);
    } else {
      list.push(value.to_owned());
    }
  }

  pub fn reset(&mut self) { *self = Self::default(); }

  /// Parse and check the filters, producing the preference shape the
  /// candidate endpoint accepts.
  pub fn to_preferences(&self) -> Result<UserPreferences, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let age_min = self.age_min.trim().parse::<u32>();
    let age_max = self.age_max.trim().parse::<u32>();
    if age_min.is_err() {
      errors.add("ageMin", "Minimum age must be a number");
    }
    if age_max.is_err() {
      errors.add("ageMax", "Maximum age must be a number");
    }
    if let (Ok(min), Ok(max)) = (&age_min, &age_max)
      && min > max
    {
      errors.add("ageMax", "Maximum age must not be below minimum age");
    }

    let height_min = height_rank(&self.height_min);
    let height_max = height_rank(&self.height_max);
    if height_min.is_none() {
      errors.add("heightMin", "Choose a minimum height from the list");
    }
    if height_max.is_none() {
      errors.add("heightMax", "Choose a maximum height from the list");
    }
    if let (Some(min), Some(max)) = (height_min, height_max)
      && min > max
    {
      errors.add("heightMax", "Maximum height must not be below minimum height");
    }

    errors.into_result()?;

    Ok(UserPreferences {
      age_range: Bounds {
        min: age_min.unwrap_or_default(),
        max: age_max.unwrap_or_default(),
      },
      height_range: Bounds {
        min: self.height_min.trim().to_owned(),
        max: self.height_max.trim().to_owned(),
      },
      religions: self.religions.clone(),
      educations: self.educations.clone(),
      professions: self.professions.clone(),
      marital_statuses: self.marital_statuses.clone(),
      locations: LocationPreference {
        cities: self.cities.clone(),
        states: self.states.clone(),
        radius: self.radius,
      },
      ..UserPreferences::default()
    })
  }
}

/// Flatten preferences into query-string pairs for the candidate endpoint.
/// Bounds become `ageMin`/`ageMax`/`heightMin`/`heightMax`; lists are
/// comma-joined and omitted when empty.
pub fn preference_query(prefs: &UserPreferences) -> Vec<(&'static str, String)> {
  let mut query = vec![
    ("ageMin", prefs.age_range.min.to_string()),
    ("ageMax", prefs.age_range.max.to_string()),
  ];
  if !prefs.height_range.min.is_empty() {
    query.push(("heightMin", prefs.height_range.min.clone()));
  }
  if !prefs.height_range.max.is_empty() {
    query.push(("heightMax", prefs.height_range.max.clone()));
  }

  let lists: [(&'static str, &Vec<String>); 7] = [
    ("religions", &prefs.religions),
    ("castes", &prefs.castes),
    ("educations", &prefs.educations),
    ("professions", &prefs.professions),
    ("maritalStatuses", &prefs.marital_statuses),
    ("cities", &prefs.locations.cities),
    ("states", &prefs.locations.states),
  ];
  for (key, values) in lists {
    if !values.is_empty() {
      query.push((key, values.join(",")));
    }
  }

  if let Some(income) = &prefs.income_range {
    query.push(("incomeMin", income.min.clone()));
    query.push(("incomeMax", income.max.clone()));
  }
  if prefs.locations.radius > 0 {
    query.push(("radius", prefs.locations.radius.to_string()));
  }
  query
}
