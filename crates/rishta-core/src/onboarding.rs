//! The four-step profile wizard shown after first login.

use chrono::NaiveDate;

use crate::{
  catalog::DEFAULT_COUNTRY,
  profile::{Gender, MaritalStatus, ProfileUpdate},
  validation::{
    ValidationErrors, check_date_of_birth, check_email, check_first_name,
    check_last_name, check_required,
  },
};

pub const TOTAL_STEPS: u8 = 4;

// ─── Steps ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
  Personal,
  Basic,
  Social,
  Professional,
}

impl Step {
  pub const ALL: [Self; 4] = [Self::Personal, Self::Basic, Self::Social, Self::Professional];

  /// 1-based position, as shown in "Step N of 4".
  pub fn number(self) -> u8 {
    match self {
      Self::Personal => 1,
      Self::Basic => 2,
      Self::Social => 3,
      Self::Professional => 4,
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Self::Personal => "Personal Information",
      Self::Basic => "Basic Details",
      Self::Social => "Religious & Social",
      Self::Professional => "Professional & Location",
    }
  }

  fn next(self) -> Option<Self> {
    Self::ALL.get(usize::from(self.number())).copied()
  }

  fn prev(self) -> Option<Self> {
    usize::from(self.number())
      .checked_sub(2)
      .and_then(|i| Self::ALL.get(i))
      .copied()
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
  pub first_name:     String,
  pub last_name:      String,
  pub email:          Option<String>,
  pub date_of_birth:  Option<NaiveDate>,
  pub gender:         Option<Gender>,
  pub height:         String,
  pub religion:       String,
  pub caste:          String,
  pub sub_caste:      Option<String>,
  pub marital_status: Option<MaritalStatus>,
  pub education:      String,
  pub profession:     String,
  pub income:         Option<String>,
  pub city:           String,
  pub state:          String,
  pub bio:            Option<String>,
}

impl ProfileForm {
  /// Changing religion invalidates the caste choice, whose options depend
  /// on it.
  pub fn set_religion(&mut self, religion: impl Into<String>) {
    let religion = religion.into();
    if religion != self.religion {
      self.caste.clear();
      self.sub_caste = None;
    }
    self.religion = religion;
  }

  /// Check only the fields that appear on `step`.
  pub fn validate_step(&self, step: Step, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    match step {
      Step::Personal => {
        errors.check("firstName", check_first_name(&self.first_name));
        errors.check("lastName", check_last_name(&self.last_name));
        errors.check("email", check_email(self.email.as_deref()));
      }
      Step::Basic => {
        errors.check("dateOfBirth", check_date_of_birth(self.date_of_birth, today));
        if self.gender.is_none() {
          errors.add("gender", "Gender is required");
        }
        errors.check("height", check_required(&self.height, "Height is required"));
      }
      Step::Social => {
        errors.check("religion", check_required(&self.religion, "Religion is required"));
        errors.check("caste", check_required(&self.caste, "Caste is required"));
        if self.marital_status.is_none() {
          errors.add("maritalStatus", "Marital status is required");
        }
      }
      Step::Professional => {
        errors.check(
          "education",
          check_required(&self.education, "Education is required"),
        );
        errors.check(
          "profession",
          check_required(&self.profession, "Profession is required"),
        );
        errors.check("city", check_required(&self.city, "City is required"));
        errors.check("state", check_required(&self.state, "State is required"));
      }
    }
    errors
  }

  /// Check every step.
  pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut all = ValidationErrors::default();
    for step in Step::ALL {
      for (field, msg) in self.validate_step(step, today).iter() {
        all.add(field, msg);
      }
    }
    all.into_result()
  }

  /// The update body submitted at the end of the wizard. Photos are filled
  /// in separately once an upload has produced a URL.
  pub fn to_update(&self) -> ProfileUpdate {
    fn non_empty(s: &str) -> Option<String> {
      let s = s.trim();
      (!s.is_empty()).then(|| s.to_owned())
    }

    ProfileUpdate {
      first_name: non_empty(&self.first_name),
      last_name: non_empty(&self.last_name),
      email: self.email.as_deref().and_then(non_empty),
      date_of_birth: self.date_of_birth,
      gender: self.gender,
      height: non_empty(&self.height),
      religion: non_empty(&self.religion),
      caste: non_empty(&self.caste),
      sub_caste: self.sub_caste.as_deref().and_then(non_empty),
      marital_status: self.marital_status,
      education: non_empty(&self.education),
      profession: non_empty(&self.profession),
      income: self.income.as_deref().and_then(non_empty),
      city: non_empty(&self.city),
      state: non_empty(&self.state),
      country: Some(DEFAULT_COUNTRY.to_owned()),
      bio: self.bio.as_deref().and_then(non_empty),
      ..ProfileUpdate::default()
    }
  }
}

// ─── Wizard ──────────────────────────────────────────────────────────────────

/// Tracks the current step of the wizard over a [`ProfileForm`].
#[derive(Debug, Clone)]
pub struct Onboarding {
  pub form: ProfileForm,
  step:     Step,
}

impl Default for Onboarding {
  fn default() -> Self { Self { form: ProfileForm::default(), step: Step::Personal } }
}

impl Onboarding {
  pub fn new() -> Self { Self::default() }

  pub fn step(&self) -> Step { self.step }

  /// `(current, total)` for the progress indicator.
  pub fn progress(&self) -> (u8, u8) { (self.step.number(), TOTAL_STEPS) }

  pub fn is_last_step(&self) -> bool { self.step.next().is_none() }

  /// Move forward if the current step's fields are valid. On the last step
  /// this only validates.
  pub fn next(&mut self, today: NaiveDate) -> Result<Step, ValidationErrors> {
    self.form.validate_step(self.step, today).into_result()?;
    if let Some(next) = self.step.next() {
      self.step = next;
    }
    Ok(self.step)
  }

  /// Step back; a no-op on the first step.
  pub fn prev(&mut self) -> Step {
    if let Some(prev) = self.step.prev() {
      self.step = prev;
    }
    self.step
  }
}
