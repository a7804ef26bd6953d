//! Fixed option lists offered by the profile and search pickers.

pub const RELIGIONS: &[&str] = &[
  "Hindu", "Muslim", "Christian", "Sikh", "Buddhist", "Jain", "Parsi", "Jewish",
  "Other",
];

pub const EDUCATION_LEVELS: &[&str] = &[
  "High School",
  "Bachelor's Degree",
  "Master's Degree",
  "Doctorate/PhD",
  "Diploma",
  "Professional Degree",
  "Other",
];

pub const PROFESSIONS: &[&str] = &[
  "Software Engineer",
  "Doctor",
  "Teacher",
  "Business Owner",
  "Lawyer",
  "Engineer",
  "Accountant",
  "Government Employee",
  "Consultant",
  "Marketing Professional",
  "Sales Professional",
  "Other",
];

pub const INCOME_RANGES: &[&str] = &[
  "Below 3 Lakhs",
  "3-5 Lakhs",
  "5-7 Lakhs",
  "7-10 Lakhs",
  "10-15 Lakhs",
  "15-20 Lakhs",
  "20-30 Lakhs",
  "30+ Lakhs",
];

pub const HEIGHTS: &[&str] = &[
  "4'5\"", "4'6\"", "4'7\"", "4'8\"", "4'9\"", "4'10\"", "4'11\"", "5'0\"",
  "5'1\"", "5'2\"", "5'3\"", "5'4\"", "5'5\"", "5'6\"", "5'7\"", "5'8\"",
  "5'9\"", "5'10\"", "5'11\"", "6'0\"", "6'1\"", "6'2\"", "6'3\"", "6'4\"",
  "6'5\"", "6'6\"+",
];

pub const INDIAN_STATES: &[&str] = &[
  "Andhra Pradesh",
  "Arunachal Pradesh",
  "Assam",
  "Bihar",
  "Chhattisgarh",
  "Delhi",
  "Goa",
  "Gujarat",
  "Haryana",
  "Himachal Pradesh",
  "Jharkhand",
  "Karnataka",
  "Kerala",
  "Madhya Pradesh",
  "Maharashtra",
  "Manipur",
  "Meghalaya",
  "Mizoram",
  "Nagaland",
  "Odisha",
  "Punjab",
  "Rajasthan",
  "Sikkim",
  "Tamil Nadu",
  "Telangana",
  "Tripura",
  "Uttar Pradesh",
  "Uttarakhand",
  "West Bengal",
];

/// Country stamped onto every profile at onboarding.
pub const DEFAULT_COUNTRY: &str = "India";

/// Caste options for a religion. Religions without a curated list only
/// offer "Other".
pub fn castes_for(religion: &str) -> &'static [&'static str] {
  match religion {
    "Hindu" => &[
      "Brahmin", "Kshatriya", "Vaishya", "Shudra", "Agarwal", "Baniya",
      "Kayastha", "Rajput", "Maratha", "Reddy", "Nair", "Iyer", "Iyengar",
      "Other",
    ],
    "Muslim" => &["Sunni", "Shia", "Ahmadiyya", "Other"],
    "Christian" => &["Catholic", "Protestant", "Orthodox", "Other"],
    "Sikh" => &["Jat", "Khatri", "Arora", "Other"],
    _ => &["Other"],
  }
}

/// Position of a height label in [`HEIGHTS`], for range comparisons.
pub fn height_rank(label: &str) -> Option<usize> {
  HEIGHTS.iter().position(|h| *h == label.trim())
}
