//! Request validation for explicit analysis runs

use crate::model::LocationHints;

/// Jurisdiction explicit analysis runs are performed for
pub const SUPPORTED_COUNTRY: &str = "India";

pub const DEFAULT_LANGUAGE: &str = "English";

pub const ALLOWED_LANGUAGES: &[&str] = &[
    "Bengali",
    "English",
    "Gujarati",
    "Hindi",
    "Kannada",
    "Malayalam",
    "Marathi",
    "Punjabi",
    "Tamil",
    "Telugu",
];

/// States and union territories, lower-case
const INDIAN_STATES: &[&str] = &[
    "andaman and nicobar islands",
    "andhra pradesh",
    "arunachal pradesh",
    "assam",
    "bihar",
    "chandigarh",
    "chhattisgarh",
    "dadra and nagar haveli and daman and diu",
    "delhi",
    "goa",
    "gujarat",
    "haryana",
    "himachal pradesh",
    "jammu and kashmir",
    "jharkhand",
    "karnataka",
    "kerala",
    "ladakh",
    "lakshadweep",
    "madhya pradesh",
    "maharashtra",
    "manipur",
    "meghalaya",
    "mizoram",
    "nagaland",
    "odisha",
    "puducherry",
    "punjab",
    "rajasthan",
    "sikkim",
    "tamil nadu",
    "telangana",
    "tripura",
    "uttar pradesh",
    "uttarakhand",
    "west bengal",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid Indian state provided.")]
    InvalidState(String),

    #[error("Unsupported language. Choose from: {}", ALLOWED_LANGUAGES.join(", "))]
    UnsupportedLanguage(String),

    #[error("Case {0} is required")]
    MissingField(&'static str),
}

/// Validate location and language for an explicit analysis run.
///
/// Returns hints with the country forced to the supported jurisdiction and the
/// language resolved (empty means the default).
pub fn validate_analysis_input(
    mut hints: LocationHints,
    language: Option<&str>,
) -> Result<(LocationHints, String), ValidationError> {
    if !hints.state.is_empty() && !is_indian_state(&hints.state) {
        return Err(ValidationError::InvalidState(hints.state));
    }

    let language = match language.map(str::trim) {
        None | Some("") => DEFAULT_LANGUAGE.to_string(),
        Some(l) => l.to_string(),
    };
    if !ALLOWED_LANGUAGES.contains(&language.as_str()) {
        return Err(ValidationError::UnsupportedLanguage(language));
    }

    hints.country = SUPPORTED_COUNTRY.to_string();
    Ok((hints, language))
}

pub fn is_indian_state(state: &str) -> bool {
    let state = state.trim().to_lowercase();
    INDIAN_STATES.contains(&state.as_str())
}
