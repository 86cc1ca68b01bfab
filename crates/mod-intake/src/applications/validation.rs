use super::domain::{AgeInput, ApplicationFields};

/// Youngest accepted applicant age, inclusive.
pub const MIN_AGE: u8 = 13;
/// Oldest accepted applicant age, inclusive.
pub const MAX_AGE: u8 = 99;

/// Validation errors raised before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("applicant key must not be empty")]
    EmptyApplicantKey,
    #[error("age '{0}' is not a whole number")]
    AgeNotNumeric(String),
    #[error("age {age} is outside the accepted range {min}-{max}")]
    AgeOutOfRange { age: i64, min: u8, max: u8 },
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Age bounds applied at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgePolicy {
    min: u8,
    max: u8,
}

impl AgePolicy {
    /// Swaps inverted bounds rather than rejecting every applicant.
    pub fn new(min: u8, max: u8) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn check(&self, input: &AgeInput) -> Result<u8, ValidationError> {
        let age = match input {
            AgeInput::Number(value) => *value,
            AgeInput::Text(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::AgeNotNumeric(raw.clone()))?,
        };

        let out_of_range = ValidationError::AgeOutOfRange {
            age,
            min: self.min,
            max: self.max,
        };
        let age = u8::try_from(age).map_err(|_| out_of_range.clone())?;
        if age < self.min || age > self.max {
            return Err(out_of_range);
        }
        Ok(age)
    }
}

impl Default for AgePolicy {
    fn default() -> Self {
        Self::new(MIN_AGE, MAX_AGE)
    }
}

/// Submission that passed intake checks; text is trimmed and blank optionals are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub applicant_key: String,
    pub age: u8,
    pub timezone: Option<String>,
    pub experience: String,
    pub motivation: String,
    pub scenario: String,
    pub contact: Option<String>,
}

/// Guard turning raw answers into a [`ValidatedSubmission`].
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    ages: AgePolicy,
}

impl IntakeGuard {
    pub fn with_policy(ages: AgePolicy) -> Self {
        Self { ages }
    }

    pub fn policy(&self) -> &AgePolicy {
        &self.ages
    }

    pub fn validate(
        &self,
        applicant_key: &str,
        fields: ApplicationFields,
    ) -> Result<ValidatedSubmission, ValidationError> {
        let applicant_key = applicant_key.trim();
        if applicant_key.is_empty() {
            return Err(ValidationError::EmptyApplicantKey);
        }

        let age = self.ages.check(&fields.age)?;
        let experience = required("experience", fields.experience)?;
        let motivation = required("motivation", fields.motivation)?;
        let scenario = required("scenario", fields.scenario)?;

        Ok(ValidatedSubmission {
            applicant_key: applicant_key.to_string(),
            age,
            timezone: optional(fields.timezone),
            experience,
            motivation,
            scenario,
            contact: optional(fields.contact),
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
