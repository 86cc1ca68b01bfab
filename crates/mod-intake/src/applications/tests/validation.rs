use super::common::*;
use crate::applications::domain::{AgeInput, ApplicationFields};
use crate::applications::validation::{AgePolicy, IntakeGuard, ValidationError, MAX_AGE, MIN_AGE};

#[test]
fn default_policy_uses_published_bounds() {
    let policy = AgePolicy::default();
    assert_eq!((policy.min(), policy.max()), (MIN_AGE, MAX_AGE));
    assert_eq!(policy.check(&AgeInput::Number(13)), Ok(13));
    assert_eq!(policy.check(&AgeInput::Number(99)), Ok(99));
}

#[test]
fn inverted_bounds_are_swapped() {
    let policy = AgePolicy::new(30, 18);
    assert_eq!((policy.min(), policy.max()), (18, 30));
    assert_eq!(policy.check(&AgeInput::Number(21)), Ok(21));
}

#[test]
fn ages_outside_u8_report_the_raw_value() {
    let policy = AgePolicy::default();
    assert_eq!(
        policy.check(&AgeInput::Number(-4)),
        Err(ValidationError::AgeOutOfRange {
            age: -4,
            min: MIN_AGE,
            max: MAX_AGE,
        })
    );
    assert_eq!(
        policy.check(&AgeInput::Text("1000".to_string())),
        Err(ValidationError::AgeOutOfRange {
            age: 1000,
            min: MIN_AGE,
            max: MAX_AGE,
        })
    );
}

#[test]
fn fractional_age_is_not_numeric() {
    assert_eq!(
        AgePolicy::default().check(&AgeInput::Text("25.5".to_string())),
        Err(ValidationError::AgeNotNumeric("25.5".to_string()))
    );
}

#[test]
fn validation_trims_text_and_drops_blank_optionals() {
    let guard = IntakeGuard::default();
    let mut raw = fields();
    raw.experience = "  two years on a gaming server \n".to_string();
    raw.timezone = Some("   ".to_string());
    raw.contact = Some(" mod@example.com ".to_string());

    let submission = guard.validate("  A#1 ", raw).expect("valid submission");
    assert_eq!(submission.applicant_key, "A#1");
    assert_eq!(submission.experience, "two years on a gaming server");
    assert_eq!(submission.timezone, None);
    assert_eq!(submission.contact.as_deref(), Some("mod@example.com"));
}

#[test]
fn missing_fields_are_named() {
    let guard = IntakeGuard::default();
    let blanked = |edit: fn(&mut ApplicationFields)| {
        let mut raw = fields();
        edit(&mut raw);
        guard.validate("A#1", raw)
    };

    assert_eq!(
        blanked(|raw| raw.experience = " \t ".to_string()),
        Err(ValidationError::MissingField("experience"))
    );
    assert_eq!(
        blanked(|raw| raw.motivation.clear()),
        Err(ValidationError::MissingField("motivation"))
    );
    assert_eq!(
        blanked(|raw| raw.scenario.clear()),
        Err(ValidationError::MissingField("scenario"))
    );
}

#[test]
fn age_is_checked_before_text_fields() {
    let guard = IntakeGuard::default();
    let mut raw = fields_with_age(12_i64);
    raw.motivation.clear();
    assert!(matches!(
        guard.validate("A#1", raw),
        Err(ValidationError::AgeOutOfRange { age: 12, .. })
    ));
}

#[test]
fn custom_policy_flows_through_guard() {
    let guard = IntakeGuard::with_policy(AgePolicy::new(18, 40));
    assert_eq!(guard.policy().min(), 18);
    assert!(guard.validate("A#1", fields_with_age(16_i64)).is_err());
    assert_eq!(
        guard
            .validate("A#1", fields_with_age(40_i64))
            .expect("upper bound accepted")
            .age,
        40
    );
}

#[test]
fn service_applies_custom_guard() {
    let (service, _) = build_service();
    let service = service.with_guard(IntakeGuard::with_policy(AgePolicy::new(18, 40)));

    assert!(matches!(
        service.submit("teen#1", fields_with_age(16_i64)),
        Err(crate::applications::ApplicationServiceError::Validation(
            ValidationError::AgeOutOfRange { age: 16, min: 18, max: 40 }
        ))
    ));
    service
        .submit("adult#1", fields_with_age(18_i64))
        .expect("lower bound accepted");
    assert_eq!(service.repository().len().expect("len"), 1);
}
