use accounts::config::AccountsConfig;
use accounts::error::{IdentityFailureCause, ProfileFailureCause, SignupError};
use accounts::domain::error::{IdentityStoreError, ProfileStoreError};
use accounts::model::{
    Country, IdentityId, NewProfile, ProfileRecord, Role, SignupField, SignupState, UniqueField,
};
use chrono::NaiveDate;
use serde_json::json;

#[test]
fn accounts_config_defaults() {
    let cfg: AccountsConfig = serde_json::from_value(json!({})).unwrap();
    assert_eq!(cfg.profiles_table, "users");
    assert_eq!(cfg.default_role, None);
    assert!(cfg.check_uniqueness_on_advance);
}

#[test]
fn accounts_config_rejects_unknown_keys() {
    let err = serde_json::from_value::<AccountsConfig>(json!({ "profile_table": "x" }));
    assert!(err.is_err());
}

#[test]
fn accounts_config_parses_role() {
    let cfg: AccountsConfig =
        serde_json::from_value(json!({ "default_role": "mentor", "profiles_table": "profiles" }))
            .unwrap();
    assert_eq!(cfg.default_role, Some(Role::Mentor));
    assert_eq!(cfg.profiles_table, "profiles");
}

#[test]
fn new_profile_wire_shape() {
    let id: IdentityId = "7b0d7c9e-4f6e-4a8a-9a3e-2f6f0c1d2e3f".parse().unwrap();
    let profile = NewProfile {
        id,
        name: "Ana Silva".into(),
        username: "anas".into(),
        email: "ana@x.com".into(),
        birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        country: Country::Portugal,
        role: None,
    };
    assert_eq!(
        serde_json::to_value(&profile).unwrap(),
        json!({
            "id": "7b0d7c9e-4f6e-4a8a-9a3e-2f6f0c1d2e3f",
            "name": "Ana Silva",
            "username": "anas",
            "email": "ana@x.com",
            "birth_date": "2000-01-01",
            "country": 1,
        })
    );
}

#[test]
fn profile_record_reads_store_row() {
    let record: ProfileRecord = serde_json::from_value(json!({
        "id": "7b0d7c9e-4f6e-4a8a-9a3e-2f6f0c1d2e3f",
        "name": "Ana Silva",
        "username": "anas",
        "email": "ana@x.com",
        "birth_date": "2000-01-01",
        "country": 2,
        "profile_picture": null,
        "role": "admin",
        "created_at": "2024-03-01T12:00:00.123456+00:00"
    }))
    .unwrap();
    assert_eq!(record.country, Country::UnitedStates);
    assert_eq!(record.role, Some(Role::Admin));
    assert!(record.profile_picture.is_none());
}

#[test]
fn unknown_country_code_is_rejected() {
    assert!(serde_json::from_value::<Country>(json!(3)).is_err());
    assert_eq!(Country::try_from(2).unwrap(), Country::UnitedStates);
}

#[test]
fn country_parse_accepts_codes_and_names() {
    assert_eq!(Country::parse("1"), Some(Country::Portugal));
    assert_eq!(Country::parse("United States"), Some(Country::UnitedStates));
    assert_eq!(Country::parse("usa"), Some(Country::UnitedStates));
    assert_eq!(Country::parse("9"), None);
    assert_eq!(Country::parse("Spain"), None);
}

#[test]
fn role_round_trips_through_str() {
    for role in [Role::Student, Role::Mentor, Role::Admin] {
        assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
    }
    assert!("tutor".parse::<Role>().is_err());
}

#[test]
fn signup_error_messages() {
    let err = SignupError::validation(vec![SignupField::Name, SignupField::BirthDate]);
    assert_eq!(err.to_string(), "missing or invalid fields: name, birth_date");

    let err = SignupError::conflict(UniqueField::Username, "anas");
    assert_eq!(err.to_string(), "username 'anas' is already taken");

    let err = SignupError::invalid_state("submit", SignupState::Empty);
    assert_eq!(err.to_string(), "cannot submit while signup is empty");
}

#[test]
fn store_errors_map_to_public_causes() {
    assert_eq!(
        IdentityFailureCause::from(IdentityStoreError::DuplicateEmail),
        IdentityFailureCause::DuplicateEmail
    );
    assert!(matches!(
        IdentityFailureCause::from(IdentityStoreError::invalid_format("weak password")),
        IdentityFailureCause::InvalidInput { .. }
    ));
    assert_eq!(
        ProfileFailureCause::from(ProfileStoreError::unique_violation("email")),
        ProfileFailureCause::UniqueConstraintViolation {
            field: "email".into()
        }
    );
    assert!(matches!(
        ProfileFailureCause::from(ProfileStoreError::malformed("eof")),
        ProfileFailureCause::Rejected { .. }
    ));
}

#[test]
fn orphaning_errors_are_not_user_recoverable() {
    let id = IdentityId::new_v4();
    let orphan = SignupError::profile_creation_failed(
        id,
        ProfileFailureCause::ServiceUnavailable {
            message: "timeout".into(),
        },
    );
    assert!(orphan.is_orphaning());
    assert!(!orphan.is_user_recoverable());

    let plain = SignupError::identity_creation_failed(IdentityFailureCause::DuplicateEmail);
    assert!(plain.is_user_recoverable());
    assert_eq!(plain.orphaned_identity(), None);
}
