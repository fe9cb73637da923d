use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use crate::contract::model::{Country, SignupField, UniqueField};

/// Calendar date format accepted from the UI and stored in profile rows.
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// In-progress registration data, owned by a single signup session.
#[derive(Debug)]
pub struct SignupDraft {
    name: String,
    email: String,
    birth_date: Option<NaiveDate>,
    country: Country,
    username: String,
    password: SecretString,
}

impl Default for SignupDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            birth_date: None,
            country: Country::default(),
            username: String::new(),
            password: SecretString::from(String::new()),
        }
    }
}

impl SignupDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field from raw UI input. Never fails.
    ///
    /// An unparsable birth date clears the stored date; an unknown country
    /// leaves the current one in place.
    pub fn update_field(&mut self, field: SignupField, value: &str) {
        match field {
            SignupField::Name => self.name = value.to_string(),
            SignupField::Email => self.email = value.to_string(),
            SignupField::Username => self.username = value.to_string(),
            SignupField::Password => self.password = SecretString::from(value.to_string()),
            SignupField::BirthDate => {
                self.birth_date = NaiveDate::parse_from_str(value.trim(), BIRTH_DATE_FORMAT).ok();
            }
            SignupField::Country => {
                if let Some(country) = Country::parse(value) {
                    self.country = country;
                }
            }
        }
    }

    pub fn set_birth_date(&mut self, birth_date: Option<NaiveDate>) {
        self.birth_date = birth_date;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Trimmed value of a unique column, as checked and stored.
    pub fn unique_value(&self, field: UniqueField) -> &str {
        match field {
            UniqueField::Email => self.email.trim(),
            UniqueField::Username => self.username.trim(),
        }
    }

    pub fn missing_step1_fields(&self) -> Vec<SignupField> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push(SignupField::Name);
        }
        if is_blank(&self.email) {
            missing.push(SignupField::Email);
        }
        if self.birth_date.is_none() {
            missing.push(SignupField::BirthDate);
        }
        missing
    }

    pub fn missing_step2_fields(&self) -> Vec<SignupField> {
        let mut missing = Vec::new();
        if is_blank(&self.username) {
            missing.push(SignupField::Username);
        }
        if is_blank(self.password.expose_secret()) {
            missing.push(SignupField::Password);
        }
        missing
    }

    pub fn missing_fields(&self) -> Vec<SignupField> {
        let mut missing = self.missing_step1_fields();
        missing.extend(self.missing_step2_fields());
        missing
    }

    pub fn is_step1_valid(&self) -> bool {
        self.missing_step1_fields().is_empty()
    }

    pub fn is_step2_valid(&self) -> bool {
        self.missing_step2_fields().is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.is_step1_valid() && self.is_step2_valid()
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step1_filled() -> SignupDraft {
        let mut d = SignupDraft::new();
        d.update_field(SignupField::Name, "Ana Silva");
        d.update_field(SignupField::Email, "ana@x.com");
        d.update_field(SignupField::BirthDate, "2000-01-01");
        d
    }

    #[test]
    fn empty_draft_reports_every_required_field() {
        let d = SignupDraft::new();
        assert_eq!(
            d.missing_fields(),
            vec![
                SignupField::Name,
                SignupField::Email,
                SignupField::BirthDate,
                SignupField::Username,
                SignupField::Password,
            ]
        );
        assert!(!d.is_step1_valid());
        assert!(!d.is_step2_valid());
        assert!(!d.is_complete());
    }

    #[test]
    fn step1_requires_non_blank_name_email_and_birth_date() {
        let mut d = step1_filled();
        assert!(d.is_step1_valid());

        d.update_field(SignupField::Name, "   ");
        assert_eq!(d.missing_step1_fields(), vec![SignupField::Name]);

        d.update_field(SignupField::Name, "Ana");
        d.set_birth_date(None);
        assert_eq!(d.missing_step1_fields(), vec![SignupField::BirthDate]);
    }

    #[test]
    fn step2_treats_whitespace_password_as_blank() {
        let mut d = step1_filled();
        d.update_field(SignupField::Username, "anas");
        d.update_field(SignupField::Password, " \t ");
        assert_eq!(d.missing_step2_fields(), vec![SignupField::Password]);

        d.update_field(SignupField::Password, "p@ss1234");
        assert!(d.is_complete());
    }

    #[test]
    fn unparsable_birth_date_clears_previous_value() {
        let mut d = step1_filled();
        assert_eq!(d.birth_date(), NaiveDate::from_ymd_opt(2000, 1, 1));

        d.update_field(SignupField::BirthDate, "01/01/2000");
        assert_eq!(d.birth_date(), None);
        assert!(!d.is_step1_valid());
    }

    #[test]
    fn country_accepts_codes_and_names() {
        let mut d = SignupDraft::new();
        assert_eq!(d.country(), Country::Portugal);

        d.update_field(SignupField::Country, "2");
        assert_eq!(d.country(), Country::UnitedStates);

        d.update_field(SignupField::Country, "portugal");
        assert_eq!(d.country(), Country::Portugal);

        d.update_field(SignupField::Country, "United States");
        assert_eq!(d.country(), Country::UnitedStates);

        // unknown values keep the current selection
        d.update_field(SignupField::Country, "9");
        assert_eq!(d.country(), Country::UnitedStates);
    }

    #[test]
    fn unique_values_are_trimmed() {
        let mut d = SignupDraft::new();
        d.update_field(SignupField::Email, "  ana@x.com ");
        d.update_field(SignupField::Username, "anas\n");
        assert_eq!(d.unique_value(UniqueField::Email), "ana@x.com");
        assert_eq!(d.unique_value(UniqueField::Username), "anas");
    }

    #[test]
    fn debug_output_hides_password() {
        let mut d = step1_filled();
        d.update_field(SignupField::Password, "p@ss1234");
        assert!(!format!("{d:?}").contains("p@ss1234"));
    }
}
