use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque identity issued by the identity store.
///
/// The matching profile row uses the same value as its primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IdentityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown country code {0}")]
pub struct UnknownCountry(pub u8);

/// Country of residence, stored by numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Country {
    #[default]
    Portugal = 1,
    UnitedStates = 2,
}

impl Country {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Country::Portugal => "Portugal",
            Country::UnitedStates => "United States",
        }
    }

    /// Accepts the numeric code or a (case-insensitive) country name.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<u8>() {
            return Self::try_from(code).ok();
        }
        match raw.to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "portugal" | "pt" => Some(Country::Portugal),
            "unitedstates" | "us" | "usa" => Some(Country::UnitedStates),
            _ => None,
        }
    }
}

impl From<Country> for u8 {
    fn from(c: Country) -> Self {
        c.code()
    }
}

impl TryFrom<u8> for Country {
    type Error = UnknownCountry;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Country::Portugal),
            2 => Ok(Country::UnitedStates),
            other => Err(UnknownCountry(other)),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Application role carried on the profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Mentor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draft fields the UI can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignupField {
    Name,
    Email,
    BirthDate,
    Country,
    Username,
    Password,
}

impl SignupField {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupField::Name => "name",
            SignupField::Email => "email",
            SignupField::BirthDate => "birth_date",
            SignupField::Country => "country",
            SignupField::Username => "username",
            SignupField::Password => "password",
        }
    }
}

impl fmt::Display for SignupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile columns that must be globally unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Email,
    Username,
}

impl UniqueField {
    /// Column name in the profiles table.
    pub fn column(self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Username => "username",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Position of a signup session in the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignupState {
    Empty,
    Step1Complete,
    Step2Complete,
    Submitting,
    Succeeded,
    Failed,
}

impl SignupState {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupState::Empty => "empty",
            SignupState::Step1Complete => "step1_complete",
            SignupState::Step2Complete => "step2_complete",
            SignupState::Submitting => "submitting",
            SignupState::Succeeded => "succeeded",
            SignupState::Failed => "failed",
        }
    }
}

impl fmt::Display for SignupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insert payload for the profiles table. `created_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: IdentityId,
    pub name: String,
    pub username: String,
    pub email: String,
    /// Serialized as a `YYYY-MM-DD` calendar date.
    pub birth_date: NaiveDate,
    pub country: Country,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Stored profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: IdentityId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub country: Country,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Materialize a stored row from its insert payload.
    pub fn from_new(new: NewProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new.id,
            name: new.name,
            username: new.username,
            email: new.email,
            birth_date: new.birth_date,
            country: new.country,
            profile_picture: None,
            role: new.role,
            created_at,
        }
    }
}

/// Authenticated session returned by the identity store.
#[derive(Debug)]
pub struct Session {
    pub identity_id: IdentityId,
    pub access_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}
