//! Declarative field validators.
//!
//! A [`FieldSpec`] pairs a [`FieldKind`] with the orthogonal `required` and
//! `nullable` flags. Every value goes through the same three steps:
//!
//! 1. absent (missing or `null`) and `required` → [`FieldError::Required`]
//! 2. empty (`null`, `""`, `[]`, `{}`) and not `nullable` → [`FieldError::Empty`]
//! 3. present and non-empty → the kind-specific check
//!
//! A present-but-empty value that passes step 2 skips the kind check.
//!
//! # Example
//!
//! ```
//! use scoring_core::{FieldError, FieldKind, FieldSpec};
//! use serde_json::json;
//!
//! let phone = FieldSpec::new(FieldKind::Phone).nullable(true);
//! assert!(phone.validate(Some(&json!("79175002040"))).is_ok());
//! assert_eq!(
//!     phone.validate(Some(&json!("89175002040"))),
//!     Err(FieldError::PhonePrefix)
//! );
//! ```

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Number of digits in a valid phone number.
pub const PHONE_LENGTH: usize = 11;

/// Leading digit every phone number must start with.
pub const PHONE_PREFIX: char = '7';

/// Maximum accepted age, in calendar years, for a birthday field.
pub const MAX_AGE_YEARS: i32 = 70;

/// A validation failure for a single field.
///
/// The display strings are part of the public API contract and are
/// returned to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The value is absent but the field is required.
    #[error("Field is required")]
    Required,

    /// The value is empty but the field is not nullable.
    #[error("Field cannot be empty")]
    Empty,

    /// Expected a string.
    #[error("Field is not a string")]
    NotString,

    /// Expected a key/value mapping.
    #[error("Field is not a dict")]
    NotDict,

    /// Email address without an `@`.
    #[error("No @ in email")]
    MissingAt,

    /// Phone is neither a string nor an integer.
    #[error("Phone must be a string or number")]
    PhoneType,

    /// Phone does not have exactly [`PHONE_LENGTH`] characters.
    #[error("Phone length must be 11")]
    PhoneLength,

    /// Phone does not start with [`PHONE_PREFIX`].
    #[error("Phone must start with 7")]
    PhonePrefix,

    /// Not a `DD.MM.YYYY` calendar date.
    #[error("Incorrect date format, DD.MM.YYYY expected")]
    DateFormat,

    /// Birthday more than [`MAX_AGE_YEARS`] years ago.
    #[error("The age cannot be greater than 70")]
    TooOld,

    /// Gender is not an integer.
    #[error("Gender must contain only numbers")]
    GenderType,

    /// Gender is an integer outside the known codes.
    #[error("Gender must contain only numbers from: {choices}", choices = Gender::choices())]
    GenderChoice,

    /// Client ids are not a list of integers.
    #[error("Client ids must be a list of integers")]
    ClientIds,
}

/// Caller gender as accepted by the scoring API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Gender {
    /// Code `0`.
    Unknown,
    /// Code `1`.
    Male,
    /// Code `2`.
    Female,
}

impl Gender {
    /// All genders in code order.
    pub const ALL: [Gender; 3] = [Gender::Unknown, Gender::Male, Gender::Female];

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }

    /// Returns the lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Looks up a gender by wire code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.code() == code)
    }

    /// Renders the accepted codes, e.g. `0 - unknown, 1 - male, 2 - female`.
    #[must_use]
    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(|g| format!("{} - {}", g.code(), g.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Gender> for i64 {
    fn from(gender: Gender) -> Self {
        gender.code()
    }
}

impl TryFrom<i64> for Gender {
    type Error = FieldError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(FieldError::GenderChoice)
    }
}

/// The semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Any string.
    String,
    /// A JSON object (method arguments).
    Dict,
    /// A string containing `@`.
    Email,
    /// An 11-digit string or integer starting with `7`.
    Phone,
    /// A `DD.MM.YYYY` date.
    Date,
    /// A date no more than [`MAX_AGE_YEARS`] years in the past.
    Birthday,
    /// One of the [`Gender`] codes.
    Gender,
    /// A list of integer client ids.
    ClientIds,
}

impl FieldKind {
    /// Applies the kind-specific check to a present, non-empty value.
    ///
    /// `today` anchors the birthday age check.
    pub fn check(self, value: &Value, today: NaiveDate) -> Result<(), FieldError> {
        match self {
            Self::String => as_string(value).map(drop),
            Self::Dict => {
                if value.is_object() {
                    Ok(())
                } else {
                    Err(FieldError::NotDict)
                }
            }
            Self::Email => {
                if as_string(value)?.contains('@') {
                    Ok(())
                } else {
                    Err(FieldError::MissingAt)
                }
            }
            Self::Phone => {
                let phone = phone_digits(value).ok_or(FieldError::PhoneType)?;
                if phone.chars().count() != PHONE_LENGTH {
                    return Err(FieldError::PhoneLength);
                }
                if !phone.starts_with(PHONE_PREFIX) {
                    return Err(FieldError::PhonePrefix);
                }
                Ok(())
            }
            Self::Date => parse_date(value).map(drop),
            Self::Birthday => {
                let birthday = parse_date(value)?;
                if today.year() - birthday.year() > MAX_AGE_YEARS {
                    return Err(FieldError::TooOld);
                }
                Ok(())
            }
            Self::Gender => {
                let code = as_integer(value).ok_or(FieldError::GenderType)?;
                // Any integer outside the code range is a bad choice, not a bad type.
                let code = i64::try_from(code).map_err(|_| FieldError::GenderChoice)?;
                Gender::try_from(code).map(drop)
            }
            Self::ClientIds => match value.as_array() {
                Some(ids) if ids.iter().all(|id| as_integer(id).is_some()) => Ok(()),
                _ => Err(FieldError::ClientIds),
            },
        }
    }
}

/// A field declaration: kind plus the `required` / `nullable` flags.
///
/// Both flags default to `false`: a bare `FieldSpec::new(kind)` rejects
/// absent and empty values with [`FieldError::Empty`]. Use the `const`
/// builder methods to declare schemas at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    kind: FieldKind,
    required: bool,
    nullable: bool,
}

impl FieldSpec {
    /// Creates a non-required, non-nullable field of the given kind.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
        }
    }

    /// Sets whether the value must be present.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets whether the value may be empty.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Returns the field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the field is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns whether the field is nullable.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Validates a value against this spec using the local calendar date.
    ///
    /// `None` means the key was not supplied at all.
    pub fn validate(&self, value: Option<&Value>) -> Result<(), FieldError> {
        self.validate_on(value, Local::now().date_naive())
    }

    /// Validates a value with an explicit "today" for the birthday check.
    pub fn validate_on(&self, value: Option<&Value>, today: NaiveDate) -> Result<(), FieldError> {
        let present = value.filter(|v| !v.is_null());
        if present.is_none() && self.required {
            return Err(FieldError::Required);
        }

        match present.filter(|v| !is_empty(v)) {
            Some(value) => self.kind.check(value, today),
            None if self.nullable => Ok(()),
            None => Err(FieldError::Empty),
        }
    }
}

/// Returns `true` for `null`, `""`, `[]` and `{}`.
///
/// Numbers and booleans are never empty, so gender `0` counts as present.
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Returns a JSON integer across the full signed and unsigned 64-bit range.
///
/// Booleans and floats are not integers.
#[must_use]
pub fn as_integer(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

/// Returns the phone number as a string, for string or integer values.
#[must_use]
pub fn phone_digits(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a strict `DD.MM.YYYY` date.
///
/// Day and month take one or two digits, the year exactly four.
pub fn parse_date(value: &Value) -> Result<NaiveDate, FieldError> {
    let text = value.as_str().ok_or(FieldError::DateFormat)?;
    let mut parts = text.split('.');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(FieldError::DateFormat);
    };

    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !(digits(day, 1, 2) && digits(month, 1, 2) && digits(year, 4, 4)) {
        return Err(FieldError::DateFormat);
    }

    let (Ok(day), Ok(month), Ok(year)) = (day.parse(), month.parse(), year.parse()) else {
        return Err(FieldError::DateFormat);
    };
    NaiveDate::from_ymd_opt(year, month, day).ok_or(FieldError::DateFormat)
}

fn as_string(value: &Value) -> Result<&str, FieldError> {
    value.as_str().ok_or(FieldError::NotString)
}
