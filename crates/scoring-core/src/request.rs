//! The envelope and method-argument requests.
//!
//! Each request declares its [`Schema`] as a constant and exposes the
//! validated values as plain named fields.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::field::{as_integer, parse_date, phone_digits, FieldKind, FieldSpec, Gender};
use crate::schema::{RequestSchema, Schema, ValidatedRequest};

/// Method name of the online score operation.
pub const ONLINE_SCORE: &str = "online_score";

/// Method name of the client interests operation.
pub const CLIENTS_INTERESTS: &str = "clients_interests";

/// Message returned when no complete field pair is supplied.
pub const MISSING_PAIRS_MESSAGE: &str =
    "One of pairs (phone-email), (first_name-last_name), (gender-birthday) is missed";

/// Identifier of a client in the interests lookup.
///
/// Wide enough for any JSON integer, signed or unsigned.
pub type ClientId = i128;

const ENVELOPE_FIELDS: &[(&str, FieldSpec)] = &[
    ("account", FieldSpec::new(FieldKind::String).nullable(true)),
    ("login", FieldSpec::new(FieldKind::String).required(true).nullable(true)),
    ("token", FieldSpec::new(FieldKind::String).required(true).nullable(true)),
    ("arguments", FieldSpec::new(FieldKind::Dict).required(true).nullable(true)),
    ("method", FieldSpec::new(FieldKind::String).required(true)),
];

const SCORE_FIELDS: &[(&str, FieldSpec)] = &[
    ("first_name", FieldSpec::new(FieldKind::String).nullable(true)),
    ("last_name", FieldSpec::new(FieldKind::String).nullable(true)),
    ("email", FieldSpec::new(FieldKind::Email).nullable(true)),
    ("phone", FieldSpec::new(FieldKind::Phone).nullable(true)),
    ("birthday", FieldSpec::new(FieldKind::Birthday).nullable(true)),
    ("gender", FieldSpec::new(FieldKind::Gender).nullable(true)),
];

const INTERESTS_FIELDS: &[(&str, FieldSpec)] = &[
    ("client_ids", FieldSpec::new(FieldKind::ClientIds).required(true)),
    ("date", FieldSpec::new(FieldKind::Date).nullable(true)),
];

/// The outer method-call envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    /// Account the login belongs to.
    pub account: Option<String>,
    /// Caller login; may be empty.
    pub login: String,
    /// Caller-supplied token digest.
    pub token: String,
    /// Method-specific arguments.
    pub arguments: Map<String, Value>,
    /// Target method name.
    pub method: String,
}

impl RequestSchema for MethodRequest {
    const SCHEMA: Schema = Schema::new("envelope", ENVELOPE_FIELDS);

    fn from_validated(mut validated: ValidatedRequest) -> Self {
        let mut take_string = |name: &str| match validated.take(name) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        let account = take_string("account");
        let login = take_string("login").unwrap_or_default();
        let token = take_string("token").unwrap_or_default();
        let method = take_string("method").unwrap_or_default();
        let arguments = match validated.take("arguments") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self {
            account,
            login,
            token,
            arguments,
            method,
        }
    }
}

impl MethodRequest {
    /// Returns the account, or `""` when none was supplied.
    #[must_use]
    pub fn account_or_empty(&self) -> &str {
        self.account.as_deref().unwrap_or_default()
    }

    /// Returns the names of the supplied argument keys.
    #[must_use]
    pub fn argument_names(&self) -> Vec<String> {
        self.arguments.keys().cloned().collect()
    }
}

/// Arguments of the `online_score` method.
///
/// Empty strings are normalized to `None`; a phone number is kept in its
/// string form regardless of how it was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineScoreRequest {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Date of birth.
    pub birthday: Option<NaiveDate>,
    /// Gender; `Unknown` (code 0) still counts as supplied.
    pub gender: Option<Gender>,
}

impl RequestSchema for OnlineScoreRequest {
    const SCHEMA: Schema = Schema::new("online_score", SCORE_FIELDS);

    fn from_validated(validated: ValidatedRequest) -> Self {
        let text = |name: &str| validated.non_empty_str(name).map(str::to_string);

        Self {
            first_name: text("first_name"),
            last_name: text("last_name"),
            email: text("email"),
            phone: validated
                .get("phone")
                .and_then(phone_digits)
                .filter(|p| !p.is_empty()),
            birthday: validated.get("birthday").and_then(|v| parse_date(v).ok()),
            gender: validated
                .get("gender")
                .and_then(Value::as_i64)
                .and_then(Gender::from_code),
        }
    }
}

impl OnlineScoreRequest {
    /// Returns `true` if at least one pair is fully supplied:
    /// phone and email, first and last name, or gender and birthday.
    #[must_use]
    pub fn has_complete_pair(&self) -> bool {
        (self.phone.is_some() && self.email.is_some())
            || (self.first_name.is_some() && self.last_name.is_some())
            || (self.gender.is_some() && self.birthday.is_some())
    }
}

/// Arguments of the `clients_interests` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientsInterestsRequest {
    /// Clients to look up; never empty.
    pub client_ids: Vec<ClientId>,
    /// Optional reference date.
    pub date: Option<NaiveDate>,
}

impl RequestSchema for ClientsInterestsRequest {
    const SCHEMA: Schema = Schema::new("clients_interests", INTERESTS_FIELDS);

    fn from_validated(validated: ValidatedRequest) -> Self {
        let client_ids = validated
            .get("client_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(as_integer).collect())
            .unwrap_or_default();

        Self {
            client_ids,
            date: validated.get("date").and_then(|v| parse_date(v).ok()),
        }
    }
}
