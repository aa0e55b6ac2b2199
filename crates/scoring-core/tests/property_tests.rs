//! Property tests for field validation, schemas and authentication.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use scoring_core::{
    Authenticator, FieldError, FieldKind, FieldSpec, MethodRequest, OnlineScoreRequest,
    RequestSchema,
};
use serde_json::{json, Map, Value};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

// Strategy: any field kind
fn arb_kind() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::String),
        Just(FieldKind::Dict),
        Just(FieldKind::Email),
        Just(FieldKind::Phone),
        Just(FieldKind::Date),
        Just(FieldKind::Birthday),
        Just(FieldKind::Gender),
        Just(FieldKind::ClientIds),
    ]
}

// Strategy: an empty JSON value
fn arb_empty() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!("")),
        Just(json!([])),
        Just(json!({})),
    ]
}

// Strategy: a JSON value that is never empty
fn arb_non_empty() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e6..1.0e6f64).prop_map(|f| json!(f)),
        "[a-z0-9@.]{1,16}".prop_map(Value::from),
        prop::collection::vec(any::<i32>(), 1..4).prop_map(|v| json!(v)),
        "[a-z]{1,8}".prop_map(|k| json!({ k: 1 })),
    ]
}

// Strategy: a calendar date within the last 70 years
fn arb_recent_date() -> impl Strategy<Value = NaiveDate> {
    (1960i32..=2026, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("strategy builds objects"),
    }
}

proptest! {
    /// Property: an absent value is rejected iff the field is required,
    /// otherwise iff it is not nullable.
    #[test]
    fn proptest_absent_values_follow_flags(
        kind in arb_kind(),
        required in any::<bool>(),
        nullable in any::<bool>(),
        explicit_null in any::<bool>(),
    ) {
        let spec = FieldSpec::new(kind).required(required).nullable(nullable);
        let null = Value::Null;
        let value = explicit_null.then_some(&null);
        let result = spec.validate_on(value, today());

        let expected = if required {
            Err(FieldError::Required)
        } else if nullable {
            Ok(())
        } else {
            Err(FieldError::Empty)
        };
        prop_assert_eq!(result, expected);
    }

    /// Property: an empty value is accepted iff the field is nullable,
    /// whatever its kind.
    #[test]
    fn proptest_empty_values_follow_nullable(
        kind in arb_kind(),
        required in any::<bool>(),
        nullable in any::<bool>(),
        value in arb_empty(),
    ) {
        let spec = FieldSpec::new(kind).required(required).nullable(nullable);
        let result = spec.validate_on(Some(&value), today());
        if nullable {
            prop_assert_eq!(result, Ok(()));
        } else {
            prop_assert_eq!(result, Err(FieldError::Empty));
        }
    }

    /// Property: the kind check on a non-empty value does not depend on
    /// the flags.
    #[test]
    fn proptest_kind_check_ignores_flags(kind in arb_kind(), value in arb_non_empty()) {
        let base = FieldSpec::new(kind).validate_on(Some(&value), today());
        for (required, nullable) in [(true, true), (true, false), (false, true)] {
            let spec = FieldSpec::new(kind).required(required).nullable(nullable);
            prop_assert_eq!(spec.validate_on(Some(&value), today()), base.clone());
        }
    }

    /// Property: booleans are neither strings nor numbers.
    #[test]
    fn proptest_booleans_are_rejected(flag in any::<bool>()) {
        let value = Value::Bool(flag);
        let check = |kind: FieldKind| FieldSpec::new(kind).validate_on(Some(&value), today());
        prop_assert_eq!(check(FieldKind::String), Err(FieldError::NotString));
        prop_assert_eq!(check(FieldKind::Phone), Err(FieldError::PhoneType));
        prop_assert_eq!(check(FieldKind::Gender), Err(FieldError::GenderType));
    }

    /// Property: any 11-digit number is a phone iff it starts with 7.
    #[test]
    fn proptest_phone_prefix(rest in "[0-9]{10}", first in 1u8..=9, as_number in any::<bool>()) {
        let digits = format!("{first}{rest}");
        let value = if as_number {
            json!(digits.parse::<u64>().unwrap())
        } else {
            json!(digits)
        };
        let result = FieldSpec::new(FieldKind::Phone).validate_on(Some(&value), today());
        if first == 7 {
            prop_assert_eq!(result, Ok(()));
        } else {
            prop_assert_eq!(result, Err(FieldError::PhonePrefix));
        }
    }

    /// Property: every real calendar date in DD.MM.YYYY form validates,
    /// with or without leading zeros.
    #[test]
    fn proptest_dates_in_both_paddings(date in arb_recent_date(), padded in any::<bool>()) {
        let text = if padded {
            date.format("%d.%m.%Y").to_string()
        } else {
            format!("{}.{}.{}", date.day(), date.month(), date.year())
        };
        let spec = FieldSpec::new(FieldKind::Birthday);
        prop_assert_eq!(spec.validate_on(Some(&json!(text)), today()), Ok(()));
    }

    /// Property: birthdays more than 70 calendar years back are rejected.
    #[test]
    fn proptest_too_old_birthdays(year in 1000i32..1956, month in 1u32..=12, day in 1u32..=28) {
        let text = format!("{day:02}.{month:02}.{year}");
        let result = FieldSpec::new(FieldKind::Birthday).validate_on(Some(&json!(text)), today());
        prop_assert_eq!(result, Err(FieldError::TooOld));
    }

    /// Property: a regular user token is accepted and any other token is not.
    #[test]
    fn proptest_user_token_round_trip(
        account in prop::option::of("[a-z&]{0,12}"),
        login in "[a-z&]{1,12}",
        garbage in "[0-9a-f]{0,128}",
    ) {
        prop_assume!(login != "admin");
        let auth = Authenticator::default();
        let token = auth.user_token(account.as_deref().unwrap_or_default(), &login);

        let mut request = MethodRequest {
            account,
            login,
            token: token.clone(),
            arguments: Map::new(),
            method: "online_score".into(),
        };
        prop_assert!(auth.authenticate(&request).is_ok());

        prop_assume!(garbage != token);
        request.token = garbage;
        prop_assert!(auth.authenticate(&request).is_err());
    }

    /// Property: unknown argument keys never affect validation.
    #[test]
    fn proptest_unknown_keys_are_ignored(key in "x_[a-z]{1,8}", value in arb_non_empty()) {
        let mut args = object(json!({"first_name": "Ivan", "last_name": "Ivanov"}));
        let baseline = OnlineScoreRequest::parse_on(&args, today()).unwrap();
        args.insert(key, value);
        let parsed = OnlineScoreRequest::parse_on(&args, today()).unwrap();
        prop_assert_eq!(parsed, baseline);
    }
}
